/// Geometric failures shared by every crate in the workspace.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("lines are parallel; no unique intersection")]
    ParallelLines,
    #[error("affine transform is singular and cannot be inverted")]
    SingularTransform,
    #[error("region contains no valid pixels")]
    EmptyRegion,
    #[error("ring needs at least 3 distinct vertices (got {got})")]
    DegenerateRing { got: usize },
}

/// Raster construction errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    #[error("raster buffer length mismatch (expected {expected} values, got {got})")]
    LengthMismatch { expected: usize, got: usize },
    #[error("raster has no bands")]
    NoBands,
    #[error("band {index} is {width}x{height}, image is {expected_width}x{expected_height}")]
    BandShape {
        index: usize,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
}
