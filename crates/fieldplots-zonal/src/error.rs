use fieldplots_core::{GeometryError, RasterError};

/// Errors returned by zonal aggregation and the analyses built on it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ZonalError {
    #[error("CRS mismatch: {left} vs {right}")]
    CrsMismatch { left: String, right: String },
    #[error("rasters are not on the same pixel grid")]
    GridMismatch,
    #[error("mask is {got_width}x{got_height}, raster is {width}x{height}")]
    ShapeMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("observation {variable:?} already recorded for sample {sample:?}")]
    DuplicateObservation { sample: String, variable: String },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Raster(#[from] RasterError),
}
