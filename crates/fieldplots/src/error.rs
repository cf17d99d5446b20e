use fieldplots_core::{GeometryError, RasterError};
use fieldplots_grid::GridError;
use fieldplots_zonal::ZonalError;

/// Errors from reading or writing GeoJSON, GeoTIFF and JSON files.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    GeoJson(#[from] geojson::Error),
    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),
    #[error(transparent)]
    Raster(#[from] RasterError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SwathError {
    #[error("no pixel falls inside the requested bounds")]
    EmptyResult,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Top-level error of the `fieldplots` pipeline helpers.
#[derive(thiserror::Error, Debug)]
pub enum FieldplotsError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Zonal(#[from] ZonalError),
    #[error(transparent)]
    Swath(#[from] SwathError),
}
