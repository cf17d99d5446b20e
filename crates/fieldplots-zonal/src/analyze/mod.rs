//! Per-region trait analyses recording into an [`Observations`] collector.
//!
//! [`Observations`]: crate::Observations

mod color;
mod coverage;
mod dsm;
mod spectral;

pub use color::{color, ColorParams, ColorSpaces};
pub use coverage::coverage;
pub use dsm::{height_percentile, height_subtraction, HeightParams, DEFAULT_NODATA};
pub use spectral::spectral_index;

use fieldplots_core::GeoImage;

/// Linear unit name of the image CRS, `"none"` when unknown.
fn linear_units(img: &GeoImage) -> &str {
    img.crs
        .as_ref()
        .and_then(|c| c.linear_units.as_deref())
        .unwrap_or("none")
}
