//! Zonal statistics and trait analyses for field-plot phenotyping.
//!
//! Given a [`GeoImage`](fieldplots_core::GeoImage) and a set of [`Region`]s,
//! this crate gathers the valid pixels of each region and records per-plot
//! traits into an [`Observations`] collector:
//!
//! - [`coverage`]: canopy pixel count, area and fraction from a binary mask.
//! - [`height_percentile`] / [`height_subtraction`]: DSM based plot height.
//! - [`spectral_index`]: summary of an index raster (NDVI, ...).
//! - [`color`]: hue circular statistics and channel histograms.
//!
//! Rasterization uses pixel centers with the even-odd rule; holes are
//! excluded. Pixels equal to nodata or NaN are skipped.

pub mod analyze;
mod colorspace;
mod error;
mod labels;
mod observations;
mod rasterize;
pub mod stats;
mod transform;
mod zonal;

pub use analyze::{
    color, coverage, height_percentile, height_subtraction, spectral_index, ColorParams,
    ColorSpaces, HeightParams, DEFAULT_NODATA,
};
pub use colorspace::{hue8, rgb_to_hsv, rgb_to_lab};
pub use error::ZonalError;
pub use labels::{gather_labels, Region, LABEL_KEYS};
pub use observations::{DataType, MetadataTerm, Observation, ObservationValue, Observations};
pub use rasterize::region_pixels;
pub use transform::{PixelIndex, PixelOrder, PixelRounding, PixelTransformer};
pub use zonal::{RegionValues, ZonalAggregator};
