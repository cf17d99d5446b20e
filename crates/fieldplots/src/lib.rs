//! High-level facade crate for the `fieldplots-*` workspace.
//!
//! This crate provides:
//! - re-exports of the geometry, grid and zonal crates
//! - GeoJSON / GeoTIFF readers and writers ([`io`])
//! - JSON run configurations ([`io::config`])
//! - swath cube cropping for NetCDF-style reflectance data ([`swath`])
//! - file-to-file helpers used by the `fieldplots` binary ([`pipeline`])
//!
//! ## Quickstart
//!
//! ```no_run
//! use fieldplots::io::{geojson, geotiff};
//! use fieldplots::zonal::{height_percentile, HeightParams, Observations};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dsm = geotiff::read_geotiff("dsm.tif")?;
//! let plots = geojson::read_vector("plots.geojson")?;
//!
//! let mut obs = Observations::new();
//! height_percentile(&mut obs, &dsm, &plots.regions, &HeightParams::default())?;
//! println!("{}", obs.to_json_string()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `fieldplots::core`: affine transforms, rings/polygons, rasters, logging.
//! - `fieldplots::grid`: field corners, plot grid and line-grid construction.
//! - `fieldplots::zonal`: rasterization, zonal statistics, analyses, observations.

pub use fieldplots_core as core;
pub use fieldplots_grid as grid;
pub use fieldplots_zonal as zonal;

pub use fieldplots_core::{AffineTransform, Crs, GeoImage, Mask, RegionGeometry};
pub use fieldplots_grid::{FieldCorners, GridCell, GridParams};
pub use fieldplots_zonal::{Observations, Region};

mod error;
pub mod io;
pub mod pipeline;
pub mod roi;
pub mod swath;

pub use error::{FieldplotsError, IoError, SwathError};
pub use swath::SwathCube;
