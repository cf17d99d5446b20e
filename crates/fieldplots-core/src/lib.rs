//! Core types and utilities for field-plot phenotyping.
//!
//! This crate is purely geometric. It knows nothing about file formats:
//! GeoJSON / GeoTIFF readers live in the `fieldplots` facade and produce the
//! types defined here.
//!
//! - [`AffineTransform`]: pixel `(col, row)` -> CRS `(x, y)` map and its inverse.
//! - [`Ring`], [`Polygon`], [`RegionGeometry`]: vector geometry in CRS units.
//! - [`Band`], [`Mask`], [`GeoImage`]: row-major rasters with georeferencing.

mod affine;
mod error;
mod geometry;
mod logger;
mod raster;

pub use affine::AffineTransform;
pub use error::{GeometryError, RasterError};
pub use geometry::{Bounds, Polygon, RegionGeometry, Ring, Segment};
pub use raster::{Band, Crs, GeoImage, Mask};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{filter_directives, init_with_level};
