//! Plot grid construction for field trials.
//!
//! Everything here works in CRS units of the corner points; nothing touches
//! rasters. The typical flow is:
//!
//! ```
//! use fieldplots_grid::{generate_grid, FieldCorners, GridParams};
//! use nalgebra::Point2;
//!
//! let corners = FieldCorners::from_click_order(&[
//!     Point2::new(0.0, 0.0),
//!     Point2::new(10.0, 0.0),
//!     Point2::new(10.0, 10.0),
//! ])
//! .unwrap();
//! let frame = corners.frame().unwrap();
//! let params = GridParams {
//!     column_length: 1.0,
//!     range_length: 2.0,
//!     num_columns: 10,
//!     num_ranges: 5,
//!     num_rows: 1,
//!     ..GridParams::default()
//! };
//! let cells = generate_grid(&frame, &params).unwrap();
//! assert_eq!(cells.len(), 50);
//! ```

mod corners;
mod error;
mod generator;
mod lines;
mod params;
mod subdivide;

pub use corners::{DirectionFrame, FieldCorners};
pub use error::GridError;
pub use generator::{
    cell_corners, generate_flexible, generate_grid, CellCorners, CellShape, GridCell,
};
pub use lines::{field_grid_lines, polygons_from_grid_lines, LineFamilies};
pub use params::GridParams;
pub use subdivide::split_into_strips;
