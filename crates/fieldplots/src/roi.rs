//! Circular regions around points and polygon centers.

use fieldplots_core::{Polygon, RegionGeometry, Ring};
use fieldplots_zonal::{Region, ZonalError};
use nalgebra::Point2;

/// Vertices used to approximate a circle when none are requested.
pub const DEFAULT_CIRCLE_SEGMENTS: usize = 64;

/// Buffer points into circular polygons of `radius` CRS units.
///
/// Regions keep the properties of point regions; a non-point region is
/// buffered around its centroid.
pub fn circle_regions(
    regions: &[Region],
    radius: f64,
    segments: usize,
) -> Result<Vec<Region>, ZonalError> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(ZonalError::InvalidParameter(format!(
            "circle radius must be positive (got {radius})"
        )));
    }
    if segments < 3 {
        return Err(ZonalError::InvalidParameter(format!(
            "a circle needs at least 3 segments (got {segments})"
        )));
    }
    let mut out = Vec::with_capacity(regions.len());
    for (i, region) in regions.iter().enumerate() {
        let Some(center) = region.geometry.centroid() else {
            log::warn!("region {i} has no center, skipped");
            continue;
        };
        out.push(Region {
            geometry: RegionGeometry::Polygon(Polygon::new(Ring::circle(center, radius, segments))),
            properties: region.properties.clone(),
        });
    }
    Ok(out)
}

/// Centroid of each outline; empty outlines are skipped.
pub fn centroids(shapes: &[Ring]) -> Vec<Point2<f64>> {
    shapes.iter().filter_map(Ring::centroid).collect()
}

/// Circles of `radius` centered on each outline's centroid.
pub fn center_circles(
    shapes: &[Ring],
    radius: f64,
    segments: usize,
) -> Result<Vec<Region>, ZonalError> {
    let points: Vec<Region> = centroids(shapes)
        .into_iter()
        .map(|p| Region::new(RegionGeometry::Point(p)))
        .collect();
    circle_regions(&points, radius, segments)
}
