//! Region -> pixel selection.
//!
//! A pixel belongs to a polygonal region when its center lies inside the
//! region (even-odd rule, holes excluded, multipolygon members unioned). A
//! point region selects the single pixel containing the point.

use fieldplots_core::{AffineTransform, GeometryError, RegionGeometry};
use nalgebra::Point2;

/// Row-major indices of the pixels of a `width x height` raster covered by
/// `geometry`. Pixels outside the raster are ignored.
pub fn region_pixels(
    geometry: &RegionGeometry,
    transform: &AffineTransform,
    width: usize,
    height: usize,
) -> Result<Vec<usize>, GeometryError> {
    let inverse = transform.inverse()?;

    if let RegionGeometry::Point(p) = geometry {
        let px = inverse.apply(*p);
        let (col, row) = (px.x.floor(), px.y.floor());
        if col >= 0.0 && row >= 0.0 && (col as usize) < width && (row as usize) < height {
            return Ok(vec![row as usize * width + col as usize]);
        }
        return Ok(Vec::new());
    }

    let Some(bounds) = geometry.bounds() else {
        return Ok(Vec::new());
    };

    // Pixel window covering the geometry's bounding box.
    let (mut c0, mut r0) = (f64::INFINITY, f64::INFINITY);
    let (mut c1, mut r1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for corner in bounds.corners() {
        let px = inverse.apply(corner);
        c0 = c0.min(px.x);
        r0 = r0.min(px.y);
        c1 = c1.max(px.x);
        r1 = r1.max(px.y);
    }
    let clamp = |v: f64, hi: usize| -> usize { v.max(0.0).min(hi as f64) as usize };
    let (col_lo, col_hi) = (clamp(c0.floor(), width), clamp(c1.ceil(), width));
    let (row_lo, row_hi) = (clamp(r0.floor(), height), clamp(r1.ceil(), height));

    let mut out = Vec::new();
    for row in row_lo..row_hi {
        for col in col_lo..col_hi {
            let center: Point2<f64> = transform.pixel_center(col, row);
            if geometry.contains(center) {
                out.push(row * width + col);
            }
        }
    }
    Ok(out)
}
