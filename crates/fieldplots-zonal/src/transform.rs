//! CRS <-> pixel conversion of points and region outlines.

use fieldplots_core::{AffineTransform, GeometryError, RegionGeometry};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// How continuous pixel coordinates become integer indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelRounding {
    /// Toward zero.
    #[default]
    Truncate,
    Floor,
    Nearest,
}

impl PixelRounding {
    #[inline]
    pub fn apply(self, v: f64) -> i64 {
        let r = match self {
            PixelRounding::Truncate => v.trunc(),
            PixelRounding::Floor => v.floor(),
            PixelRounding::Nearest => v.round(),
        };
        r as i64
    }
}

/// Axis order of externally supplied pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelOrder {
    #[default]
    ColRow,
    /// `(row, col)`, as image viewers report clicks.
    RowCol,
}

/// Integer pixel position `[col, row]`.
pub type PixelIndex = [i64; 2];

/// Forward and inverse affine of one raster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelTransformer {
    forward: AffineTransform,
    inverse: AffineTransform,
    rounding: PixelRounding,
}

impl PixelTransformer {
    pub fn new(transform: AffineTransform, rounding: PixelRounding) -> Result<Self, GeometryError> {
        Ok(Self {
            forward: transform,
            inverse: transform.inverse()?,
            rounding,
        })
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.forward
    }

    /// Continuous `(col, row)` of a CRS point.
    #[inline]
    pub fn geo_to_pixel(&self, p: Point2<f64>) -> Point2<f64> {
        self.inverse.apply(p)
    }

    /// Integer `[col, row]` of a CRS point.
    #[inline]
    pub fn to_pixel(&self, p: Point2<f64>) -> PixelIndex {
        let px = self.geo_to_pixel(p);
        [self.rounding.apply(px.x), self.rounding.apply(px.y)]
    }

    #[inline]
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> Point2<f64> {
        self.forward.apply(Point2::new(col, row))
    }

    pub fn transform_points(&self, points: &[Point2<f64>]) -> Vec<PixelIndex> {
        points.iter().map(|&p| self.to_pixel(p)).collect()
    }

    /// Pixel outline of one region: the exterior ring without its closing
    /// vertex, in input order. Multipolygons use their first member; a
    /// point region yields one pixel.
    pub fn transform_region(&self, geometry: &RegionGeometry) -> Vec<PixelIndex> {
        match geometry {
            RegionGeometry::Point(p) => vec![self.to_pixel(*p)],
            _ => geometry
                .outline()
                .map(|ring| ring.points().iter().map(|&p| self.to_pixel(p)).collect())
                .unwrap_or_default(),
        }
    }

    pub fn transform_regions<'a>(
        &self,
        geometries: impl IntoIterator<Item = &'a RegionGeometry>,
    ) -> Vec<Vec<PixelIndex>> {
        geometries
            .into_iter()
            .map(|g| self.transform_region(g))
            .collect()
    }

    /// CRS points for pixel clicks given in `order`.
    pub fn points_to_geo(&self, clicks: &[[f64; 2]], order: PixelOrder) -> Vec<Point2<f64>> {
        clicks
            .iter()
            .map(|&[u, v]| match order {
                PixelOrder::ColRow => self.pixel_to_geo(u, v),
                PixelOrder::RowCol => self.pixel_to_geo(v, u),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fieldplots_core::{Polygon, Ring};

    fn utm_transformer(rounding: PixelRounding) -> PixelTransformer {
        PixelTransformer::new(
            AffineTransform::new(0.05, 0.0, 500_000.0, 0.0, -0.05, 4_400_000.0),
            rounding,
        )
        .expect("transformer")
    }

    #[test]
    fn points_map_to_expected_pixels() {
        let t = utm_transformer(PixelRounding::Truncate);
        let px = t.transform_points(&[
            Point2::new(500_000.025, 4_399_999.975),
            Point2::new(500_001.025, 4_399_998.975),
            Point2::new(500_000.074, 4_399_999.926),
        ]);
        assert_eq!(px, vec![[0, 0], [20, 20], [1, 1]]);
    }

    #[test]
    fn rounding_policies_differ_near_boundaries() {
        let p = Point2::new(500_000.074, 4_400_000.0 + 0.01);
        assert_eq!(utm_transformer(PixelRounding::Truncate).to_pixel(p), [1, 0]);
        assert_eq!(utm_transformer(PixelRounding::Floor).to_pixel(p), [1, -1]);
        assert_eq!(utm_transformer(PixelRounding::Nearest).to_pixel(p), [1, 0]);
    }

    #[test]
    fn polygon_outline_drops_closing_vertex() {
        let t = utm_transformer(PixelRounding::Nearest);
        let ring = Ring::new(vec![
            Point2::new(500_000.0, 4_400_000.0),
            Point2::new(500_001.0, 4_400_000.0),
            Point2::new(500_001.0, 4_399_999.0),
            Point2::new(500_000.0, 4_399_999.0),
            Point2::new(500_000.0, 4_400_000.0),
        ]);
        let px = t.transform_region(&RegionGeometry::Polygon(Polygon::new(ring)));
        assert_eq!(px, vec![[0, 0], [20, 0], [20, 20], [0, 20]]);
    }

    #[test]
    fn geo_pixel_round_trip_is_within_one_pixel() {
        let t = PixelTransformer::new(
            AffineTransform::new(0.03, 0.01, 640_000.0, 0.01, -0.03, 4_300_000.0),
            PixelRounding::Floor,
        )
        .expect("transformer");
        for p in [
            Point2::new(640_010.0, 4_299_990.0),
            Point2::new(640_003.3, 4_299_987.7),
        ] {
            let [c, r] = t.to_pixel(p);
            let back = t.pixel_to_geo(c as f64, r as f64);
            let step = 0.03f64.hypot(0.01) * 2.0;
            assert!((back - p).norm() <= step, "{back:?} vs {p:?}");
        }
    }

    #[test]
    fn row_col_clicks_are_swapped() {
        let t = utm_transformer(PixelRounding::Truncate);
        let pts = t.points_to_geo(&[[10.0, 20.0]], PixelOrder::RowCol);
        assert_relative_eq!(pts[0].x, 500_001.0, epsilon = 1e-9);
        assert_relative_eq!(pts[0].y, 4_399_999.5, epsilon = 1e-9);
    }

    #[test]
    fn singular_transform_is_rejected() {
        let err = PixelTransformer::new(
            AffineTransform::new(0.0, 0.0, 1.0, 0.0, 0.0, 1.0),
            PixelRounding::Truncate,
        )
        .unwrap_err();
        assert_eq!(err, GeometryError::SingularTransform);
    }
}
