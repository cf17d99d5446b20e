use crate::GeometryError;
use nalgebra::{Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

/// Pixel -> CRS affine map.
///
/// Coefficients follow the GDAL/rasterio `(a, b, c, d, e, f)` order:
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// `(col, row)` are continuous pixel coordinates; the top-left corner of
/// pixel `(0, 0)` is at `(0.0, 0.0)` and its center at `(0.5, 0.5)`.
/// Serialized as the flat 6-element coefficient array.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct AffineTransform {
    pub m: Matrix3<f64>,
}

impl AffineTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            m: Matrix3::new(
                a, b, c, //
                d, e, f, //
                0.0, 0.0, 1.0,
            ),
        }
    }

    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    pub fn from_coefficients(c: [f64; 6]) -> Self {
        Self::new(c[0], c[1], c[2], c[3], c[4], c[5])
    }

    pub fn to_coefficients(&self) -> [f64; 6] {
        [
            self.m[(0, 0)],
            self.m[(0, 1)],
            self.m[(0, 2)],
            self.m[(1, 0)],
            self.m[(1, 1)],
            self.m[(1, 2)],
        ]
    }

    pub fn a(&self) -> f64 {
        self.m[(0, 0)]
    }

    pub fn b(&self) -> f64 {
        self.m[(0, 1)]
    }

    pub fn c(&self) -> f64 {
        self.m[(0, 2)]
    }

    pub fn d(&self) -> f64 {
        self.m[(1, 0)]
    }

    pub fn e(&self) -> f64 {
        self.m[(1, 1)]
    }

    pub fn f(&self) -> f64 {
        self.m[(1, 2)]
    }

    /// North-up transform from GeoTIFF `ModelPixelScale` + `ModelTiepoint`.
    ///
    /// Returns `None` when either tag is too short.
    pub fn from_pixel_scale_tiepoint(scale: &[f64], tiepoint: &[f64]) -> Option<Self> {
        if scale.len() < 2 || tiepoint.len() < 6 {
            return None;
        }
        // Tiepoint maps raster (i, j) to model (x, y).
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
        let (sx, sy) = (scale[0], scale[1]);
        Some(Self::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy))
    }

    /// Transform from the row-major 4x4 GeoTIFF `ModelTransformation` matrix.
    pub fn from_model_transformation(m: &[f64]) -> Option<Self> {
        if m.len() < 16 {
            return None;
        }
        Some(Self::new(m[0], m[1], m[3], m[4], m[5], m[7]))
    }

    /// Transform mapping a `width x height` pixel grid onto the given extent,
    /// row 0 at the northern edge.
    pub fn from_bounds(
        west: f64,
        south: f64,
        east: f64,
        north: f64,
        width: usize,
        height: usize,
    ) -> Self {
        let sx = (east - west) / width.max(1) as f64;
        let sy = (south - north) / height.max(1) as f64;
        Self::new(sx, 0.0, west, 0.0, sy, north)
    }

    /// Map continuous pixel coordinates `(col, row)` to CRS coordinates.
    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.m * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0], v[1])
    }

    /// CRS coordinates of the center of pixel `(col, row)`.
    #[inline]
    pub fn pixel_center(&self, col: usize, row: usize) -> Point2<f64> {
        self.apply(Point2::new(col as f64 + 0.5, row as f64 + 0.5))
    }

    pub fn inverse(&self) -> Result<Self, GeometryError> {
        let det = self.a() * self.e() - self.b() * self.d();
        if !det.is_finite() || det.abs() < f64::MIN_POSITIVE {
            return Err(GeometryError::SingularTransform);
        }
        self.m
            .try_inverse()
            .map(|m| Self { m })
            .ok_or(GeometryError::SingularTransform)
    }

    /// Ground sampling distance `(gsd_x, gsd_y)`: CRS length of one pixel step
    /// along columns and along rows. Equals `(|a|, |e|)` for north-up rasters.
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.a().hypot(self.d()), self.b().hypot(self.e()))
    }

    /// True when the transform has no rotation/shear terms.
    pub fn is_north_up(&self) -> bool {
        self.b() == 0.0 && self.d() == 0.0
    }

    /// Area of one pixel in squared CRS units.
    pub fn pixel_area(&self) -> f64 {
        (self.a() * self.e() - self.b() * self.d()).abs()
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 6]> for AffineTransform {
    fn from(c: [f64; 6]) -> Self {
        Self::from_coefficients(c)
    }
}

impl From<AffineTransform> for [f64; 6] {
    fn from(t: AffineTransform) -> Self {
        t.to_coefficients()
    }
}
