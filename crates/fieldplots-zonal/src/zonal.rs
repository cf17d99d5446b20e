//! Per-region pixel gathering over one raster band.

use crate::stats::{self, CircularStats, Histogram};
use crate::{region_pixels, ZonalError};
use fieldplots_core::{AffineTransform, Band, GeometryError, Mask, RegionGeometry};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Valid samples of one region, sorted ascending.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionValues {
    values: Vec<f64>,
    /// Pixels covered by the region, valid or not.
    covered: usize,
}

impl RegionValues {
    pub fn new(mut values: Vec<f64>, covered: usize) -> Self {
        values.sort_by(f64::total_cmp);
        Self { values, covered }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn covered(&self) -> usize {
        self.covered
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail with [`GeometryError::EmptyRegion`] when no pixel is valid.
    pub fn require_valid(&self) -> Result<&Self, GeometryError> {
        if self.values.is_empty() {
            Err(GeometryError::EmptyRegion)
        } else {
            Ok(self)
        }
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn mean(&self) -> Option<f64> {
        stats::mean(&self.values)
    }

    pub fn std(&self) -> Option<f64> {
        stats::std_dev(&self.values)
    }

    pub fn min(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn median(&self) -> Option<f64> {
        self.percentile(50.0)
    }

    pub fn percentile(&self, q: f64) -> Option<f64> {
        stats::percentile_sorted(&self.values, q)
    }

    pub fn histogram(&self, bins: usize, range: (f64, f64)) -> Histogram {
        stats::histogram(&self.values, bins, range)
    }

    /// Circular statistics treating the samples as degrees.
    pub fn circular(&self) -> Option<CircularStats> {
        stats::circular_stats(&self.values)
    }
}

/// Gathers band samples per region, skipping nodata, NaN and masked-out
/// pixels.
#[derive(Clone, Copy, Debug)]
pub struct ZonalAggregator<'a> {
    band: &'a Band,
    transform: &'a AffineTransform,
    nodata: Option<f64>,
    mask: Option<&'a Mask>,
}

impl<'a> ZonalAggregator<'a> {
    pub fn new(band: &'a Band, transform: &'a AffineTransform) -> Self {
        Self {
            band,
            transform,
            nodata: None,
            mask: None,
        }
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    /// Restrict to pixels set in `mask`, which must match the band shape.
    pub fn with_mask(mut self, mask: &'a Mask) -> Result<Self, ZonalError> {
        if mask.width != self.band.width || mask.height != self.band.height {
            return Err(ZonalError::ShapeMismatch {
                width: self.band.width,
                height: self.band.height,
                got_width: mask.width,
                got_height: mask.height,
            });
        }
        self.mask = Some(mask);
        Ok(self)
    }

    #[inline]
    fn is_valid(&self, idx: usize, value: f64) -> bool {
        if value.is_nan() || self.nodata.is_some_and(|nd| value == nd) {
            return false;
        }
        self.mask.is_none_or(|m| m.data[idx] != 0)
    }

    pub fn region(&self, geometry: &RegionGeometry) -> Result<RegionValues, ZonalError> {
        let pixels = region_pixels(geometry, self.transform, self.band.width, self.band.height)?;
        let values = pixels
            .iter()
            .map(|&idx| (idx, self.band.data[idx]))
            .filter(|&(idx, v)| self.is_valid(idx, v))
            .map(|(_, v)| v)
            .collect();
        Ok(RegionValues::new(values, pixels.len()))
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, geometries), fields(width = self.band.width, height = self.band.height))
    )]
    pub fn regions<'g>(
        &self,
        geometries: impl IntoIterator<Item = &'g RegionGeometry>,
    ) -> Result<Vec<RegionValues>, ZonalError> {
        let out = geometries
            .into_iter()
            .map(|g| self.region(g))
            .collect::<Result<Vec<_>, _>>()?;
        let empty = out.iter().filter(|r| r.is_empty()).count();
        if empty > 0 {
            log::debug!("{empty} of {} regions have no valid pixels", out.len());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fieldplots_core::{Polygon, Ring};
    use nalgebra::Point2;

    fn transform() -> AffineTransform {
        AffineTransform::new(0.5, 0.0, 100.0, 0.0, -0.5, 200.0)
    }

    fn square(x0: f64, y0: f64, side: f64) -> RegionGeometry {
        RegionGeometry::Polygon(Polygon::new(Ring::new(vec![
            Point2::new(x0, y0),
            Point2::new(x0 + side, y0),
            Point2::new(x0 + side, y0 + side),
            Point2::new(x0, y0 + side),
        ])))
    }

    #[test]
    fn uniform_band_has_zero_std() {
        let band = Band::new(20, 20, 42.5);
        let t = transform();
        let values = ZonalAggregator::new(&band, &t)
            .region(&square(101.0, 193.0, 3.0))
            .expect("region");
        assert_eq!(values.count(), 36);
        assert_relative_eq!(values.mean().expect("mean"), 42.5);
        assert_relative_eq!(values.std().expect("std"), 0.0);
        assert_relative_eq!(values.median().expect("median"), 42.5);
    }

    #[test]
    fn nodata_and_mask_are_excluded() {
        let mut band = Band::new(4, 4, 1.0);
        band.set(0, 0, -9999.0);
        band.set(1, 0, f64::NAN);
        band.set(2, 0, 7.0);
        let mut mask = Mask::new(4, 4);
        for col in 0..4 {
            mask.set(col, 0);
        }
        mask.set(0, 1);
        let t = transform();
        let values = ZonalAggregator::new(&band, &t)
            .with_nodata(Some(-9999.0))
            .with_mask(&mask)
            .expect("mask")
            .region(&square(100.0, 198.0, 2.0))
            .expect("region");
        assert_eq!(values.covered(), 16);
        assert_eq!(values.values(), &[1.0, 1.0, 7.0]);
    }

    #[test]
    fn region_outside_raster_is_empty() {
        let band = Band::new(4, 4, 1.0);
        let t = transform();
        let values = ZonalAggregator::new(&band, &t)
            .region(&square(0.0, 0.0, 1.0))
            .expect("region");
        assert!(values.is_empty());
        assert_eq!(values.mean(), None);
        assert_eq!(values.require_valid(), Err(GeometryError::EmptyRegion));
    }

    #[test]
    fn mask_shape_mismatch() {
        let band = Band::new(4, 4, 1.0);
        let mask = Mask::new(3, 4);
        let t = transform();
        let err = ZonalAggregator::new(&band, &t).with_mask(&mask).unwrap_err();
        assert!(matches!(err, ZonalError::ShapeMismatch { got_width: 3, .. }));
    }
}
