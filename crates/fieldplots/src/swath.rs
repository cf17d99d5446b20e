//! Multi-band reflectance swaths with per-pixel latitude/longitude.
//!
//! Decoding the NetCDF container is left to the caller; this module takes
//! the `rhos_<wavelength>` variables and navigation arrays as plain bands.

use crate::error::SwathError;
use fieldplots_core::{AffineTransform, Band, Crs, GeoImage};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Prefix of reflectance variable names.
pub const REFLECTANCE_PREFIX: &str = "rhos";

/// Wavelengths (nm) picked for the pseudo-RGB composite, red first.
pub const PSEUDO_RGB_NM: [f64; 3] = [630.0, 540.0, 480.0];

/// Reflectance cube on a swath grid.
#[derive(Clone, Debug, PartialEq)]
pub struct SwathCube {
    pub width: usize,
    pub height: usize,
    /// One band per wavelength, rescaled to `0..=255`.
    pub bands: Vec<Band>,
    /// Wavelength in nm of each band.
    pub wavelengths: Vec<f64>,
    pub latitude: Band,
    pub longitude: Band,
}

/// Min and max over the finite samples.
fn finite_range(data: &[f64]) -> Option<(f64, f64)> {
    data.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| {
            Some(acc.map_or((v, v), |(lo, hi): (f64, f64)| (lo.min(v), hi.max(v))))
        })
}

/// Zero the minimum value, then stretch to `0..=255`. Non-finite samples are
/// left as they are.
fn rescale(band: &Band) -> Band {
    let Some((min, _)) = finite_range(&band.data) else {
        return band.clone();
    };
    let zeroed = band.map(|v| if v == min { 0.0 } else { v });
    match finite_range(&zeroed.data) {
        Some((lo, hi)) if hi > lo => zeroed.map(|v| (v - lo) / (hi - lo) * 255.0),
        _ => zeroed.map(|v| if v.is_finite() { 0.0 } else { v }),
    }
}

impl SwathCube {
    /// Build a cube from named variables; only `rhos_<nm>` variables are used,
    /// in the given order.
    pub fn from_named_bands(
        variables: impl IntoIterator<Item = (String, Band)>,
        latitude: Band,
        longitude: Band,
    ) -> Result<Self, SwathError> {
        let (width, height) = (latitude.width, latitude.height);
        if (longitude.width, longitude.height) != (width, height) {
            return Err(SwathError::InvalidInput(
                "latitude and longitude shapes differ".to_string(),
            ));
        }
        let mut bands = Vec::new();
        let mut wavelengths = Vec::new();
        for (name, band) in variables {
            let Some(rest) = name.strip_prefix(REFLECTANCE_PREFIX) else {
                continue;
            };
            let nm = rest
                .trim_start_matches('_')
                .split('_')
                .next()
                .and_then(|w| w.parse::<f64>().ok())
                .ok_or_else(|| {
                    SwathError::InvalidInput(format!("no wavelength in variable {name:?}"))
                })?;
            if (band.width, band.height) != (width, height) {
                return Err(SwathError::InvalidInput(format!(
                    "{name} is {}x{}, navigation is {width}x{height}",
                    band.width, band.height
                )));
            }
            bands.push(rescale(&band));
            wavelengths.push(nm);
        }
        if bands.is_empty() {
            return Err(SwathError::InvalidInput(
                "no reflectance variables".to_string(),
            ));
        }
        log::debug!("swath cube with {} bands, {width}x{height}", bands.len());
        Ok(Self {
            width,
            height,
            bands,
            wavelengths,
            latitude,
            longitude,
        })
    }

    /// Crop to the smallest row/column window holding every pixel whose
    /// position lies in `[min_lon, min_lat, max_lon, max_lat]`.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn crop_to_bounds(&self, bounds: [f64; 4]) -> Result<SwathCube, SwathError> {
        let [min_lon, min_lat, max_lon, max_lat] = bounds;
        let mut window: Option<(usize, usize, usize, usize)> = None;
        for row in 0..self.height {
            for col in 0..self.width {
                let i = row * self.width + col;
                let (lat, lon) = (self.latitude.data[i], self.longitude.data[i]);
                if (min_lat..=max_lat).contains(&lat) && (min_lon..=max_lon).contains(&lon) {
                    window = Some(match window {
                        None => (row, row, col, col),
                        Some((r0, r1, c0, c1)) => {
                            (r0.min(row), r1.max(row), c0.min(col), c1.max(col))
                        }
                    });
                }
            }
        }
        let (r0, r1, c0, c1) = window.ok_or(SwathError::EmptyResult)?;
        let (width, height) = (c1 - c0 + 1, r1 - r0 + 1);
        let crop = |band: &Band| -> Result<Band, SwathError> {
            let data = (r0..=r1)
                .flat_map(|row| {
                    let start = row * band.width;
                    band.data[start + c0..=start + c1].iter().copied()
                })
                .collect();
            Ok(Band::from_vec(width, height, data)?)
        };
        Ok(SwathCube {
            width,
            height,
            bands: self.bands.iter().map(&crop).collect::<Result<_, _>>()?,
            wavelengths: self.wavelengths.clone(),
            latitude: crop(&self.latitude)?,
            longitude: crop(&self.longitude)?,
        })
    }

    /// `[min_lon, min_lat, max_lon, max_lat]` over the finite navigation values.
    pub fn bounds(&self) -> Option<[f64; 4]> {
        let (lon0, lon1) = finite_range(&self.longitude.data)?;
        let (lat0, lat1) = finite_range(&self.latitude.data)?;
        Some([lon0, lat0, lon1, lat1])
    }

    /// All bands as a `GeoImage` in EPSG:4326 with nodata 0, stretched over
    /// the navigation extent.
    pub fn to_geo_image(&self) -> Result<GeoImage, SwathError> {
        let transform = self.transform()?;
        Ok(GeoImage::new(self.width, self.height, self.bands.clone(), transform)?
            .with_crs(Crs::epsg(4326))
            .with_nodata(0.0))
    }

    fn transform(&self) -> Result<AffineTransform, SwathError> {
        let [w, s, e, n] = self
            .bounds()
            .ok_or_else(|| SwathError::InvalidInput("no finite navigation values".to_string()))?;
        Ok(AffineTransform::from_bounds(w, s, e, n, self.width, self.height))
    }

    /// Index of the band closest in wavelength to `nm`.
    pub fn nearest_band(&self, nm: f64) -> Option<usize> {
        self.wavelengths
            .iter()
            .enumerate()
            .min_by(|a, b| (a.1 - nm).abs().total_cmp(&(b.1 - nm).abs()))
            .map(|(i, _)| i)
    }

    /// Red, green, blue composite from the bands nearest 630/540/480 nm,
    /// min-max normalized together to whole numbers in `0..=255`.
    pub fn pseudo_rgb(&self) -> Result<GeoImage, SwathError> {
        let picked = PSEUDO_RGB_NM
            .iter()
            .map(|&nm| self.nearest_band(nm).map(|i| &self.bands[i]))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| SwathError::InvalidInput("cube has no bands".to_string()))?;
        let all: Vec<f64> = picked.iter().flat_map(|b| b.data.iter().copied()).collect();
        let (lo, scale) = match finite_range(&all) {
            Some((lo, hi)) if hi > lo => (lo, 255.0 / (hi - lo)),
            Some((lo, _)) => (lo, 0.0),
            None => (0.0, 0.0),
        };
        let bands = picked
            .into_iter()
            .map(|b| b.map(|v| if v.is_finite() { ((v - lo) * scale).round() } else { 0.0 }))
            .collect();
        Ok(GeoImage::new(self.width, self.height, bands, self.transform()?)?
            .with_crs(Crs::epsg(4326))
            .with_nodata(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 4x3 swath: lon = 10 + col, lat = 50 - row.
    fn cube() -> SwathCube {
        let (w, h) = (4, 3);
        let lon = (0..h).flat_map(|_| (0..w).map(|c| 10.0 + c as f64)).collect();
        let lat = (0..h).flat_map(|r| (0..w).map(move |_| 50.0 - r as f64)).collect();
        let ramp = |offset: f64| {
            Band::from_vec(w, h, (0..w * h).map(|i| offset + i as f64).collect()).expect("band")
        };
        SwathCube::from_named_bands(
            vec![
                ("rhos_482".to_string(), ramp(1.0)),
                ("l2_flags".to_string(), ramp(0.0)),
                ("rhos_561".to_string(), ramp(2.0)),
                ("rhos_655".to_string(), ramp(3.0)),
            ],
            Band::from_vec(w, h, lat).expect("lat"),
            Band::from_vec(w, h, lon).expect("lon"),
        )
        .expect("cube")
    }

    #[test]
    fn only_reflectance_bands_are_kept_and_rescaled() {
        let c = cube();
        assert_eq!(c.wavelengths, vec![482.0, 561.0, 655.0]);
        let b = &c.bands[0].data;
        // Minimum zeroed, then stretched.
        assert_eq!(b[0], 0.0);
        assert_relative_eq!(b[11], 255.0);
        assert_relative_eq!(b[1], 2.0 / 12.0 * 255.0);
    }

    #[test]
    fn crop_selects_bounding_window() {
        let c = cube().crop_to_bounds([10.5, 48.5, 12.0, 49.5]).expect("crop");
        assert_eq!((c.width, c.height), (2, 1));
        assert_eq!(c.longitude.data, vec![11.0, 12.0]);
        assert_eq!(c.latitude.data, vec![49.0, 49.0]);
        assert_eq!(c.bands.len(), 3);
    }

    #[test]
    fn crop_outside_swath_is_empty() {
        assert_eq!(
            cube().crop_to_bounds([0.0, 0.0, 1.0, 1.0]),
            Err(SwathError::EmptyResult)
        );
    }

    #[test]
    fn geo_image_spans_navigation_extent() {
        let img = cube().to_geo_image().expect("image");
        assert_eq!(img.crs, Some(Crs::epsg(4326)));
        assert_eq!(img.nodata, Some(0.0));
        let t = img.transform;
        assert_relative_eq!(t.c(), 10.0);
        assert_relative_eq!(t.f(), 50.0);
        assert_relative_eq!(t.a(), 3.0 / 4.0);
        assert_relative_eq!(t.e(), -2.0 / 3.0);
    }

    #[test]
    fn pseudo_rgb_uses_nearest_wavelengths() {
        let c = cube();
        assert_eq!(c.nearest_band(630.0), Some(2));
        assert_eq!(c.nearest_band(540.0), Some(1));
        assert_eq!(c.nearest_band(480.0), Some(0));
        let rgb = c.pseudo_rgb().expect("rgb");
        assert_eq!(rgb.band_count(), 3);
        assert!(rgb
            .bands
            .iter()
            .flat_map(|b| b.data.iter())
            .all(|&v| (0.0..=255.0).contains(&v) && v.fract() == 0.0));
    }

    #[test]
    fn missing_reflectance_is_invalid() {
        let nav = Band::new(2, 2, 0.0);
        let err = SwathCube::from_named_bands(
            vec![("chlor_a".to_string(), Band::new(2, 2, 1.0))],
            nav.clone(),
            nav,
        )
        .unwrap_err();
        assert!(matches!(err, SwathError::InvalidInput(_)));
    }
}
