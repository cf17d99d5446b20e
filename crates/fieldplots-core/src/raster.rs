use crate::{AffineTransform, RasterError};
use serde::{Deserialize, Serialize};

/// Coordinate reference system identifier, e.g. `EPSG:32614`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub name: String,
    /// Linear unit name (`"metre"`, `"degree"`), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear_units: Option<String>,
}

impl Crs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            linear_units: None,
        }
    }

    pub fn epsg(code: u32) -> Self {
        let linear_units = match code {
            4326 | 4269 | 4258 => Some("degree".to_string()),
            32601..=32660 | 32701..=32760 | 3857 => Some("metre".to_string()),
            _ => None,
        };
        Self {
            name: format!("EPSG:{code}"),
            linear_units,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.linear_units = Some(units.into());
        self
    }

    /// EPSG code if the name has the `EPSG:<code>` form.
    pub fn epsg_code(&self) -> Option<u32> {
        let rest = self
            .name
            .strip_prefix("EPSG:")
            .or_else(|| self.name.strip_prefix("epsg:"))?;
        rest.trim().parse().ok()
    }

    /// Compare by EPSG code when both sides have one, by name otherwise.
    pub fn same_as(&self, other: &Crs) -> bool {
        match (self.epsg_code(), other.epsg_code()) {
            (Some(a), Some(b)) => a == b,
            _ => self.name.eq_ignore_ascii_case(&other.name),
        }
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Single-channel row-major raster of `f64` samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

impl Band {
    pub fn new(width: usize, height: usize, fill: f64) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Result<Self, RasterError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(RasterError::LengthMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col < self.width && row < self.height {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: f64) {
        if col < self.width && row < self.height {
            self.data[row * self.width + col] = value;
        }
    }

    /// Apply `f` to every sample, producing a new band.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Band {
        Band {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

/// Binary selection mask, `1` selected and `0` not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<u8>) -> Result<Self, RasterError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(RasterError::LengthMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Binarize a band: any non-zero finite sample is selected.
    pub fn from_band(band: &Band) -> Self {
        Self {
            width: band.width,
            height: band.height,
            data: band
                .data
                .iter()
                .map(|&v| u8::from(v.is_finite() && v != 0.0))
                .collect(),
        }
    }

    #[inline]
    pub fn is_set(&self, col: usize, row: usize) -> bool {
        col < self.width && row < self.height && self.data[row * self.width + col] != 0
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize) {
        if col < self.width && row < self.height {
            self.data[row * self.width + col] = 1;
        }
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// Georeferenced multi-band raster.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoImage {
    pub width: usize,
    pub height: usize,
    pub bands: Vec<Band>,
    pub transform: AffineTransform,
    pub crs: Option<Crs>,
    pub nodata: Option<f64>,
}

impl GeoImage {
    /// Build an image, checking that every band matches `width x height`.
    pub fn new(
        width: usize,
        height: usize,
        bands: Vec<Band>,
        transform: AffineTransform,
    ) -> Result<Self, RasterError> {
        if bands.is_empty() {
            return Err(RasterError::NoBands);
        }
        for (index, band) in bands.iter().enumerate() {
            if band.width != width || band.height != height {
                return Err(RasterError::BandShape {
                    index,
                    width: band.width,
                    height: band.height,
                    expected_width: width,
                    expected_height: height,
                });
            }
        }
        Ok(Self {
            width,
            height,
            bands,
            transform,
            crs: None,
            nodata: None,
        })
    }

    /// Single-band image.
    pub fn from_band(band: Band, transform: AffineTransform) -> Self {
        Self {
            width: band.width,
            height: band.height,
            bands: vec![band],
            transform,
            crs: None,
            nodata: None,
        }
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, index: usize) -> Option<&Band> {
        self.bands.get(index)
    }

    /// Same dimensions and transform.
    pub fn same_grid(&self, other: &GeoImage) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.transform == other.transform
    }

    /// False for NaN samples and samples equal to the nodata value.
    #[inline]
    pub fn is_valid(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        match self.nodata {
            Some(nd) if nd.is_nan() => true,
            Some(nd) => value != nd,
            None => true,
        }
    }

    /// Ground sampling distance `(gsd_x, gsd_y)` in CRS units.
    pub fn pixel_size(&self) -> (f64, f64) {
        self.transform.pixel_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_rejects_wrong_length() {
        let err = Band::from_vec(3, 2, vec![0.0; 5]).unwrap_err();
        assert_eq!(
            err,
            RasterError::LengthMismatch {
                expected: 6,
                got: 5
            }
        );
    }

    #[test]
    fn image_rejects_mismatched_band() {
        let bands = vec![Band::new(4, 4, 0.0), Band::new(4, 3, 0.0)];
        let err = GeoImage::new(4, 4, bands, AffineTransform::identity()).unwrap_err();
        assert!(matches!(err, RasterError::BandShape { index: 1, .. }));
    }

    #[test]
    fn nodata_and_nan_are_invalid() {
        let img = GeoImage::from_band(Band::new(2, 2, 1.0), AffineTransform::identity())
            .with_nodata(-9999.0);
        assert!(img.is_valid(0.0));
        assert!(!img.is_valid(-9999.0));
        assert!(!img.is_valid(f64::NAN));
    }

    #[test]
    fn mask_from_band_binarizes() {
        let band = Band::from_vec(2, 2, vec![0.0, 255.0, 1.0, f64::NAN]).expect("band");
        let mask = Mask::from_band(&band);
        assert_eq!(mask.data, vec![0, 1, 1, 0]);
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn crs_compares_by_epsg_code() {
        let a = Crs::epsg(32614);
        let b = Crs::new("epsg:32614");
        assert!(a.same_as(&b));
        assert!(!a.same_as(&Crs::epsg(4326)));
        assert_eq!(a.linear_units.as_deref(), Some("metre"));
    }
}
