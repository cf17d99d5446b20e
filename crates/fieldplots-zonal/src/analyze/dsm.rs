//! Digital surface model analyses.

use super::linear_units;
use crate::{
    gather_labels, DataType, Observation, Observations, Region, ZonalAggregator, ZonalError,
};
use fieldplots_core::{Band, GeoImage, RasterError};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Nodata value assumed for DSMs that do not declare one.
pub const DEFAULT_NODATA: f64 = -9999.0;

const METHOD: &str = "fieldplots.analyze.dsm";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightParams {
    /// `[soil, canopy]` percentiles in `0..=100`.
    pub percentiles: [f64; 2],
    /// Stored in each observation's `label` field.
    pub label: Option<String>,
}

impl Default for HeightParams {
    fn default() -> Self {
        Self {
            percentiles: [25.0, 90.0],
            label: None,
        }
    }
}

impl HeightParams {
    pub fn validate(&self) -> Result<(), ZonalError> {
        let [lo, hi] = self.percentiles;
        if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo > hi {
            return Err(ZonalError::InvalidParameter(format!(
                "percentiles must satisfy 0 <= lower <= upper <= 100 (got [{lo}, {hi}])"
            )));
        }
        Ok(())
    }
}

/// Soil elevation, canopy elevation and plot height per region.
///
/// `soil_elevation` is the lower percentile of the first band,
/// `plot_elevation` the upper one and `plot_height` their difference. Values
/// of regions without valid pixels are recorded as missing.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(regions = regions.len()))
)]
pub fn height_percentile(
    obs: &mut Observations,
    dsm: &GeoImage,
    regions: &[Region],
    params: &HeightParams,
) -> Result<(), ZonalError> {
    params.validate()?;
    let band = dsm.band(0).ok_or(RasterError::NoBands)?;
    let nodata = dsm.nodata.unwrap_or(DEFAULT_NODATA);
    let scale = linear_units(dsm).to_string();
    let label = params.label.as_deref().unwrap_or("default");
    let [lo, hi] = params.percentiles;

    let agg = ZonalAggregator::new(band, &dsm.transform).with_nodata(Some(nodata));
    for (region, sample) in regions.iter().zip(gather_labels(regions)) {
        let values = agg.region(&region.geometry)?;
        let soil = values.percentile(lo);
        let canopy = values.percentile(hi);
        let height = soil.zip(canopy).map(|(s, c)| c - s);

        obs.add(
            sample.as_str(),
            "soil_elevation",
            Observation::new(
                format!("dsm_percentile_{lo}"),
                METHOD,
                scale.as_str(),
                DataType::Float,
                soil,
            )
            .with_label(label),
        )?;
        obs.add(
            sample.as_str(),
            "plot_elevation",
            Observation::new(
                format!("dsm_percentile_{hi}"),
                METHOD,
                scale.as_str(),
                DataType::Float,
                canopy,
            )
            .with_label(label),
        )?;
        obs.add(
            sample.as_str(),
            "plot_height",
            Observation::new("height", METHOD, scale.as_str(), DataType::Float, height)
                .with_label(label),
        )?;
    }
    log::info!("height percentiles recorded for {} regions", regions.len());
    Ok(())
}

/// `dsm1 - dsm0` on a shared pixel grid.
///
/// Both rasters must have the same CRS and the same shape and transform. A
/// pixel invalid in either input is nodata in the output, which takes the
/// nodata value of `dsm1` (or `dsm0`, or [`DEFAULT_NODATA`]).
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(width = dsm1.width, height = dsm1.height))
)]
pub fn height_subtraction(dsm1: &GeoImage, dsm0: &GeoImage) -> Result<GeoImage, ZonalError> {
    match (&dsm1.crs, &dsm0.crs) {
        (Some(a), Some(b)) if a.same_as(b) => {}
        (None, None) => log::warn!("subtracting rasters without CRS information"),
        (a, b) => {
            let name = |c: &Option<fieldplots_core::Crs>| {
                c.as_ref().map_or_else(|| "unknown".to_string(), |c| c.name.clone())
            };
            return Err(ZonalError::CrsMismatch {
                left: name(a),
                right: name(b),
            });
        }
    }
    if !dsm1.same_grid(dsm0) {
        return Err(ZonalError::GridMismatch);
    }
    let b1 = dsm1.band(0).ok_or(RasterError::NoBands)?;
    let b0 = dsm0.band(0).ok_or(RasterError::NoBands)?;
    let nodata = dsm1.nodata.or(dsm0.nodata).unwrap_or(DEFAULT_NODATA);

    let data = b1
        .data
        .iter()
        .zip(&b0.data)
        .map(|(&v1, &v0)| {
            if dsm1.is_valid(v1) && dsm0.is_valid(v0) {
                v1 - v0
            } else {
                nodata
            }
        })
        .collect();
    let band = Band::from_vec(dsm1.width, dsm1.height, data)?;

    let mut out = GeoImage::from_band(band, dsm1.transform).with_nodata(nodata);
    out.crs = dsm1.crs.clone();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fieldplots_core::{AffineTransform, Crs, Polygon, RegionGeometry, Ring};
    use nalgebra::Point2;

    fn dsm(values: Vec<f64>) -> GeoImage {
        GeoImage::from_band(
            Band::from_vec(4, 4, values).expect("band"),
            AffineTransform::new(1.0, 0.0, 0.0, 0.0, -1.0, 4.0),
        )
        .with_crs(Crs::epsg(32614))
        .with_nodata(-9999.0)
    }

    fn whole() -> Region {
        Region::new(RegionGeometry::Polygon(Polygon::new(Ring::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ]))))
        .with_property("PlotName", "p1")
    }

    #[test]
    fn percentiles_give_soil_canopy_and_height() {
        let img = dsm((0..16).map(f64::from).collect());
        let mut obs = Observations::new();
        height_percentile(&mut obs, &img, &[whole()], &HeightParams::default()).expect("dsm");
        // Linear interpolation over 0..=15.
        assert_relative_eq!(obs.value_f64("p1", "soil_elevation").expect("soil"), 3.75);
        assert_relative_eq!(
            obs.value_f64("p1", "plot_elevation").expect("canopy"),
            13.5,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            obs.value_f64("p1", "plot_height").expect("height"),
            9.75,
            epsilon = 1e-12
        );
        let soil = obs.get("p1", "soil_elevation").expect("obs");
        assert_eq!(soil.trait_name, "dsm_percentile_25");
        assert_eq!(soil.scale, "metre");
    }

    #[test]
    fn nodata_only_region_is_missing() {
        let img = dsm(vec![-9999.0; 16]);
        let mut obs = Observations::new();
        height_percentile(&mut obs, &img, &[whole()], &HeightParams::default()).expect("dsm");
        assert!(obs.get("p1", "plot_height").expect("obs").value.is_missing());
    }

    #[test]
    fn invalid_percentiles_rejected() {
        let params = HeightParams {
            percentiles: [90.0, 25.0],
            label: None,
        };
        assert!(matches!(
            params.validate(),
            Err(ZonalError::InvalidParameter(_))
        ));
    }

    #[test]
    fn subtracting_raster_from_itself_is_zero() {
        let mut values: Vec<f64> = (0..16).map(|v| f64::from(v) * 0.5).collect();
        values[3] = -9999.0;
        let img = dsm(values);
        let diff = height_subtraction(&img, &img).expect("diff");
        let data = &diff.band(0).expect("band").data;
        assert_eq!(data[3], -9999.0);
        assert!(data
            .iter()
            .enumerate()
            .all(|(i, &v)| i == 3 || v == 0.0));
        assert_eq!(diff.crs, img.crs);
    }

    #[test]
    fn crs_mismatch_is_an_error() {
        let a = dsm(vec![1.0; 16]);
        let b = dsm(vec![1.0; 16]).with_crs(Crs::epsg(4326));
        assert!(matches!(
            height_subtraction(&a, &b),
            Err(ZonalError::CrsMismatch { .. })
        ));
    }

    #[test]
    fn grid_mismatch_is_an_error() {
        let a = dsm(vec![1.0; 16]);
        let mut b = dsm(vec![1.0; 16]);
        b.transform = AffineTransform::new(1.0, 0.0, 1.0, 0.0, -1.0, 4.0);
        assert_eq!(height_subtraction(&a, &b), Err(ZonalError::GridMismatch));
    }
}
