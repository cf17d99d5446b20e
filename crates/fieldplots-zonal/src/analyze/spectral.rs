use super::DEFAULT_NODATA;
use crate::{
    gather_labels, DataType, Observation, Observations, Region, ZonalAggregator, ZonalError,
};
use fieldplots_core::{GeoImage, RasterError};

#[cfg(feature = "tracing")]
use tracing::instrument;

const METHOD: &str = "fieldplots.analyze.spectral_index";

/// Summary of a single-band index raster (NDVI, GLI, ...) per region.
///
/// Variables are suffixed with `index_name`: `mean_`, `med_`, `std_`,
/// `percentile_25_` and `percentile_75_`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(regions = regions.len(), index = index_name))
)]
pub fn spectral_index(
    obs: &mut Observations,
    img: &GeoImage,
    regions: &[Region],
    index_name: &str,
) -> Result<(), ZonalError> {
    if index_name.trim().is_empty() {
        return Err(ZonalError::InvalidParameter(
            "index name must not be empty".to_string(),
        ));
    }
    let band = img.band(0).ok_or(RasterError::NoBands)?;
    let agg = ZonalAggregator::new(band, &img.transform)
        .with_nodata(Some(img.nodata.unwrap_or(DEFAULT_NODATA)));

    for (region, sample) in regions.iter().zip(gather_labels(regions)) {
        let v = agg.region(&region.geometry)?;
        let rows = [
            ("mean", format!("Average {index_name} reflectance"), "reflectance", v.mean()),
            ("med", format!("Median {index_name} reflectance"), "reflectance", v.median()),
            (
                "std",
                format!("Standard deviation {index_name} reflectance"),
                "reflectance",
                v.std(),
            ),
            ("percentile_25", "index frequencies".to_string(), "frequency", v.percentile(25.0)),
            ("percentile_75", "index frequencies".to_string(), "frequency", v.percentile(75.0)),
        ];
        for (prefix, trait_name, scale, value) in rows {
            obs.add(
                sample.as_str(),
                format!("{prefix}_{index_name}"),
                Observation::new(trait_name, METHOD, scale, DataType::Float, value),
            )?;
        }
    }
    log::info!("{index_name} summarized for {} regions", regions.len());
    Ok(())
}
