//! File-to-file helpers behind the `fieldplots` CLI.

use crate::error::{FieldplotsError, IoError};
use crate::io::config::{AnalysisConfig, GridConfig};
use crate::io::{geojson, geotiff, write_atomic};
use fieldplots_core::{GeoImage, Mask};
use fieldplots_grid::{generate_flexible, generate_grid, FieldCorners, GridCell};
use fieldplots_zonal::{
    color, coverage, height_percentile, height_subtraction, spectral_index, Observations,
    PixelIndex, PixelRounding, PixelTransformer, ZonalError,
};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-region analysis selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analysis {
    Coverage,
    Height,
    Spectral,
    Color,
}

fn required<'a>(path: &'a Option<PathBuf>, what: &str) -> Result<&'a Path, IoError> {
    path.as_deref()
        .ok_or_else(|| IoError::InvalidInput(format!("missing {what} path")))
}

/// Build the plot grid described by `cfg` and write it next to the corner
/// file's CRS.
pub fn grid_from_files(cfg: &GridConfig) -> Result<Vec<GridCell>, FieldplotsError> {
    let (corners, crs) = geojson::read_points(required(&cfg.corners_path, "corners")?)?;
    let frame = FieldCorners::from_click_order(&corners)?.frame()?;
    let cells = match &cfg.anchors_path {
        Some(anchors) => {
            let (anchors, _) = geojson::read_points(anchors)?;
            generate_flexible(&frame, &anchors, &cfg.grid)?
        }
        None => generate_grid(&frame, &cfg.grid)?,
    };
    geojson::write_grid(cfg.output_path(), &cells, crs.as_ref())?;
    Ok(cells)
}

/// Fail when the vector layer names a CRS other than the raster's.
fn check_crs(img: &GeoImage, layer: &geojson::VectorLayer) -> Result<(), ZonalError> {
    if let (Some(raster), Some(vector)) = (&img.crs, layer.crs()) {
        if !raster.same_as(&vector) {
            return Err(ZonalError::CrsMismatch {
                left: raster.name.clone(),
                right: vector.name,
            });
        }
    }
    Ok(())
}

/// Pixel indices of every region of a vector file on a raster's grid.
pub fn pixel_coordinates(
    image: impl AsRef<Path>,
    regions: impl AsRef<Path>,
    rounding: PixelRounding,
) -> Result<Vec<Vec<PixelIndex>>, FieldplotsError> {
    let img = geotiff::read_geotiff(image)?;
    let layer = geojson::read_vector(regions)?;
    check_crs(&img, &layer)?;
    let transformer = PixelTransformer::new(img.transform, rounding)?;
    Ok(transformer.transform_regions(layer.regions.iter().map(|r| &r.geometry)))
}

fn read_mask(cfg: &AnalysisConfig, img: &GeoImage) -> Result<Mask, FieldplotsError> {
    let mask_img = geotiff::read_geotiff(required(&cfg.mask_path, "mask")?)?;
    let band = mask_img
        .band(0)
        .ok_or_else(|| IoError::InvalidInput("mask has no band".to_string()))?;
    if !mask_img.same_grid(img) {
        log::warn!("mask and image transforms differ; pixels are matched by index");
    }
    Ok(Mask::from_band(band))
}

/// Run one analysis over the image and regions named in `cfg`.
pub fn analyze(kind: Analysis, cfg: &AnalysisConfig) -> Result<Observations, FieldplotsError> {
    let img = geotiff::read_geotiff(required(&cfg.image_path, "image")?)?;
    let layer = geojson::read_vector(required(&cfg.regions_path, "regions")?)?;
    check_crs(&img, &layer)?;
    let regions = &layer.regions;

    let mut obs = Observations::new();
    match kind {
        Analysis::Coverage => coverage(&mut obs, &img, &read_mask(cfg, &img)?, regions)?,
        Analysis::Height => height_percentile(&mut obs, &img, regions, &cfg.height)?,
        Analysis::Spectral => spectral_index(&mut obs, &img, regions, &cfg.index_name)?,
        Analysis::Color => color(&mut obs, &img, &read_mask(cfg, &img)?, regions, &cfg.color)?,
    }
    log::info!("{kind:?}: {} observations", obs.len());
    Ok(obs)
}

/// Write observations as pretty JSON.
pub fn write_observations(path: impl AsRef<Path>, obs: &Observations) -> Result<(), IoError> {
    let json = obs.to_json_string()?;
    write_atomic(path.as_ref(), |w| w.write_all(json.as_bytes()))?;
    Ok(())
}

/// Write per-region pixel indices as pretty JSON.
pub fn write_pixel_coordinates(
    path: impl AsRef<Path>,
    pixels: &[Vec<PixelIndex>],
) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(pixels)?;
    write_atomic(path.as_ref(), |w| w.write_all(json.as_bytes()))?;
    Ok(())
}

/// `dsm1 - dsm0` written as a single-band GeoTIFF.
pub fn subtract_files(
    dsm1: impl AsRef<Path>,
    dsm0: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<GeoImage, FieldplotsError> {
    let later = geotiff::read_geotiff(dsm1)?;
    let earlier = geotiff::read_geotiff(dsm0)?;
    let diff = height_subtraction(&later, &earlier)?;
    geotiff::write_geotiff(output, &diff)?;
    Ok(diff)
}
