use super::linear_units;
use crate::{
    gather_labels, region_pixels, DataType, Observation, Observations, Region, ZonalError,
};
use fieldplots_core::{GeoImage, Mask};

#[cfg(feature = "tracing")]
use tracing::instrument;

const METHOD: &str = "fieldplots.analyze.coverage";

/// Foreground pixel count, covered area and covered fraction per region.
///
/// Records `pixel_count`, `coverage` (area in squared CRS units) and
/// `percent_coverage` (`0..=1`) per region label, plus the ground sampling
/// distance as metadata. Regions covering no pixels get zero for all three.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(regions = regions.len()))
)]
pub fn coverage(
    obs: &mut Observations,
    img: &GeoImage,
    mask: &Mask,
    regions: &[Region],
) -> Result<(), ZonalError> {
    if mask.width != img.width || mask.height != img.height {
        return Err(ZonalError::ShapeMismatch {
            width: img.width,
            height: img.height,
            got_width: mask.width,
            got_height: mask.height,
        });
    }
    let (gsd_x, gsd_y) = img.pixel_size();
    let units = linear_units(img).to_string();
    if !img.transform.is_north_up() {
        log::debug!("rotated raster; gsd taken from column vector norms");
    }

    for (region, label) in regions.iter().zip(gather_labels(regions)) {
        let pixels = region_pixels(&region.geometry, &img.transform, img.width, img.height)?;
        let total = pixels.len();
        let count = pixels.iter().filter(|&&idx| mask.data[idx] != 0).count();
        let percent = if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        };

        obs.add(
            label.as_str(),
            "pixel_count",
            Observation::new("count", METHOD, "pixels", DataType::Int, count as i64)
                .with_label("pixels"),
        )?;
        obs.add(
            label.as_str(),
            "coverage",
            Observation::new(
                "coverage",
                METHOD,
                units.as_str(),
                DataType::Float,
                count as f64 * gsd_x * gsd_y,
            )
            .with_label(format!("square {units}").as_str()),
        )?;
        obs.add(
            label.as_str(),
            "percent_coverage",
            Observation::new("percentage", METHOD, "none", DataType::Float, percent),
        )?;
    }

    obs.add_metadata("ground_sampling_distance_x", DataType::Float, gsd_x);
    obs.add_metadata("ground_sampling_distance_y", DataType::Float, gsd_y);
    log::info!("coverage recorded for {} regions", regions.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fieldplots_core::{AffineTransform, Band, Crs, Polygon, RegionGeometry, Ring};
    use nalgebra::Point2;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Region {
        Region::new(RegionGeometry::Polygon(Polygon::new(Ring::new(vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]))))
    }

    /// 8x8 raster with 0.1 m pixels, origin (0, 0.8).
    fn image() -> GeoImage {
        GeoImage::from_band(
            Band::new(8, 8, 0.0),
            AffineTransform::new(0.1, 0.0, 0.0, 0.0, -0.1, 0.8),
        )
        .with_crs(Crs::epsg(32614))
    }

    #[test]
    fn half_covered_region_is_fifty_percent() {
        // Foreground: left half of the raster.
        let mut mask = Mask::new(8, 8);
        for row in 0..8 {
            for col in 0..4 {
                mask.set(col, row);
            }
        }
        let regions = vec![
            rect(0.0, 0.0, 0.8, 0.8).with_property("ID", "whole"),
            rect(0.4, 0.0, 0.8, 0.8).with_property("ID", "right"),
        ];
        let mut obs = Observations::new();
        coverage(&mut obs, &image(), &mask, &regions).expect("coverage");

        assert_eq!(obs.value_f64("whole", "pixel_count"), Some(32.0));
        assert_relative_eq!(
            obs.value_f64("whole", "percent_coverage").expect("pct"),
            0.5
        );
        assert_relative_eq!(
            obs.value_f64("whole", "coverage").expect("area"),
            0.32,
            epsilon = 1e-9
        );
        assert_eq!(obs.value_f64("right", "percent_coverage"), Some(0.0));
        let cov = obs.get("whole", "coverage").expect("obs");
        assert_eq!(cov.scale, "metre");
        assert_eq!(
            obs.metadata["ground_sampling_distance_x"].value.as_f64(),
            Some(0.1)
        );
    }

    #[test]
    fn region_outside_raster_records_zeros() {
        let mask = Mask::new(8, 8);
        let regions = vec![rect(10.0, 10.0, 11.0, 11.0)];
        let mut obs = Observations::new();
        coverage(&mut obs, &image(), &mask, &regions).expect("coverage");
        assert_eq!(obs.value_f64("default_0", "pixel_count"), Some(0.0));
        assert_eq!(obs.value_f64("default_0", "percent_coverage"), Some(0.0));
    }

    #[test]
    fn mask_shape_must_match() {
        let mask = Mask::new(4, 4);
        let mut obs = Observations::new();
        let err = coverage(&mut obs, &image(), &mask, &[]).unwrap_err();
        assert!(matches!(err, ZonalError::ShapeMismatch { .. }));
    }
}
