//! Color statistics of masked plant pixels per region.

use crate::colorspace::{hue8, rgb_to_hsv, rgb_to_lab};
use crate::{region_pixels, DataType, Observation, Observations, Region, RegionValues, ZonalError};
use fieldplots_core::{GeoImage, Mask};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[cfg(feature = "tracing")]
use tracing::instrument;

const METHOD: &str = "fieldplots.analyze.color";

/// Color spaces whose per-channel statistics are recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpaces {
    #[default]
    Hsv,
    Rgb,
    Lab,
    All,
}

impl ColorSpaces {
    fn rgb(self) -> bool {
        matches!(self, ColorSpaces::Rgb | ColorSpaces::All)
    }

    fn lab(self) -> bool {
        matches!(self, ColorSpaces::Lab | ColorSpaces::All)
    }

    fn hsv(self) -> bool {
        matches!(self, ColorSpaces::Hsv | ColorSpaces::All)
    }
}

impl FromStr for ColorSpaces {
    type Err = ZonalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hsv" => Ok(ColorSpaces::Hsv),
            "rgb" => Ok(ColorSpaces::Rgb),
            "lab" => Ok(ColorSpaces::Lab),
            "all" => Ok(ColorSpaces::All),
            other => Err(ZonalError::InvalidParameter(format!(
                "unknown color space {other:?} (expected hsv, rgb, lab or all)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorParams {
    pub bins: usize,
    pub colorspaces: ColorSpaces,
    /// Sample prefix; samples are named `{label}_{index}`.
    pub label: Option<String>,
    /// Band indices holding red, green and blue.
    pub rgb_bands: [usize; 3],
}

impl Default for ColorParams {
    fn default() -> Self {
        Self {
            bins: 10,
            colorspaces: ColorSpaces::Hsv,
            label: None,
            rgb_bands: [0, 1, 2],
        }
    }
}

/// One recorded channel: name, derived value, histogram range.
struct Channel {
    name: &'static str,
    range: (f64, f64),
    value: fn([f64; 3]) -> f64,
}

const RGB_CHANNELS: [Channel; 3] = [
    Channel { name: "blue", range: (0.0, 255.0), value: |p| p[2] },
    Channel { name: "green", range: (0.0, 255.0), value: |p| p[1] },
    Channel { name: "red", range: (0.0, 255.0), value: |p| p[0] },
];

const LAB_CHANNELS: [Channel; 3] = [
    Channel { name: "lightness", range: (0.0, 100.0), value: |p| rgb_to_lab(p)[0] },
    Channel { name: "green_magenta", range: (-128.0, 127.0), value: |p| rgb_to_lab(p)[1] },
    Channel { name: "blue_yellow", range: (-128.0, 127.0), value: |p| rgb_to_lab(p)[2] },
];

const HSV_CHANNELS: [Channel; 3] = [
    Channel { name: "hue", range: (0.0, 359.0), value: |p| rgb_to_hsv(p)[0] },
    Channel { name: "saturation", range: (0.0, 100.0), value: |p| rgb_to_hsv(p)[1] },
    Channel { name: "value", range: (0.0, 100.0), value: |p| rgb_to_hsv(p)[2] },
];

/// Hue circular statistics plus per-channel histograms, means and standard
/// deviations over the masked pixels of each region.
///
/// Hue statistics are always recorded; channel statistics follow
/// [`ColorParams::colorspaces`]. Samples are `{label}_{index}` in region
/// order, with `plot` as the default label.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(regions = regions.len(), bins = params.bins))
)]
pub fn color(
    obs: &mut Observations,
    img: &GeoImage,
    mask: &Mask,
    regions: &[Region],
    params: &ColorParams,
) -> Result<(), ZonalError> {
    if params.bins == 0 {
        return Err(ZonalError::InvalidParameter("bins must be >= 1".to_string()));
    }
    if mask.width != img.width || mask.height != img.height {
        return Err(ZonalError::ShapeMismatch {
            width: img.width,
            height: img.height,
            got_width: mask.width,
            got_height: mask.height,
        });
    }
    let [ri, gi, bi] = params.rgb_bands;
    let (Some(r), Some(g), Some(b)) = (img.band(ri), img.band(gi), img.band(bi)) else {
        return Err(ZonalError::InvalidParameter(format!(
            "color needs bands {:?}, image has {}",
            params.rgb_bands,
            img.band_count()
        )));
    };
    let label = params.label.as_deref().unwrap_or("plot");

    let mut channels: Vec<&Channel> = Vec::new();
    if params.colorspaces.rgb() {
        channels.extend(RGB_CHANNELS.iter());
    }
    if params.colorspaces.lab() {
        channels.extend(LAB_CHANNELS.iter());
    }
    if params.colorspaces.hsv() {
        channels.extend(HSV_CHANNELS.iter());
    }

    for (idx, region) in regions.iter().enumerate() {
        let sample = format!("{label}_{idx}");
        let pixels = region_pixels(&region.geometry, &img.transform, img.width, img.height)?;
        let rgb: Vec<[f64; 3]> = pixels
            .iter()
            .filter(|&&p| mask.data[p] != 0)
            .map(|&p| [r.data[p], g.data[p], b.data[p]])
            .filter(|px| px.iter().all(|&v| img.is_valid(v)))
            .collect();
        let covered = pixels.len();

        let hues = RegionValues::new(
            rgb.iter().map(|&px| f64::from(hue8(px)) * 2.0).collect(),
            covered,
        );
        let circ = hues.circular();
        obs.add(
            sample.as_str(),
            "hue_circular_mean",
            Observation::new(
                "hue circular mean",
                METHOD,
                "degrees",
                DataType::Float,
                circ.map(|c| c.mean),
            )
            .with_label("degrees"),
        )?;
        obs.add(
            sample.as_str(),
            "hue_circular_std",
            Observation::new(
                "hue circular standard deviation",
                METHOD,
                "degrees",
                DataType::Float,
                circ.map(|c| c.std),
            )
            .with_label("degrees"),
        )?;

        for ch in &channels {
            let values = RegionValues::new(rgb.iter().map(|&px| (ch.value)(px)).collect(), covered);
            record_channel(obs, &sample, ch, &values, params.bins)?;
        }
    }
    log::info!("color recorded for {} regions", regions.len());
    Ok(())
}

fn record_channel(
    obs: &mut Observations,
    sample: &str,
    ch: &Channel,
    values: &RegionValues,
    bins: usize,
) -> Result<(), ZonalError> {
    let hist = values.histogram(bins, ch.range);
    obs.add(
        sample,
        format!("{}_frequencies", ch.name),
        Observation::new(
            format!("{} frequencies", ch.name),
            METHOD,
            "frequency",
            DataType::List,
            hist.counts,
        )
        .with_label(hist.bin_edges),
    )?;
    obs.add(
        sample,
        format!("{}_mean", ch.name),
        Observation::new(
            format!("{} mean", ch.name),
            METHOD,
            "none",
            DataType::Float,
            values.mean(),
        ),
    )?;
    obs.add(
        sample,
        format!("{}_std", ch.name),
        Observation::new(
            format!("{} standard deviation", ch.name),
            METHOD,
            "none",
            DataType::Float,
            values.std(),
        ),
    )?;
    Ok(())
}
