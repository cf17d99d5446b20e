//! JSON run configurations for the CLI and pipeline helpers.

use crate::error::IoError;
use fieldplots_grid::GridParams;
use fieldplots_zonal::{ColorParams, HeightParams, PixelRounding};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Grid generation run: corner file in, cell file out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub corners_path: Option<PathBuf>,
    /// Plot anchor points; switches to the flexible layout when set.
    pub anchors_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub grid: GridParams,
}

impl GridConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("plots.geojson"))
    }
}

/// Parameters shared by the per-region analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub image_path: Option<PathBuf>,
    pub regions_path: Option<PathBuf>,
    /// Binary mask raster for coverage and color.
    pub mask_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub height: HeightParams,
    pub color: ColorParams,
    /// Name of the index summarized by the spectral analysis.
    pub index_name: String,
    pub rounding: PixelRounding,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            image_path: None,
            regions_path: None,
            mask_path: None,
            output_path: None,
            height: HeightParams::default(),
            color: ColorParams::default(),
            index_name: "index".to_string(),
            rounding: PixelRounding::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the observations output path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("observations.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldplots_zonal::ColorSpaces;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: GridConfig =
            serde_json::from_str(r#"{"grid": {"num_columns": 12, "num_rows": 1}}"#).expect("cfg");
        assert_eq!(cfg.grid.num_columns, 12);
        assert_eq!(cfg.grid.range_length, GridParams::default().range_length);
        assert_eq!(cfg.output_path(), PathBuf::from("plots.geojson"));

        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{"color": {"colorspaces": "lab"}, "rounding": "nearest"}"#)
                .expect("cfg");
        assert_eq!(cfg.color.colorspaces, ColorSpaces::Lab);
        assert_eq!(cfg.color.bins, 10);
        assert_eq!(cfg.rounding, PixelRounding::Nearest);
        assert_eq!(cfg.height.percentiles, [25.0, 90.0]);
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("analysis.json");
        let cfg = AnalysisConfig {
            index_name: "ndvi".to_string(),
            ..AnalysisConfig::default()
        };
        cfg.write_json(&path).expect("write");
        assert_eq!(AnalysisConfig::load_json(&path).expect("load"), cfg);
    }
}
