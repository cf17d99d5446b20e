//! Regions and their sample labels.

use fieldplots_core::RegionGeometry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier properties, highest priority first.
pub const LABEL_KEYS: [&str; 3] = ["PlotName", "ID", "FID"];

/// A region geometry with its feature properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub geometry: RegionGeometry,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Region {
    pub fn new(geometry: RegionGeometry) -> Self {
        Self {
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Sample label of the region at position `index`.
    ///
    /// Uses the first non-null of `PlotName`, `ID`, `FID`; strings are taken
    /// verbatim and other values as their JSON text. Falls back to
    /// `default_{index}`.
    pub fn label(&self, index: usize) -> String {
        LABEL_KEYS
            .iter()
            .filter_map(|key| self.properties.get(*key))
            .find(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| format!("default_{index}"))
    }
}

impl From<RegionGeometry> for Region {
    fn from(geometry: RegionGeometry) -> Self {
        Self::new(geometry)
    }
}

/// Labels of all regions in order.
pub fn gather_labels(regions: &[Region]) -> Vec<String> {
    let labels: Vec<String> = regions
        .iter()
        .enumerate()
        .map(|(i, r)| r.label(i))
        .collect();
    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = labels.iter().find(|l| !seen.insert(l.as_str())) {
        log::warn!("region label {dup:?} is not unique; observations will collide");
    }
    labels
}
