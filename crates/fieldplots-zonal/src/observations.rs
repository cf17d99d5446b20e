//! Observation collector passed through the analyses.

use crate::ZonalError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared type of an observation value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Int,
    Float,
    List,
    #[serde(rename = "str")]
    Text,
}

/// Observation payload. `Missing` marks a statistic over a region without
/// valid pixels and serializes as `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationValue {
    Missing,
    Int(i64),
    Float(f64),
    /// Histogram counts.
    Counts(Vec<u64>),
    List(Vec<f64>),
    Text(String),
}

impl ObservationValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ObservationValue::Int(v) => Some(*v as f64),
            ObservationValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ObservationValue::Missing)
    }
}

impl From<Option<f64>> for ObservationValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(ObservationValue::Missing, ObservationValue::Float)
    }
}

impl From<f64> for ObservationValue {
    fn from(v: f64) -> Self {
        ObservationValue::Float(v)
    }
}

impl From<i64> for ObservationValue {
    fn from(v: i64) -> Self {
        ObservationValue::Int(v)
    }
}

impl From<Vec<f64>> for ObservationValue {
    fn from(v: Vec<f64>) -> Self {
        ObservationValue::List(v)
    }
}

impl From<Vec<u64>> for ObservationValue {
    fn from(v: Vec<u64>) -> Self {
        ObservationValue::Counts(v)
    }
}

impl From<&str> for ObservationValue {
    fn from(v: &str) -> Self {
        ObservationValue::Text(v.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "trait")]
    pub trait_name: String,
    pub method: String,
    pub scale: String,
    pub datatype: DataType,
    pub value: ObservationValue,
    /// `"none"` unless the value needs one (bin edges, units).
    pub label: ObservationValue,
}

impl Observation {
    pub fn new(
        trait_name: impl Into<String>,
        method: impl Into<String>,
        scale: impl Into<String>,
        datatype: DataType,
        value: impl Into<ObservationValue>,
    ) -> Self {
        Self {
            trait_name: trait_name.into(),
            method: method.into(),
            scale: scale.into(),
            datatype,
            value: value.into(),
            label: ObservationValue::Text("none".to_string()),
        }
    }

    pub fn with_label(mut self, label: impl Into<ObservationValue>) -> Self {
        self.label = label.into();
        self
    }
}

/// Dataset-level term such as the ground sampling distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetadataTerm {
    pub datatype: DataType,
    pub value: ObservationValue,
}

/// All observations of a run, keyed by sample then variable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Observations {
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataTerm>,
    #[serde(default)]
    pub observations: BTreeMap<String, BTreeMap<String, Observation>>,
}

impl Observations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation; each `(sample, variable)` is written once.
    pub fn add(
        &mut self,
        sample: impl Into<String>,
        variable: impl Into<String>,
        observation: Observation,
    ) -> Result<(), ZonalError> {
        let (sample, variable) = (sample.into(), variable.into());
        let vars = self.observations.entry(sample.clone()).or_default();
        if vars.contains_key(&variable) {
            return Err(ZonalError::DuplicateObservation { sample, variable });
        }
        vars.insert(variable, observation);
        Ok(())
    }

    /// Set a metadata term, replacing an earlier value.
    pub fn add_metadata(
        &mut self,
        term: impl Into<String>,
        datatype: DataType,
        value: impl Into<ObservationValue>,
    ) {
        let term = term.into();
        let value = value.into();
        if let Some(prev) = self.metadata.get(&term) {
            if prev.value != value {
                log::debug!("metadata {term:?} replaced");
            }
        }
        self.metadata.insert(term, MetadataTerm { datatype, value });
    }

    pub fn get(&self, sample: &str, variable: &str) -> Option<&Observation> {
        self.observations.get(sample)?.get(variable)
    }

    /// Value of `(sample, variable)` as a float, if numeric.
    pub fn value_f64(&self, sample: &str, variable: &str) -> Option<f64> {
        self.get(sample, variable)?.value.as_f64()
    }

    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.observations.keys().map(String::as_str)
    }

    /// Total number of observations.
    pub fn len(&self) -> usize {
        self.observations.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
