use crate::GridError;
use serde::{Deserialize, Serialize};

/// Plot layout parameters. Lengths are in CRS units (metres for projected
/// rasters).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Plot extent along the vertical direction (12 ft).
    pub range_length: f64,
    /// Plot extent along the horizontal direction (3 ft).
    pub column_length: f64,
    /// Alley between consecutive ranges.
    pub range_spacing: f64,
    /// Alley between consecutive columns.
    pub column_spacing: f64,
    pub num_ranges: usize,
    pub num_columns: usize,
    /// Strips per plot. `1` keeps plots whole.
    pub num_rows: usize,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            range_length: 3.6576,
            column_length: 0.9144,
            range_spacing: 0.0,
            column_spacing: 0.0,
            num_ranges: 1,
            num_columns: 1,
            num_rows: 4,
        }
    }
}

impl GridParams {
    pub fn validate(&self) -> Result<(), GridError> {
        for (name, v) in [
            ("range_length", self.range_length),
            ("column_length", self.column_length),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(GridError::InvalidParameter(format!(
                    "{name} must be > 0 (got {v})"
                )));
            }
        }
        for (name, v) in [
            ("range_spacing", self.range_spacing),
            ("column_spacing", self.column_spacing),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(GridError::InvalidParameter(format!(
                    "{name} must be >= 0 (got {v})"
                )));
            }
        }
        for (name, v) in [
            ("num_ranges", self.num_ranges),
            ("num_columns", self.num_columns),
            ("num_rows", self.num_rows),
        ] {
            if v == 0 {
                return Err(GridError::InvalidParameter(format!("{name} must be >= 1")));
            }
        }
        Ok(())
    }

    /// Distance between the origins of neighbouring plots `(horizontal, vertical)`.
    pub fn pitch(&self) -> (f64, f64) {
        (
            self.column_length + self.column_spacing,
            self.range_length + self.range_spacing,
        )
    }
}
