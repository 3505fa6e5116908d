//! Response bodies of the ABR server API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `GET /api/state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEnvelope {
    pub state: Value,
}

/// Body of `GET /api/list-states`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedStates {
    pub states: Vec<String>,
}

/// One histogram bucket; `items` values fall at or below `bin_max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub bin_max: f64,
    pub items: u64,
}

/// Body of the key-data histogram endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub histogram: Vec<HistogramBin>,
    pub key_data_min: f64,
    pub key_data_max: f64,
}

impl Histogram {
    /// Total number of items across all bins.
    pub fn total_items(&self) -> u64 {
        self.histogram.iter().map(|b| b.items).sum()
    }
}

/// Address of a scalar variable inside a dataset's key data.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramRequest {
    pub organization: String,
    pub dataset: String,
    pub key_data: String,
    pub variable: String,
    /// Stretch the outer bins to these bounds instead of the key data's own.
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl HistogramRequest {
    pub fn new(
        organization: impl Into<String>,
        dataset: impl Into<String>,
        key_data: impl Into<String>,
        variable: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            dataset: dataset.into(),
            key_data: key_data.into(),
            variable: variable.into(),
            min: None,
            max: None,
        }
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// A PNG thumbnail rendered as a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub data_url: String,
    /// Size of the decoded PNG.
    pub bytes: usize,
}
