use serde::Deserialize;
use serde_json::Value;

use crate::error::HarvestError;

#[derive(Debug, Clone, Deserialize)]
pub struct PidEntry {
    pub pid: String,
    #[serde(rename = "datasetIds", default)]
    pub dataset_ids: Vec<String>,
}

/// Persistent identifiers keyed by the dataset ids each one covers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PidList {
    #[serde(default)]
    data: Vec<PidEntry>,
}

impl PidList {
    pub fn new(data: Vec<PidEntry>) -> Self {
        Self { data }
    }

    /// An empty body (unauthorized or not found) is an empty list.
    pub fn from_json(value: Value) -> Result<Self, HarvestError> {
        if value.as_object().is_some_and(|object| object.is_empty()) {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|err| HarvestError::InvalidJson {
            url: "pid list".to_string(),
            message: err.to_string(),
        })
    }

    /// Linear scan; when several entries list the dataset, the last one wins.
    pub fn lookup(&self, dataset_id: &str) -> Option<&str> {
        self.data
            .iter()
            .rev()
            .find(|entry| entry.dataset_ids.iter().any(|id| id == dataset_id))
            .map(|entry| entry.pid.as_str())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
