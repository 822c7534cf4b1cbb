//! Pipeline step domain types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message given to steps that never ran because an earlier step did not succeed
pub const SKIPPED_MESSAGE: &str = "skipped due to previous step failure";

/// Outcome of a single pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
    /// Not attempted because a predecessor failed
    Skipped,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Success => write!(f, "success"),
            StepStatus::Error => write!(f, "error"),
            StepStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result record of one pipeline step
///
/// `json` is the structured payload later steps may read, e.g. notice numbers
/// extracted by a loading step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub status: StepStatus,
    pub message: String,
    #[serde(default)]
    pub json: Map<String, Value>,
}

impl StepResult {
    pub fn success(step_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Success,
            message: message.into(),
            json: Map::new(),
        }
    }

    pub fn error(step_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Error,
            message: message.into(),
            json: Map::new(),
        }
    }

    pub fn skipped(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Skipped,
            message: SKIPPED_MESSAGE.to_string(),
            json: Map::new(),
        }
    }

    /// Adds one payload entry
    pub fn with_json(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.json.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }

    /// Payload value as a list of strings, empty if absent or of another shape
    pub fn json_strings(&self, key: &str) -> Vec<String> {
        self.json
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
