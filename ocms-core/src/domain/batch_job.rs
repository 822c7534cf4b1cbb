//! Batch job audit record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run status of a recorded batch job, persisted as a single-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    #[serde(rename = "S")]
    Success,
    #[serde(rename = "F")]
    Failed,
    #[serde(rename = "R")]
    Running,
}

impl RunStatus {
    pub fn code(&self) -> &'static str {
        match self {
            RunStatus::Success => "S",
            RunStatus::Failed => "F",
            RunStatus::Running => "R",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(RunStatus::Success),
            "F" => Some(RunStatus::Failed),
            "R" => Some(RunStatus::Running),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "Success"),
            RunStatus::Failed => write!(f, "Failed"),
            RunStatus::Running => write!(f, "Running"),
        }
    }
}

/// Durable audit row describing one job run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJobRecord {
    pub id: i64,
    pub name: String,
    /// `None` when the stored code is not one of S/F/R
    pub run_status: Option<RunStatus>,
    /// Raw status code as stored
    pub run_status_code: Option<String>,
    pub start_run: DateTime<Utc>,
    pub end_run: Option<DateTime<Utc>>,
    pub log_text: String,
}

impl BatchJobRecord {
    /// A run counts as in progress while it is marked running or never ended
    pub fn is_running(&self) -> bool {
        self.run_status == Some(RunStatus::Running) || self.end_run.is_none()
    }
}
