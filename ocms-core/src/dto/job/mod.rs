//! Job DTOs for the service API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::job::{JobResult, JobStatusInfo};

/// A registered job together with its schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOverview {
    #[serde(flatten)]
    pub status: JobStatusInfo,
    pub schedule: Option<String>,
    pub enabled: bool,
}

/// Response of a manual trigger
///
/// Always returned with HTTP 200; a failed run is reported in `result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub job_name: String,
    pub result: JobResult,
    pub status: JobStatusInfo,
}

/// Time window filter for batch job listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchJobQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub name: Option<String>,
}
