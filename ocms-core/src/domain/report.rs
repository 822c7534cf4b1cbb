//! Job execution report types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of batch job runs within a reporting window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobExecutionReport {
    pub report_date: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub total_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub running_jobs: usize,
    pub job_executions: Vec<ReportedRun>,
    pub generated_at: DateTime<Utc>,
    pub environment: String,
    pub server_name: String,
}

/// One run as shown in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedRun {
    pub job_name: String,
    /// Display name of the run status, or the raw code if unrecognised
    pub status: String,
    pub message: String,
    pub start_time: String,
    pub end_time: String,
    pub duration: String,
}
