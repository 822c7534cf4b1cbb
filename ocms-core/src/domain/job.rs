//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a tracked cron job
///
/// A job starts `Unset` (never executed) and only the execution template moves
/// it through `Running` to one of the terminal states. Unknown names decode
/// as `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum JobStatus {
    #[default]
    Unset,
    Running,
    Success,
    Failed,
}

impl JobStatus {
    /// Whether a run has finished in this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }

    /// Parses a status name, coercing anything unrecognised to `Failed`
    pub fn parse(s: &str) -> Self {
        match s {
            "Unset" => JobStatus::Unset,
            "Running" => JobStatus::Running,
            "Success" => JobStatus::Success,
            "Failed" => JobStatus::Failed,
            _ => JobStatus::Failed,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        JobStatus::parse(&s)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Unset => write!(f, "Unset"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Success => write!(f, "Success"),
            JobStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Result of a job execution
///
/// `data` carries an optional structured payload, e.g. report figures or the
/// per-step breakdown of a pipeline job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JobResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches a structured payload to the result
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Point-in-time view of a job's lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusInfo {
    pub job_name: String,
    pub status: JobStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Message of the most recent job result
    pub last_message: Option<String>,
    pub duration_seconds: i64,
}

impl JobStatusInfo {
    pub fn new(
        job_name: impl Into<String>,
        status: JobStatus,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        last_error: Option<String>,
        last_message: Option<String>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            status,
            start_time,
            end_time,
            last_error,
            last_message,
            duration_seconds: duration_seconds(start_time, end_time),
        }
    }
}

/// Whole seconds between start and end, or 0 if either is missing
pub fn duration_seconds(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> i64 {
    match (start, end) {
        (Some(start), Some(end)) => (end - start).num_seconds().max(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_unknown_status_coerced_to_failed() {
        assert_eq!(JobStatus::parse("Success"), JobStatus::Success);
        assert_eq!(JobStatus::parse("COMPLETED"), JobStatus::Failed);
        assert_eq!(JobStatus::parse(""), JobStatus::Failed);
    }

    #[test]
    fn test_unknown_status_decodes_as_failed() {
        let known: JobStatus = serde_json::from_str("\"Running\"").unwrap();
        assert_eq!(known, JobStatus::Running);

        let info: JobStatusInfo = serde_json::from_value(serde_json::json!({
            "job_name": "nightly",
            "status": "Cancelled",
            "start_time": null,
            "end_time": null,
            "last_error": null,
            "last_message": null,
            "duration_seconds": 0
        }))
        .unwrap();
        assert_eq!(info.status, JobStatus::Failed);
        assert_eq!(serde_json::to_value(info.status).unwrap(), "Failed");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Success.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Unset.is_terminal());
    }

    #[test]
    fn test_duration_requires_both_timestamps() {
        let start = Utc::now();
        let end = start + Duration::seconds(42);

        assert_eq!(duration_seconds(Some(start), Some(end)), 42);
        assert_eq!(duration_seconds(Some(start), None), 0);
        assert_eq!(duration_seconds(None, Some(end)), 0);
        assert_eq!(duration_seconds(Some(start), Some(start)), 0);
    }

    #[test]
    fn test_status_info_computes_duration() {
        let start = Utc::now();
        let info = JobStatusInfo::new(
            "nightly",
            JobStatus::Success,
            Some(start),
            Some(start + Duration::milliseconds(2500)),
            None,
            Some("done".to_string()),
        );

        assert_eq!(info.duration_seconds, 2);
        assert_eq!(info.job_name, "nightly");
    }

    #[test]
    fn test_job_result_payload_is_optional_on_the_wire() {
        let plain = serde_json::to_value(JobResult::succeeded("ok")).unwrap();
        assert!(plain.get("data").is_none());

        let with_data = JobResult::failed("boom").with_data(serde_json::json!({"count": 3}));
        let json = serde_json::to_value(&with_data).unwrap();
        assert_eq!(json["data"]["count"], 3);
        assert_eq!(json["success"], false);
    }
}
