//! Batch job recorder
//!
//! Persists the audit record of each tracked job run: a row is opened with
//! run status `R` when the run passes its pre-conditions, and closed with
//! `S` or `F` plus a log text once the run finishes.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ocms_core::domain::batch_job::BatchJobRecord;

pub use memory::InMemoryBatchJobRecorder;
pub use postgres::PgBatchJobRecorder;

/// Log text of a record that has been opened but not closed yet
pub const JOB_STARTED_LOG: &str = "Job started";

/// Recorder error type
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("batch job record {0} not found")]
    NotFound(i64),
}

/// Reference to an open audit record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecordHandle {
    pub id: i64,
    pub job_name: String,
}

/// Storage for batch job audit records
#[async_trait]
pub trait BatchJobRecorder: Send + Sync {
    /// Opens a record for a run that has just started
    async fn create_initial_record(&self, job_name: &str)
    -> Result<JobRecordHandle, RecorderError>;

    /// Closes the record as successful
    async fn record_success(
        &self,
        handle: &JobRecordHandle,
        log_text: &str,
    ) -> Result<(), RecorderError>;

    /// Closes the record as failed
    async fn record_failure(
        &self,
        handle: &JobRecordHandle,
        log_text: &str,
    ) -> Result<(), RecorderError>;

    /// Lists runs started within `[from, to]`, oldest first
    async fn list_runs(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BatchJobRecord>, RecorderError>;
}
