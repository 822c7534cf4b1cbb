//! In-memory batch job recorder
//!
//! Used when no database is configured, and as a test double.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ocms_core::domain::batch_job::{BatchJobRecord, RunStatus};
use std::sync::{Mutex, PoisonError};

use super::{BatchJobRecorder, JOB_STARTED_LOG, JobRecordHandle, RecorderError};

/// Recorder keeping all audit rows in process memory
#[derive(Default)]
pub struct InMemoryBatchJobRecorder {
    records: Mutex<Vec<BatchJobRecord>>,
}

impl InMemoryBatchJobRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record in insertion order
    pub fn records(&self) -> Vec<BatchJobRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores a record as-is, assigning the next id
    pub fn insert(&self, mut record: BatchJobRecord) -> i64 {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        record.id = records.len() as i64 + 1;
        let id = record.id;
        records.push(record);
        id
    }

    fn complete(
        &self,
        handle: &JobRecordHandle,
        status: RunStatus,
        log_text: &str,
    ) -> Result<(), RecorderError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .iter_mut()
            .find(|r| r.id == handle.id)
            .ok_or(RecorderError::NotFound(handle.id))?;

        record.run_status = Some(status);
        record.run_status_code = Some(status.code().to_string());
        record.end_run = Some(Utc::now());
        record.log_text = log_text.to_string();
        Ok(())
    }
}

#[async_trait]
impl BatchJobRecorder for InMemoryBatchJobRecorder {
    async fn create_initial_record(
        &self,
        job_name: &str,
    ) -> Result<JobRecordHandle, RecorderError> {
        let id = self.insert(BatchJobRecord {
            id: 0,
            name: job_name.to_string(),
            run_status: Some(RunStatus::Running),
            run_status_code: Some(RunStatus::Running.code().to_string()),
            start_run: Utc::now(),
            end_run: None,
            log_text: JOB_STARTED_LOG.to_string(),
        });

        Ok(JobRecordHandle {
            id,
            job_name: job_name.to_string(),
        })
    }

    async fn record_success(
        &self,
        handle: &JobRecordHandle,
        log_text: &str,
    ) -> Result<(), RecorderError> {
        self.complete(handle, RunStatus::Success, log_text)
    }

    async fn record_failure(
        &self,
        handle: &JobRecordHandle,
        log_text: &str,
    ) -> Result<(), RecorderError> {
        self.complete(handle, RunStatus::Failed, log_text)
    }

    async fn list_runs(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BatchJobRecord>, RecorderError> {
        let mut runs: Vec<BatchJobRecord> = self
            .records()
            .into_iter()
            .filter(|r| r.start_run >= from && r.start_run <= to)
            .collect();
        runs.sort_by_key(|r| r.start_run);
        Ok(runs)
    }
}
