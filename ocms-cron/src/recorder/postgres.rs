//! PostgreSQL batch job recorder
//!
//! Audit rows live in the `ocms_batch_job` table created by `db::run_migrations`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ocms_core::domain::batch_job::{BatchJobRecord, RunStatus};
use sqlx::PgPool;

use super::{BatchJobRecorder, JOB_STARTED_LOG, JobRecordHandle, RecorderError};

/// Recorder backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgBatchJobRecorder {
    pool: PgPool,
}

impl PgBatchJobRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn complete(
        &self,
        handle: &JobRecordHandle,
        status: RunStatus,
        log_text: &str,
    ) -> Result<(), RecorderError> {
        let result = sqlx::query(
            r#"
            UPDATE ocms_batch_job
            SET run_status = $1, end_run = $2, log_text = $3
            WHERE id = $4
            "#,
        )
        .bind(status.code())
        .bind(Utc::now())
        .bind(log_text)
        .bind(handle.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RecorderError::NotFound(handle.id));
        }

        Ok(())
    }
}

#[async_trait]
impl BatchJobRecorder for PgBatchJobRecorder {
    async fn create_initial_record(
        &self,
        job_name: &str,
    ) -> Result<JobRecordHandle, RecorderError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO ocms_batch_job (name, run_status, start_run, log_text)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(job_name)
        .bind(RunStatus::Running.code())
        .bind(Utc::now())
        .bind(JOB_STARTED_LOG)
        .fetch_one(&self.pool)
        .await?;

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
        self.complete(handle, RunStatus::Success, log_text).await
    }

    async fn record_failure(
        &self,
        handle: &JobRecordHandle,
        log_text: &str,
    ) -> Result<(), RecorderError> {
        self.complete(handle, RunStatus::Failed, log_text).await
    }

    async fn list_runs(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BatchJobRecord>, RecorderError> {
        let rows = sqlx::query_as::<_, BatchJobRow>(
            r#"
            SELECT id, name, run_status, start_run, end_run, log_text
            FROM ocms_batch_job
            WHERE start_run >= $1 AND start_run <= $2
            ORDER BY start_run ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct BatchJobRow {
    id: i64,
    name: String,
    run_status: Option<String>,
    start_run: DateTime<Utc>,
    end_run: Option<DateTime<Utc>>,
    log_text: Option<String>,
}

impl From<BatchJobRow> for BatchJobRecord {
    fn from(row: BatchJobRow) -> Self {
        BatchJobRecord {
            id: row.id,
            name: row.name,
            run_status: row.run_status.as_deref().and_then(RunStatus::from_code),
            run_status_code: row.run_status,
            start_run: row.start_run,
            end_run: row.end_run,
            log_text: row.log_text.unwrap_or_default(),
        }
    }
}
