//! Tracked job execution
//!
//! Runs the hooks of a [`CronJob`] in order, keeps the live status that the
//! API reports, and writes the audit record.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use ocms_core::domain::job::{JobResult, JobStatus, JobStatusInfo};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{CronJob, panic_message};
use crate::recorder::{BatchJobRecorder, JobRecordHandle};

pub const PRECONDITIONS_FAILED: &str = "Pre-conditions validation failed";

const UNKNOWN_FAILURE_LOG: &str = "Job failed with unknown error";
const DEFAULT_SUCCESS_LOG: &str = "Job completed successfully";

#[derive(Debug, Default)]
struct RunState {
    status: JobStatus,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    last_error: Option<String>,
    last_message: Option<String>,
}

/// A cron job wrapped with lifecycle tracking
///
/// Status reads are safe while a run is in progress. Concurrent runs of the
/// same instance are not prevented here; the scheduler's lock provides that.
pub struct TrackedJob {
    name: String,
    job: Arc<dyn CronJob>,
    recorder: Option<Arc<dyn BatchJobRecorder>>,
    state: RwLock<RunState>,
}

impl std::fmt::Debug for TrackedJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedJob")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TrackedJob {
    pub fn new(job: Arc<dyn CronJob>) -> Self {
        Self {
            name: job.job_name().to_string(),
            job,
            recorder: None,
            state: RwLock::new(RunState::default()),
        }
    }

    /// Records every run that passes its pre-conditions
    pub fn with_recorder(mut self, recorder: Arc<dyn BatchJobRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawns a run and returns immediately
    pub fn execute(self: &Arc<Self>) -> JoinHandle<JobResult> {
        let job = Arc::clone(self);
        tokio::spawn(async move { job.run().await })
    }

    /// Runs the job to completion in the current task
    ///
    /// Never fails: errors and panics from any hook end up in the returned
    /// result and the status is always terminal afterwards.
    pub async fn run(&self) -> JobResult {
        self.begin();
        info!("Starting job: {}", self.name);

        if !self.pre_conditions_hold().await {
            warn!("Pre-conditions not met for job: {}", self.name);
            self.finish(
                JobStatus::Failed,
                Some(PRECONDITIONS_FAILED.to_string()),
                PRECONDITIONS_FAILED,
            );
            return JobResult::failed(PRECONDITIONS_FAILED);
        }

        let record = self.open_record().await;
        let outcome = self.initialize_and_execute().await;
        self.run_cleanup().await;

        let result = match outcome {
            Ok(result) => {
                let status = if result.success {
                    JobStatus::Success
                } else {
                    JobStatus::Failed
                };
                let last_error = (!result.success).then(|| result.message.clone());
                self.finish(status, last_error, &result.message);
                result
            }
            Err(message) => {
                error!("Job {} failed with unexpected error: {}", self.name, message);
                let result = JobResult::failed(format!("Unexpected error: {}", message));
                self.finish(JobStatus::Failed, Some(message), &result.message);
                result
            }
        };

        if let Some(handle) = record {
            self.close_record(&handle, &result).await;
        }

        let info = self.status_info();
        info!(
            "Job {} finished with status {} in {}s",
            self.name, info.status, info.duration_seconds
        );

        result
    }

    pub fn status(&self) -> JobStatus {
        self.read_state().status
    }

    pub fn status_info(&self) -> JobStatusInfo {
        let state = self.read_state();
        JobStatusInfo::new(
            &self.name,
            state.status,
            state.start_time,
            state.end_time,
            state.last_error.clone(),
            state.last_message.clone(),
        )
    }

    /// Forgets the last run
    pub fn reset(&self) {
        *self.write_state() = RunState::default();
        info!("Status reset for job: {}", self.name);
    }

    // =========================================================================
    // Run steps
    // =========================================================================

    fn begin(&self) {
        let mut state = self.write_state();
        state.status = JobStatus::Running;
        state.start_time = Some(Utc::now());
        state.end_time = None;
        state.last_error = None;
        state.last_message = None;
    }

    fn finish(&self, status: JobStatus, last_error: Option<String>, message: &str) {
        let mut state = self.write_state();
        state.status = status;
        state.end_time = Some(Utc::now());
        state.last_error = last_error;
        state.last_message = Some(message.to_string());
    }

    async fn pre_conditions_hold(&self) -> bool {
        match AssertUnwindSafe(self.job.validate_pre_conditions())
            .catch_unwind()
            .await
        {
            Ok(Ok(valid)) => valid,
            Ok(Err(e)) => {
                warn!("Pre-condition check for job {} failed: {:#}", self.name, e);
                false
            }
            Err(panic) => {
                warn!(
                    "Pre-condition check for job {} panicked: {}",
                    self.name,
                    panic_message(panic)
                );
                false
            }
        }
    }

    async fn initialize_and_execute(&self) -> Result<JobResult, String> {
        let hooks = async {
            self.job.initialize().await?;
            self.job.do_execute().await
        };

        match AssertUnwindSafe(hooks).catch_unwind().await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(format!("{:#}", e)),
            Err(panic) => Err(panic_message(panic)),
        }
    }

    async fn run_cleanup(&self) {
        match AssertUnwindSafe(self.job.cleanup()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Cleanup failed for job {}: {:#}", self.name, e),
            Err(panic) => warn!(
                "Cleanup panicked for job {}: {}",
                self.name,
                panic_message(panic)
            ),
        }
    }

    // =========================================================================
    // Audit record
    // =========================================================================

    async fn open_record(&self) -> Option<JobRecordHandle> {
        let recorder = self.recorder.as_ref()?;

        match recorder.create_initial_record(&self.name).await {
            Ok(handle) => {
                info!("Recorded start of job {} (record {})", self.name, handle.id);
                Some(handle)
            }
            Err(e) => {
                error!("Failed to record start of job {}: {}", self.name, e);
                None
            }
        }
    }

    async fn close_record(&self, handle: &JobRecordHandle, result: &JobResult) {
        let Some(recorder) = self.recorder.as_ref() else {
            return;
        };

        let recorded = if self.status() == JobStatus::Success {
            let log_text = non_empty(&result.message).unwrap_or(DEFAULT_SUCCESS_LOG);
            recorder.record_success(handle, log_text).await
        } else {
            let last_error = self.read_state().last_error.clone();
            let log_text = last_error
                .as_deref()
                .and_then(non_empty)
                .unwrap_or(UNKNOWN_FAILURE_LOG)
                .to_string();
            recorder.record_failure(handle, &log_text).await
        };

        if let Err(e) = recorded {
            error!("Failed to record completion of job {}: {}", self.name, e);
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RunState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RunState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{InMemoryBatchJobRecorder, RecorderError};
    use async_trait::async_trait;
    use ocms_core::domain::batch_job::{BatchJobRecord, RunStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Clone)]
    enum Outcome {
        Returns(JobResult),
        Errors(&'static str),
        Panics(&'static str),
    }

    #[derive(Default)]
    struct Calls {
        pre: AtomicUsize,
        init: AtomicUsize,
        exec: AtomicUsize,
        cleanup: AtomicUsize,
    }

    struct TestJob {
        pre_conditions: anyhow::Result<bool>,
        outcome: Outcome,
        cleanup_fails: bool,
        calls: Arc<Calls>,
    }

    impl TestJob {
        fn new(outcome: Outcome) -> Self {
            Self {
                pre_conditions: Ok(true),
                outcome,
                cleanup_fails: false,
                calls: Arc::new(Calls::default()),
            }
        }
    }

    #[async_trait]
    impl CronJob for TestJob {
        fn job_name(&self) -> &str {
            "test_job"
        }

        async fn validate_pre_conditions(&self) -> anyhow::Result<bool> {
            self.calls.pre.fetch_add(1, Ordering::SeqCst);
            match &self.pre_conditions {
                Ok(valid) => Ok(*valid),
                Err(e) => Err(anyhow::anyhow!("{}", e)),
            }
        }

        async fn initialize(&self) -> anyhow::Result<()> {
            self.calls.init.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn do_execute(&self) -> anyhow::Result<JobResult> {
            self.calls.exec.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Outcome::Returns(result) => Ok(result.clone()),
                Outcome::Errors(msg) => Err(anyhow::anyhow!("{}", msg)),
                Outcome::Panics(msg) => panic!("{}", msg),
            }
        }

        async fn cleanup(&self) -> anyhow::Result<()> {
            self.calls.cleanup.fetch_add(1, Ordering::SeqCst);
            if self.cleanup_fails {
                anyhow::bail!("temp dir already gone");
            }
            Ok(())
        }
    }

    fn tracked(job: TestJob) -> (Arc<TrackedJob>, Arc<Calls>, Arc<InMemoryBatchJobRecorder>) {
        let calls = Arc::clone(&job.calls);
        let recorder = Arc::new(InMemoryBatchJobRecorder::new());
        let tracked = TrackedJob::new(Arc::new(job)).with_recorder(recorder.clone());
        (Arc::new(tracked), calls, recorder)
    }

    #[tokio::test]
    async fn test_successful_run() {
        let (job, calls, recorder) = tracked(TestJob::new(Outcome::Returns(
            JobResult::succeeded("Processed 12 notices"),
        )));

        let result = job.execute().await.unwrap();

        assert!(result.success);
        assert_eq!(result.message, "Processed 12 notices");
        assert_eq!(job.status(), JobStatus::Success);
        assert_eq!(calls.cleanup.load(Ordering::SeqCst), 1);

        let info = job.status_info();
        assert!(info.last_error.is_none());
        assert_eq!(info.last_message.as_deref(), Some("Processed 12 notices"));
        assert!(info.start_time.unwrap() <= info.end_time.unwrap());

        let records = recorder.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "test_job");
        assert_eq!(records[0].run_status, Some(RunStatus::Success));
        assert_eq!(records[0].log_text, "Processed 12 notices");
    }

    #[tokio::test]
    async fn test_empty_success_message_recorded_with_default_text() {
        let (job, _, recorder) = tracked(TestJob::new(Outcome::Returns(JobResult::succeeded(""))));

        job.run().await;

        assert_eq!(recorder.records()[0].log_text, DEFAULT_SUCCESS_LOG);
    }

    #[tokio::test]
    async fn test_failed_result_sets_last_error() {
        let (job, _, recorder) = tracked(TestJob::new(Outcome::Returns(JobResult::failed(
            "No records to process",
        ))));

        let result = job.run().await;

        assert!(!result.success);
        assert_eq!(result.message, "No records to process");
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(
            job.status_info().last_error.as_deref(),
            Some("No records to process")
        );
        assert_eq!(recorder.records()[0].run_status, Some(RunStatus::Failed));
        assert_eq!(recorder.records()[0].log_text, "No records to process");
    }

    #[tokio::test]
    async fn test_preconditions_false_short_circuits() {
        let mut test_job = TestJob::new(Outcome::Returns(JobResult::succeeded("unreachable")));
        test_job.pre_conditions = Ok(false);
        let (job, calls, recorder) = tracked(test_job);

        let result = job.execute().await.unwrap();

        assert_eq!(result, JobResult::failed(PRECONDITIONS_FAILED));
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(calls.pre.load(Ordering::SeqCst), 1);
        assert_eq!(calls.init.load(Ordering::SeqCst), 0);
        assert_eq!(calls.exec.load(Ordering::SeqCst), 0);
        assert_eq!(calls.cleanup.load(Ordering::SeqCst), 0);
        assert!(recorder.records().is_empty());

        let info = job.status_info();
        assert_eq!(info.last_error.as_deref(), Some(PRECONDITIONS_FAILED));
        assert!(info.end_time.is_some());
    }

    #[tokio::test]
    async fn test_precondition_error_treated_as_not_met() {
        let mut test_job = TestJob::new(Outcome::Returns(JobResult::succeeded("unreachable")));
        test_job.pre_conditions = Err(anyhow::anyhow!("config missing"));
        let (job, calls, _) = tracked(test_job);

        let result = job.run().await;

        assert_eq!(result.message, PRECONDITIONS_FAILED);
        assert_eq!(calls.init.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_error_still_runs_cleanup() {
        let (job, calls, recorder) = tracked(TestJob::new(Outcome::Errors("db down")));

        let result = job.execute().await.unwrap();

        assert_eq!(result, JobResult::failed("Unexpected error: db down"));
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(calls.cleanup.load(Ordering::SeqCst), 1);
        assert_eq!(job.status_info().last_error.as_deref(), Some("db down"));

        let records = recorder.records();
        assert_eq!(records[0].run_status, Some(RunStatus::Failed));
        assert_eq!(records[0].log_text, "db down");
    }

    #[tokio::test]
    async fn test_execute_panic_is_captured() {
        let (job, calls, _) = tracked(TestJob::new(Outcome::Panics("kaboom")));

        let result = job.execute().await.unwrap();

        assert!(!result.success);
        assert_eq!(result.message, "Unexpected error: kaboom");
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(calls.cleanup.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_mask_result() {
        let mut test_job = TestJob::new(Outcome::Returns(JobResult::succeeded("done")));
        test_job.cleanup_fails = true;
        let (job, calls, _) = tracked(test_job);

        let result = job.run().await;

        assert!(result.success);
        assert_eq!(job.status(), JobStatus::Success);
        assert_eq!(calls.cleanup.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_status_always_terminal_after_run() {
        let outcomes = [
            Outcome::Returns(JobResult::succeeded("ok")),
            Outcome::Returns(JobResult::failed("nope")),
            Outcome::Errors("boom"),
            Outcome::Panics("boom"),
        ];

        for outcome in outcomes {
            for pre_conditions in [true, false] {
                let mut test_job = TestJob::new(outcome.clone());
                test_job.pre_conditions = Ok(pre_conditions);
                let (job, _, _) = tracked(test_job);

                job.execute().await.unwrap();

                let info = job.status_info();
                assert!(info.status.is_terminal());
                assert!(info.duration_seconds >= 0);
                assert!(info.start_time.is_some() && info.end_time.is_some());
            }
        }
    }

    #[tokio::test]
    async fn test_sequential_runs_replace_state() {
        let (job, _, recorder) = tracked(TestJob::new(Outcome::Errors("db down")));

        job.execute().await.unwrap();
        let first = job.status_info();
        tokio::time::sleep(Duration::from_millis(10)).await;
        job.execute().await.unwrap();
        let second = job.status_info();

        assert!(second.start_time.unwrap() > first.end_time.unwrap());
        assert_eq!(second.status, JobStatus::Failed);
        assert_eq!(recorder.records().len(), 2);
    }

    #[tokio::test]
    async fn test_second_run_status_reflects_only_second_outcome() {
        struct Flaky {
            runs: AtomicUsize,
        }

        #[async_trait]
        impl CronJob for Flaky {
            fn job_name(&self) -> &str {
                "flaky"
            }

            async fn do_execute(&self) -> anyhow::Result<JobResult> {
                if self.runs.fetch_add(1, Ordering::SeqCst) == 0 {
                    anyhow::bail!("token expired");
                }
                Ok(JobResult::succeeded("recovered"))
            }
        }

        let job = Arc::new(TrackedJob::new(Arc::new(Flaky {
            runs: AtomicUsize::new(0),
        })));

        assert!(!job.execute().await.unwrap().success);
        assert_eq!(job.status(), JobStatus::Failed);

        assert!(job.execute().await.unwrap().success);
        let info = job.status_info();
        assert_eq!(info.status, JobStatus::Success);
        assert!(info.last_error.is_none());
        assert_eq!(info.last_message.as_deref(), Some("recovered"));
    }

    #[tokio::test]
    async fn test_status_readable_while_running() {
        struct Blocking {
            started: Arc<Notify>,
            release: Arc<Notify>,
        }

        #[async_trait]
        impl CronJob for Blocking {
            fn job_name(&self) -> &str {
                "blocking"
            }

            async fn do_execute(&self) -> anyhow::Result<JobResult> {
                self.started.notify_one();
                self.release.notified().await;
                Ok(JobResult::succeeded("released"))
            }
        }

        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let job = Arc::new(TrackedJob::new(Arc::new(Blocking {
            started: Arc::clone(&started),
            release: Arc::clone(&release),
        })));

        let handle = job.execute();
        started.notified().await;

        let info = job.status_info();
        assert_eq!(info.status, JobStatus::Running);
        assert!(info.start_time.is_some());
        assert!(info.end_time.is_none());
        assert_eq!(info.duration_seconds, 0);

        release.notify_one();
        assert!(handle.await.unwrap().success);
        assert_eq!(job.status(), JobStatus::Success);
    }

    #[tokio::test]
    async fn test_running_status_drops_previous_message() {
        struct Gated {
            started: Arc<Notify>,
            release: Arc<Notify>,
        }

        #[async_trait]
        impl CronJob for Gated {
            fn job_name(&self) -> &str {
                "gated"
            }

            async fn do_execute(&self) -> anyhow::Result<JobResult> {
                self.started.notify_one();
                self.release.notified().await;
                Ok(JobResult::failed("upstream rejected file"))
            }
        }

        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let job = Arc::new(TrackedJob::new(Arc::new(Gated {
            started: Arc::clone(&started),
            release: Arc::clone(&release),
        })));

        let first = job.execute();
        started.notified().await;
        release.notify_one();
        first.await.unwrap();
        assert_eq!(
            job.status_info().last_message.as_deref(),
            Some("upstream rejected file")
        );

        let second = job.execute();
        started.notified().await;

        let info = job.status_info();
        assert_eq!(info.status, JobStatus::Running);
        assert!(info.last_message.is_none());
        assert!(info.last_error.is_none());

        release.notify_one();
        second.await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_returns_to_unset() {
        let (job, _, _) = tracked(TestJob::new(Outcome::Errors("db down")));
        job.run().await;

        job.reset();

        let info = job.status_info();
        assert_eq!(info.status, JobStatus::Unset);
        assert!(info.start_time.is_none());
        assert!(info.end_time.is_none());
        assert!(info.last_error.is_none());
        assert!(info.last_message.is_none());
        assert_eq!(info.duration_seconds, 0);
    }

    #[tokio::test]
    async fn test_recorder_failure_does_not_abort_run() {
        struct BrokenRecorder;

        #[async_trait]
        impl BatchJobRecorder for BrokenRecorder {
            async fn create_initial_record(
                &self,
                _job_name: &str,
            ) -> Result<JobRecordHandle, RecorderError> {
                Err(RecorderError::NotFound(0))
            }

            async fn record_success(
                &self,
                handle: &JobRecordHandle,
                _log_text: &str,
            ) -> Result<(), RecorderError> {
                Err(RecorderError::NotFound(handle.id))
            }

            async fn record_failure(
                &self,
                handle: &JobRecordHandle,
                _log_text: &str,
            ) -> Result<(), RecorderError> {
                Err(RecorderError::NotFound(handle.id))
            }

            async fn list_runs(
                &self,
                _from: DateTime<Utc>,
                _to: DateTime<Utc>,
            ) -> Result<Vec<BatchJobRecord>, RecorderError> {
                Ok(Vec::new())
            }
        }

        let test_job = TestJob::new(Outcome::Returns(JobResult::succeeded("done")));
        let calls = Arc::clone(&test_job.calls);
        let job = TrackedJob::new(Arc::new(test_job)).with_recorder(Arc::new(BrokenRecorder));

        let result = job.run().await;

        assert!(result.success);
        assert_eq!(calls.exec.load(Ordering::SeqCst), 1);
        assert_eq!(job.status(), JobStatus::Success);
    }
}
