//! Cron job template
//!
//! A [`CronJob`] supplies the hooks of one unit of batch work. Wrapping it in
//! a [`TrackedJob`] gives the standard run skeleton: timing, status tracking,
//! error and panic capture, cleanup and audit recording.

mod tracked;

use async_trait::async_trait;
use ocms_core::domain::job::JobResult;
use std::any::Any;

pub use tracked::{PRECONDITIONS_FAILED, TrackedJob};

/// Hooks of a schedulable batch job
///
/// Only `job_name` and `do_execute` are required. Hooks may return errors or
/// even panic; the tracked run turns both into a failed result.
#[async_trait]
pub trait CronJob: Send + Sync {
    /// Unique name, also used as the lock and audit record name
    fn job_name(&self) -> &str;

    /// Returns `false` to skip the run
    async fn validate_pre_conditions(&self) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn do_execute(&self) -> anyhow::Result<JobResult>;

    /// Runs once after every run that got past the pre-conditions
    async fn cleanup(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Extracts the message carried by a panic payload
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
