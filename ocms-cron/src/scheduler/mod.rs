//! Scheduler layer
//!
//! Holds the explicit registry of jobs built at start-up and fires each job
//! on its cron schedule under the distributed lock.

mod cron_loop;
mod registry;
mod schedule;

pub use cron_loop::JobScheduler;
pub use registry::{JobRegistry, RegisteredJob};
pub use schedule::{ScheduleConfig, env_prefix};

/// Scheduler error type
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("job {0} is already registered")]
    DuplicateJob(String),

    #[error("invalid cron expression '{expression}' for job {job}: {reason}")]
    InvalidCron {
        job: String,
        expression: String,
        reason: String,
    },

    #[error("invalid value '{value}' for {key}")]
    InvalidSetting { key: String, value: String },
}
