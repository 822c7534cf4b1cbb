//! Cron scheduler
//!
//! Spawns one task per scheduled job. Each task sleeps until the next fire
//! time, then runs the job if it is enabled and the named lock can be taken.

use chrono::Utc;
use ocms_core::domain::job::JobResult;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{JobRegistry, RegisteredJob};
use crate::lock::JobLock;

pub struct JobScheduler {
    registry: Arc<JobRegistry>,
    lock: Arc<dyn JobLock>,
}

impl JobScheduler {
    pub fn new(registry: Arc<JobRegistry>, lock: Arc<dyn JobLock>) -> Self {
        Self { registry, lock }
    }

    /// Starts a schedule loop for every job that has a cron expression
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        for entry in self.registry.jobs() {
            if !entry.is_scheduled() {
                debug!("Job {} has no schedule, not starting a loop", entry.name());
                continue;
            }

            let registry = Arc::clone(&self.registry);
            let lock = Arc::clone(&self.lock);
            let name = entry.name().to_string();

            handles.push(tokio::spawn(async move {
                schedule_loop(registry, lock, name).await;
            }));
        }

        info!("Scheduler started with {} scheduled job(s)", handles.len());
        handles
    }

    /// Performs one scheduled fire of the named job right away
    pub async fn fire(&self, name: &str) -> Option<JobResult> {
        let entry = self.registry.get(name)?;
        fire(entry, self.lock.as_ref()).await
    }
}

async fn schedule_loop(registry: Arc<JobRegistry>, lock: Arc<dyn JobLock>, name: String) {
    let Some(entry) = registry.get(&name) else {
        return;
    };

    loop {
        let Some(next) = entry.next_local_fire(Utc::now()) else {
            warn!("Schedule for job {} has no upcoming fire time", name);
            return;
        };

        debug!("Next run of job {} at {}", name, next);
        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        fire(entry, lock.as_ref()).await;
    }
}

async fn fire(entry: &RegisteredJob, lock: &dyn JobLock) -> Option<JobResult> {
    let name = entry.name();

    if !entry.schedule.enabled {
        info!("Job {} is disabled. Skipping execution.", name);
        return None;
    }

    let lease = match lock.try_acquire(&entry.schedule.lock_config(name)).await {
        Ok(Some(lease)) => lease,
        Ok(None) => {
            debug!("Lock for job {} is held elsewhere, skipping this run", name);
            return None;
        }
        Err(e) => {
            error!("Failed to acquire lock for job {}: {}", name, e);
            return None;
        }
    };

    let result = match entry.job.execute().await {
        Ok(result) => Some(result),
        Err(e) => {
            warn!("Job task panicked: {}", e);
            None
        }
    };

    if let Err(e) = lock.release(&lease).await {
        error!("Failed to release lock for job {}: {}", name, e);
    }

    result
}
