//! Job registry
//!
//! Explicit map from job name to tracked job, built once at start-up and
//! shared by the scheduler and the API.

use chrono::{DateTime, Local, TimeZone, Utc};
use ocms_core::dto::job::JobOverview;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{ScheduleConfig, SchedulerError};
use crate::job::TrackedJob;

/// A job together with its schedule
pub struct RegisteredJob {
    pub job: Arc<TrackedJob>,
    pub schedule: ScheduleConfig,
    cron: Option<cron::Schedule>,
}

impl RegisteredJob {
    pub fn name(&self) -> &str {
        self.job.name()
    }

    /// Next fire time strictly after `after`, with the cron fields read in
    /// the zone of `after`
    pub fn next_fire<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.cron.as_ref()?.after(after).next()
    }

    /// Next fire time with the cron fields read in the server's local zone,
    /// the same zone the report cut-off uses
    pub fn next_local_fire(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.next_fire(&now.with_timezone(&Local))
            .map(|next| next.with_timezone(&Utc))
    }

    pub fn is_scheduled(&self) -> bool {
        self.cron.is_some()
    }

    pub fn overview(&self) -> JobOverview {
        JobOverview {
            status: self.job.status_info(),
            schedule: self.schedule.cron.clone(),
            enabled: self.schedule.enabled,
        }
    }
}

/// All jobs known to this service, ordered by name
#[derive(Default)]
pub struct JobRegistry {
    jobs: BTreeMap<String, RegisteredJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job; its cron expression is validated here
    pub fn register(
        &mut self,
        job: TrackedJob,
        schedule: ScheduleConfig,
    ) -> Result<Arc<TrackedJob>, SchedulerError> {
        let name = job.name().to_string();
        if self.jobs.contains_key(&name) {
            return Err(SchedulerError::DuplicateJob(name));
        }

        let cron = schedule.parse(&name)?;
        let job = Arc::new(job);

        match &schedule.cron {
            Some(expr) => tracing::info!("Registered job {} with schedule '{}'", name, expr),
            None => tracing::info!("Registered job {} (manual trigger only)", name),
        }

        self.jobs.insert(
            name,
            RegisteredJob {
                job: Arc::clone(&job),
                schedule,
                cron,
            },
        );

        Ok(job)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredJob> {
        self.jobs.get(name)
    }

    pub fn job(&self, name: &str) -> Option<Arc<TrackedJob>> {
        self.jobs.get(name).map(|entry| Arc::clone(&entry.job))
    }

    pub fn jobs(&self) -> impl Iterator<Item = &RegisteredJob> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::CronJob;
    use async_trait::async_trait;
    use chrono::{FixedOffset, Timelike};
    use ocms_core::domain::job::{JobResult, JobStatus};

    struct Named(&'static str);

    #[async_trait]
    impl CronJob for Named {
        fn job_name(&self) -> &str {
            self.0
        }

        async fn do_execute(&self) -> anyhow::Result<JobResult> {
            Ok(JobResult::succeeded("ok"))
        }
    }

    fn tracked(name: &'static str) -> TrackedJob {
        TrackedJob::new(Arc::new(Named(name)))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = JobRegistry::new();
        registry
            .register(tracked("ces_upload"), ScheduleConfig::new("0 0 1 * * *"))
            .unwrap();
        registry
            .register(tracked("adhoc"), ScheduleConfig::manual())
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("ces_upload").unwrap().is_scheduled());
        assert!(!registry.get("adhoc").unwrap().is_scheduled());
        assert!(registry.job("missing").is_none());

        let names: Vec<&str> = registry.jobs().map(|j| j.name()).collect();
        assert_eq!(names, vec!["adhoc", "ces_upload"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = JobRegistry::new();
        registry
            .register(tracked("ces_upload"), ScheduleConfig::manual())
            .unwrap();

        let err = registry
            .register(tracked("ces_upload"), ScheduleConfig::manual())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateJob(name) if name == "ces_upload"));
    }

    #[test]
    fn test_invalid_cron_rejected() {
        let mut registry = JobRegistry::new();

        let err = registry
            .register(tracked("broken"), ScheduleConfig::new("61 * * * * *"))
            .unwrap_err();

        assert!(matches!(err, SchedulerError::InvalidCron { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_next_fire() {
        let mut registry = JobRegistry::new();
        registry
            .register(tracked("daily"), ScheduleConfig::new("0 0 17 * * *"))
            .unwrap();

        let after = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let next = registry.get("daily").unwrap().next_fire(&after).unwrap();

        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 10, 17, 0, 0).unwrap());
    }

    #[test]
    fn test_next_fire_reads_fields_in_zone_of_after() {
        let mut registry = JobRegistry::new();
        registry
            .register(tracked("daily"), ScheduleConfig::new("0 0 17 * * *"))
            .unwrap();
        let singapore = FixedOffset::east_opt(8 * 3600).unwrap();

        let after = singapore.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let next = registry.get("daily").unwrap().next_fire(&after).unwrap();

        assert_eq!(next, singapore.with_ymd_and_hms(2025, 3, 10, 17, 0, 0).unwrap());
        assert_eq!(next.with_timezone(&Utc).hour(), 9);
    }

    #[test]
    fn test_next_local_fire_lands_on_local_cutoff() {
        let mut registry = JobRegistry::new();
        registry
            .register(tracked("daily"), ScheduleConfig::new("0 0 17 * * *"))
            .unwrap();

        let now = Local
            .with_ymd_and_hms(2025, 3, 10, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let next = registry.get("daily").unwrap().next_local_fire(now).unwrap();

        let local = next.with_timezone(&Local);
        assert_eq!(local.hour(), 17);
        assert_eq!(local.minute(), 0);
        assert_eq!(local.date_naive(), chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    }

    #[test]
    fn test_overview_reflects_status() {
        let mut registry = JobRegistry::new();
        registry
            .register(tracked("adhoc"), ScheduleConfig::manual())
            .unwrap();

        let overview = registry.get("adhoc").unwrap().overview();

        assert_eq!(overview.status.job_name, "adhoc");
        assert_eq!(overview.status.status, JobStatus::Unset);
        assert!(overview.schedule.is_none());
        assert!(overview.enabled);
    }
}
