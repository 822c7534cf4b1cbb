//! Per-job schedule settings

use std::str::FromStr;
use std::time::Duration;

use super::SchedulerError;
use crate::config::parse_bool;
use crate::lock::LockConfig;

/// When and how a job is fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Six or seven field cron expression; `None` means manual triggers only
    pub cron: Option<String>,
    pub enabled: bool,
    pub lock_at_least_for: Duration,
    pub lock_at_most_for: Duration,
}

impl ScheduleConfig {
    pub fn new(cron: impl Into<String>) -> Self {
        Self {
            cron: Some(cron.into()),
            ..Self::manual()
        }
    }

    /// A job that only runs when triggered through the API
    pub fn manual() -> Self {
        Self {
            cron: None,
            enabled: true,
            lock_at_least_for: Duration::from_secs(5 * 60),
            lock_at_most_for: Duration::from_secs(30 * 60),
        }
    }

    /// Reads `CRON_<JOB_NAME>_*` overrides on top of the given default schedule
    ///
    /// - `_SCHEDULE`: cron expression, empty to disable scheduling
    /// - `_ENABLED`: true/false
    /// - `_LOCK_AT_LEAST_SECS`, `_LOCK_AT_MOST_SECS`: lock lease bounds
    pub fn from_env(job_name: &str, default_cron: Option<&str>) -> Result<Self, SchedulerError> {
        Self::from_lookup(job_name, default_cron, |key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        job_name: &str,
        default_cron: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SchedulerError> {
        let prefix = env_prefix(job_name);
        let mut config = Self::manual();

        config.cron = match lookup(&format!("{}_SCHEDULE", prefix)) {
            Some(expr) => Some(expr),
            None => default_cron.map(str::to_string),
        }
        .map(|expr| expr.trim().to_string())
        .filter(|expr| !expr.is_empty());

        let key = format!("{}_ENABLED", prefix);
        if let Some(value) = lookup(&key) {
            config.enabled =
                parse_bool(&value).ok_or(SchedulerError::InvalidSetting { key, value })?;
        }

        let key = format!("{}_LOCK_AT_LEAST_SECS", prefix);
        if let Some(value) = lookup(&key) {
            config.lock_at_least_for = parse_secs(key, value)?;
        }

        let key = format!("{}_LOCK_AT_MOST_SECS", prefix);
        if let Some(value) = lookup(&key) {
            config.lock_at_most_for = parse_secs(key, value)?;
        }

        Ok(config)
    }

    pub fn lock_config(&self, job_name: &str) -> LockConfig {
        LockConfig {
            name: job_name.to_string(),
            lock_at_least_for: self.lock_at_least_for,
            lock_at_most_for: self.lock_at_most_for,
        }
    }

    /// Parses the cron expression, if any
    pub fn parse(&self, job_name: &str) -> Result<Option<cron::Schedule>, SchedulerError> {
        let Some(expression) = &self.cron else {
            return Ok(None);
        };

        // Spring style "no specific value" marker
        let normalized = expression.replace('?', "*");

        cron::Schedule::from_str(&normalized)
            .map(Some)
            .map_err(|e| SchedulerError::InvalidCron {
                job: job_name.to_string(),
                expression: expression.clone(),
                reason: e.to_string(),
            })
    }
}

/// Environment variable prefix for a job, e.g. `CRON_GENERATE_BATCH_SUMMARY_RPT`
pub fn env_prefix(job_name: &str) -> String {
    let name: String = job_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("CRON_{}", name)
}

fn parse_secs(key: String, value: String) -> Result<Duration, SchedulerError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| SchedulerError::InvalidSetting { key, value })
}
