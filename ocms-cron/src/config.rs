//! Service configuration
//!
//! Everything is read from environment variables with sensible defaults so the
//! service can start locally without any setup. Per-job schedules are read by
//! [`crate::scheduler::ScheduleConfig::from_env`].

use crate::service::ReportSettings;

/// Batch service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string; `None` keeps records and locks in memory
    pub database_url: Option<String>,

    /// HTTP listen address
    pub bind_addr: String,

    /// Identifies this instance as a lock holder
    pub instance_id: String,

    /// When false, jobs only run through manual triggers
    pub scheduler_enabled: bool,

    pub report: ReportSettings,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(instance_id: String) -> Self {
        Self {
            database_url: None,
            bind_addr: "0.0.0.0:8085".to_string(),
            instance_id,
            scheduler_enabled: true,
            report: ReportSettings::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognised environment variables:
    /// - DATABASE_URL (optional, in-memory storage when unset)
    /// - CRON_BIND_ADDR (optional, default: 0.0.0.0:8085)
    /// - INSTANCE_ID (optional, default: random UUID)
    /// - SCHEDULER_ENABLED (optional, default: true)
    /// - REPORT_CUTOFF_HOUR (optional, default: 17)
    /// - ENVIRONMENT (optional, default: local)
    /// - SERVER_NAME (optional, default: HOSTNAME or localhost)
    pub fn from_env() -> anyhow::Result<Self> {
        let instance_id = std::env::var("INSTANCE_ID")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut config = Self::new(instance_id);

        config.database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.is_empty());

        if let Ok(addr) = std::env::var("CRON_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Ok(enabled) = std::env::var("SCHEDULER_ENABLED") {
            config.scheduler_enabled = parse_bool(&enabled).ok_or_else(|| {
                anyhow::anyhow!("SCHEDULER_ENABLED must be true or false, got '{}'", enabled)
            })?;
        }

        if let Ok(hour) = std::env::var("REPORT_CUTOFF_HOUR") {
            config.report.cutoff_hour = hour
                .parse::<u32>()
                .map_err(|_| anyhow::anyhow!("REPORT_CUTOFF_HOUR must be a number"))?;
        }

        if let Ok(environment) = std::env::var("ENVIRONMENT") {
            config.report.environment = environment;
        }

        config.report.server_name = std::env::var("SERVER_NAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .unwrap_or_else(|_| "localhost".to_string());

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.instance_id.is_empty() {
            anyhow::bail!("instance_id cannot be empty");
        }

        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                anyhow::bail!("database_url must start with postgres:// or postgresql://");
            }
        }

        if self.report.cutoff_hour > 23 {
            anyhow::bail!("report cutoff hour must be between 0 and 23");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Parses the boolean spellings accepted in environment variables
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
