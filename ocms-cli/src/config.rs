//! Configuration module

use ocms_client::CronClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the cron service
    pub service_url: String,
}

impl Config {
    pub fn client(&self) -> CronClient {
        CronClient::new(&self.service_url)
    }
}
