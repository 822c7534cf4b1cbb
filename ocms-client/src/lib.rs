//! OCMS HTTP Client
//!
//! A simple, type-safe HTTP client for the OCMS cron service API.
//!
//! Used by the operator CLI to inspect job status, trigger and reset jobs,
//! and read the batch job audit trail.
//!
//! # Example
//!
//! ```no_run
//! use ocms_client::CronClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CronClient::new("http://localhost:8085");
//!
//!     let outcome = client.trigger_job("generate_batch_summary_rpt").await?;
//!     println!("{}: {}", outcome.job_name, outcome.result.message);
//!     Ok(())
//! }
//! ```

pub mod error;
mod batch_jobs;
mod jobs;
mod reports;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use ocms_core::dto::job::{BatchJobQuery, JobOverview, TriggerResponse};

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

/// HTTP client for the OCMS cron service API
///
/// Endpoints are grouped by concern:
/// - Job status and control (list, get, trigger, reset)
/// - Batch job records
/// - Job execution report
#[derive(Debug, Clone)]
pub struct CronClient {
    /// Base URL of the service (e.g., "http://localhost:8085")
    base_url: String,
    client: Client,
}

impl CronClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use ocms_client::CronClient;
    ///
    /// let client = CronClient::new("http://localhost:8085");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// Manual triggers wait for the job to finish, so callers running long
    /// jobs should not configure a short timeout here.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the service answers its health probe
    pub async fn health(&self) -> Result<()> {
        let url = self.endpoint(&["health"])?;
        let response = self.client.get(url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Builds an endpoint URL under the base URL
    ///
    /// Each segment is percent-encoded, so job names may contain characters
    /// that are not valid in a path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status code of a response without a body
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CronClient::new("http://localhost:8085");
        assert_eq!(client.base_url(), "http://localhost:8085");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = CronClient::new("http://localhost:8085/");
        assert_eq!(client.base_url(), "http://localhost:8085");
    }

    #[test]
    fn test_endpoint_encodes_job_names() {
        let client = CronClient::new("http://localhost:8085");

        let url = client.endpoint(&["jobs", "daily report/v2?", "trigger"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8085/jobs/daily%20report%2Fv2%3F/trigger"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = CronClient::new("http://gateway.internal/ocms-cron/");

        let url = client.endpoint(&["jobs"]).unwrap();
        assert_eq!(url.as_str(), "http://gateway.internal/ocms-cron/jobs");
    }

    #[test]
    fn test_endpoint_rejects_invalid_base() {
        let client = CronClient::new("not a url");

        assert!(matches!(
            client.endpoint(&["jobs"]),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_client_with_custom_client() {
        let client = CronClient::with_client("http://cron.internal:8085//", Client::new());
        assert_eq!(client.base_url(), "http://cron.internal:8085");
    }
}
