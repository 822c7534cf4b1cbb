//! Job status and control endpoints

use crate::CronClient;
use crate::error::Result;
use ocms_core::dto::job::{JobOverview, TriggerResponse};

impl CronClient {
    // =============================================================================
    // Job Status
    // =============================================================================

    /// List every registered job with its last run status
    pub async fn list_jobs(&self) -> Result<Vec<JobOverview>> {
        let url = self.endpoint(&["jobs"])?;
        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }

    /// Get one job by name
    pub async fn get_job(&self, name: &str) -> Result<JobOverview> {
        let url = self.endpoint(&["jobs", name])?;
        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Job Control
    // =============================================================================

    /// Run a job now and wait for its result
    ///
    /// A failed run is not an error here; check `result.success`.
    ///
    /// # Example
    /// ```no_run
    /// # use ocms_client::CronClient;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = CronClient::new("http://localhost:8085");
    /// let outcome = client.trigger_job("toppan_upload").await?;
    /// if !outcome.result.success {
    ///     eprintln!("{}", outcome.result.message);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn trigger_job(&self, name: &str) -> Result<TriggerResponse> {
        let url = self.endpoint(&["jobs", name, "trigger"])?;
        tracing::debug!("Triggering job {} at {}", name, url);
        let response = self.client.post(url).send().await?;

        self.handle_response(response).await
    }

    /// Clear a job's last run status
    pub async fn reset_job(&self, name: &str) -> Result<()> {
        let url = self.endpoint(&["jobs", name, "reset"])?;
        tracing::debug!("Resetting job {}", name);
        let response = self.client.post(url).send().await?;

        self.handle_empty_response(response).await
    }
}
