//! Batch job record endpoints

use crate::CronClient;
use crate::error::Result;
use ocms_core::domain::batch_job::BatchJobRecord;
use ocms_core::dto::job::BatchJobQuery;

impl CronClient {
    /// List recorded runs in a time window
    ///
    /// Unset bounds fall back to the service defaults (the last 24 hours).
    pub async fn list_batch_jobs(&self, query: &BatchJobQuery) -> Result<Vec<BatchJobRecord>> {
        let url = self.endpoint(&["batch-jobs"])?;
        let response = self.client.get(url).query(query).send().await?;

        self.handle_response(response).await
    }
}
