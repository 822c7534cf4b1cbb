//! Report endpoints

use crate::CronClient;
use crate::error::Result;
use ocms_core::domain::report::JobExecutionReport;

impl CronClient {
    /// Job execution report for the current reporting day
    pub async fn job_execution_report(&self) -> Result<JobExecutionReport> {
        let url = self.endpoint(&["reports", "job-execution"])?;
        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }
}
