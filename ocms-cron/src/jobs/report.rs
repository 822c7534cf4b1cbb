//! Job Execution Report Job
//!
//! Produces the daily summary of batch job runs. The report is returned as
//! the job result payload so it can be fetched through the trigger API.

use async_trait::async_trait;
use ocms_core::domain::job::JobResult;
use std::sync::Arc;

use crate::job::CronJob;
use crate::service::JobExecutionReportService;

pub const REPORT_JOB_NAME: &str = "generate_batch_summary_rpt";

pub struct JobExecutionReportJob {
    service: Arc<JobExecutionReportService>,
}

impl JobExecutionReportJob {
    pub fn new(service: Arc<JobExecutionReportService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CronJob for JobExecutionReportJob {
    fn job_name(&self) -> &str {
        REPORT_JOB_NAME
    }

    async fn do_execute(&self) -> anyhow::Result<JobResult> {
        tracing::info!("Starting job execution report generation");

        // The report never lists its own runs
        let report = match self.service.generate_daily_report(&[REPORT_JOB_NAME]).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Failed to generate job execution report: {}", e);
                return Ok(JobResult::failed(format!(
                    "Failed to generate job execution report: {}",
                    e
                )));
            }
        };

        let message = format!(
            "Job execution report generated: {} run(s), {} completed, {} failed, {} running",
            report.total_jobs, report.completed_jobs, report.failed_jobs, report.running_jobs
        );

        Ok(JobResult::succeeded(message).with_data(serde_json::to_value(&report)?))
    }
}
