//! Pipeline Job
//!
//! Adapts a [`StepPipeline`] to the cron job hooks. The job succeeds only if
//! every step succeeded; the step breakdown is returned as the result payload.

use async_trait::async_trait;
use ocms_core::domain::job::JobResult;

use crate::job::CronJob;
use crate::pipeline::StepPipeline;

pub struct PipelineJob {
    pipeline: StepPipeline,
}

impl PipelineJob {
    pub fn new(pipeline: StepPipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl CronJob for PipelineJob {
    fn job_name(&self) -> &str {
        self.pipeline.name()
    }

    async fn validate_pre_conditions(&self) -> anyhow::Result<bool> {
        if self.pipeline.is_empty() {
            tracing::warn!("Pipeline {} has no steps", self.pipeline.name());
            return Ok(false);
        }
        Ok(true)
    }

    async fn do_execute(&self) -> anyhow::Result<JobResult> {
        Ok(self.pipeline.run_to_job_result().await)
    }
}
