//! Concrete cron jobs

mod pipeline;
mod report;

pub use pipeline::PipelineJob;
pub use report::{JobExecutionReportJob, REPORT_JOB_NAME};
