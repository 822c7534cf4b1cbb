//! Report API Handlers

use axum::{Json, extract::State};
use ocms_core::domain::report::JobExecutionReport;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::jobs::REPORT_JOB_NAME;

/// GET /reports/job-execution
/// Job execution report for the current reporting day
pub async fn job_execution_report(
    State(state): State<AppState>,
) -> ApiResult<Json<JobExecutionReport>> {
    tracing::info!("Generating job execution report on request");

    let report = state
        .reports
        .generate_daily_report(&[REPORT_JOB_NAME])
        .await?;

    Ok(Json(report))
}
