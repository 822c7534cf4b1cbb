//! API Module
//!
//! HTTP API layer of the batch service.
//! Each submodule handles endpoints for a specific domain.

pub mod batch_job;
pub mod error;
pub mod health;
pub mod job;
pub mod report;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::recorder::BatchJobRecorder;
use crate::scheduler::JobRegistry;
use crate::service::JobExecutionReportService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub recorder: Arc<dyn BatchJobRecorder>,
    pub reports: Arc<JobExecutionReportService>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/jobs", get(job::list_jobs))
        .route("/jobs/{name}", get(job::get_job))
        .route("/jobs/{name}/trigger", post(job::trigger_job))
        .route("/jobs/{name}/reset", post(job::reset_job))
        // Audit records
        .route("/batch-jobs", get(batch_job::list_batch_jobs))
        // Reports
        .route("/reports/job-execution", get(report::job_execution_report))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
