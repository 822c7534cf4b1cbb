//! Job API Handlers
//!
//! Status, manual trigger and reset of registered jobs.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use ocms_core::dto::job::{JobOverview, TriggerResponse};
use std::sync::Arc;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::job::TrackedJob;

// =============================================================================
// Status Endpoints
// =============================================================================

/// GET /jobs
/// Status of every registered job
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobOverview>> {
    tracing::debug!("Listing jobs");

    Json(state.registry.jobs().map(|entry| entry.overview()).collect())
}

/// GET /jobs/{name}
/// Status of one job
pub async fn get_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<JobOverview>> {
    tracing::debug!("Getting job: {}", name);

    let entry = state
        .registry
        .get(&name)
        .ok_or_else(|| ApiError::JobNotFound(name.clone()))?;

    Ok(Json(entry.overview()))
}

// =============================================================================
// Control Endpoints
// =============================================================================

/// POST /jobs/{name}/trigger
/// Runs the job now and waits for it to finish
///
/// A failed run still answers 200; the outcome is in the body.
pub async fn trigger_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<TriggerResponse>> {
    tracing::info!("Manual trigger of job: {}", name);

    let job = find_job(&state, &name)?;

    let result = job
        .execute()
        .await
        .map_err(|e| ApiError::JobAborted {
            job: name.clone(),
            reason: e.to_string(),
        })?;

    Ok(Json(TriggerResponse {
        job_name: name,
        result,
        status: job.status_info(),
    }))
}

/// POST /jobs/{name}/reset
/// Clears the job's last run status
pub async fn reset_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    tracing::info!("Resetting job: {}", name);

    find_job(&state, &name)?.reset();

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

fn find_job(state: &AppState, name: &str) -> ApiResult<Arc<TrackedJob>> {
    state
        .registry
        .job(name)
        .ok_or_else(|| ApiError::JobNotFound(name.to_string()))
}
