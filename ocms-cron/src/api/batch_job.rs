//! Batch Job API Handlers
//!
//! Read access to the recorded job runs.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Duration, Utc};
use ocms_core::domain::batch_job::BatchJobRecord;
use ocms_core::dto::job::BatchJobQuery;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

/// GET /batch-jobs
/// List recorded runs
///
/// Query parameters:
/// - from: window start (default: 24 hours before `to`)
/// - to: window end (default: now)
/// - name: only runs of this job
pub async fn list_batch_jobs(
    State(state): State<AppState>,
    Query(query): Query<BatchJobQuery>,
) -> ApiResult<Json<Vec<BatchJobRecord>>> {
    let to = query.to.unwrap_or_else(Utc::now);
    let from = query.from.unwrap_or(to - Duration::hours(24));

    if from > to {
        return Err(ApiError::BadRequest(
            "'from' must not be after 'to'".to_string(),
        ));
    }

    tracing::debug!("Listing batch jobs from {} to {}", from, to);

    let mut runs = state.recorder.list_runs(from, to).await?;
    if let Some(name) = &query.name {
        runs.retain(|r| &r.name == name);
    }

    Ok(Json(runs))
}
