//! API Error Handling
//!
//! Maps failures of the job endpoints to HTTP responses with a
//! `{"error": "..."}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::recorder::RecorderError;

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Job {0} not found")]
    JobNotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Reading the batch job records failed
    #[error("Batch job records unavailable")]
    Recorder(#[from] RecorderError),

    /// The task running a manual trigger ended without producing a result
    #[error("Job {job} was aborted: {reason}")]
    JobAborted { job: String, reason: String },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::JobNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Recorder(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::JobAborted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Recorder(err) => tracing::error!("Recorder error: {:?}", err),
            ApiError::JobAborted { job, reason } => {
                tracing::error!("Job task panicked: {} ({})", job, reason)
            }
            _ => {}
        }

        let status = self.status();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
