//! Health Check API Handler

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::api::AppState;

/// GET /health
/// Liveness plus the number of registered jobs
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "UP",
        "jobs": state.registry.len(),
    }))
}
