//! Health check handlers

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Submissions waiting for a worker; absent when the queue is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_depth: Option<u64>,
    pub workers: usize,
    pub available_workers: usize,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let queue_depth = match state.queue().len().await {
        Ok(depth) => Some(depth),
        Err(e) => {
            tracing::warn!(error = %e, "Queue depth unavailable");
            None
        }
    };

    let status = if queue_depth.is_some() { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        queue_depth,
        workers: state.pool().size(),
        available_workers: state.pool().available(),
    })
}

/// Health routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
