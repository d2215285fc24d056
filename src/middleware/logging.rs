//! Logging middleware

use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

/// One structured line per request. Server errors and rejected requests log at
/// warn; 404s and 401s are routine for a polling client and stay at info.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = format!("{:.2}", start.elapsed().as_secs_f64() * 1000.0);

    let routine = matches!(status, StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED);
    if status.is_server_error() || (status.is_client_error() && !routine) {
        warn!(%method, %path, status = status.as_u16(), %duration_ms, "Request failed");
    } else {
        info!(%method, %path, status = status.as_u16(), %duration_ms, "Request completed");
    }

    response
}
