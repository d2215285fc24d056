//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod contests;
pub mod health;
pub mod submissions;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{
    constants::{API_BASE_PATH, MAX_REQUEST_BODY_BYTES},
    middleware::{auth_middleware, logging_middleware},
    state::AppState,
};

/// Create all API routes. Everything except health requires a bearer token.
pub fn routes(state: AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .nest("/submissions", submissions::routes())
        .nest("/contests", contests::routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(health::routes()).merge(authenticated)
}

/// The complete application with its middleware stack
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest(API_BASE_PATH, routes(state.clone()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
