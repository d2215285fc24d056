//! Contest participation and scoring handlers

mod handler;
pub mod response;

pub use handler::*;
pub use response::*;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Contest routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/register", post(handler::register_for_contest))
        .route("/{id}/standings", get(handler::get_standings))
        .route("/{id}/score", get(handler::get_my_score))
}
