//! Submission handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Submission routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create_submission))
        .route("/", get(handler::list_submissions))
        .route("/run", post(handler::run_code))
        .route("/my", get(handler::list_my_submissions))
        .route(
            "/contest/{contest_id}/user",
            get(handler::list_contest_submissions),
        )
        .route("/{id}", get(handler::get_submission))
}
