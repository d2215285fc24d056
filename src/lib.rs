//! CodeJudge - Online judge for programming submissions
//!
//! Accepts source code for a problem, runs it in an isolated sandbox against
//! the problem's hidden test cases and records a verdict with a partial
//! score. Contest submissions are additionally scoped to the contest's
//! problem set and window, and feed a per-contest aggregate.
//!
//! # Architecture
//!
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: Intake, scratch runs and contest scoring
//! - **Judge**: Queue-driven dispatcher and the test case evaluator
//! - **Sandbox**: Docker-backed execution with a bounded pool
//! - **Repositories**: Database access behind traits, with an in-memory store

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod judge;
pub mod middleware;
pub mod models;
pub mod queue;
pub mod sandbox;
pub mod services;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
