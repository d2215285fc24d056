//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::{config::JwtConfig, db::JudgeStore, queue::SubmissionQueue, sandbox::SandboxPool};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Submissions, problems and contests
    store: Arc<dyn JudgeStore>,

    /// Pending-submission queue shared with the dispatcher
    queue: Arc<dyn SubmissionQueue>,

    /// Sandbox capacity shared with the dispatcher
    pool: SandboxPool,

    jwt: JwtConfig,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        store: Arc<dyn JudgeStore>,
        queue: Arc<dyn SubmissionQueue>,
        pool: SandboxPool,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                queue,
                pool,
                jwt,
            }),
        }
    }

    pub fn store(&self) -> &dyn JudgeStore {
        self.inner.store.as_ref()
    }

    pub fn queue(&self) -> &dyn SubmissionQueue {
        self.inner.queue.as_ref()
    }

    pub fn pool(&self) -> &SandboxPool {
        &self.inner.pool
    }

    pub fn jwt(&self) -> &JwtConfig {
        &self.inner.jwt
    }
}
