//! Database module
//!
//! This module handles database connections, migrations, and repositories.
//! Every repository is a trait with a PostgreSQL implementation ([`PgStore`])
//! and an in-process one ([`MemoryStore`]).

pub mod memory;
pub mod repositories;

use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::DatabaseConfig;

pub use memory::MemoryStore;
pub use repositories::{
    ContestRepository, ProblemRepository, SubmissionFilter, SubmissionRepository,
};

/// Seconds to wait for a free connection before a query fails
const ACQUIRE_TIMEOUT_SECONDS: u64 = 5;

/// Open the connection pool and make sure the database answers
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECONDS))
        .connect(&config.url)
        .await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Everything the judge reads and writes
pub trait JudgeStore: SubmissionRepository + ProblemRepository + ContestRepository {}

impl<T> JudgeStore for T where T: SubmissionRepository + ProblemRepository + ContestRepository {}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
