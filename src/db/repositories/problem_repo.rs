//! Problem repository
//!
//! Read-only: problems and their test data are managed by another service.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::PgStore,
    error::AppResult,
    models::{Problem, TestCase},
};

#[async_trait]
pub trait ProblemRepository: Send + Sync {
    async fn find_problem(&self, id: Uuid) -> AppResult<Option<Problem>>;

    /// Test cases in declaration order
    async fn test_cases(&self, problem_id: Uuid) -> AppResult<Vec<TestCase>>;
}

#[async_trait]
impl ProblemRepository for PgStore {
    async fn find_problem(&self, id: Uuid) -> AppResult<Option<Problem>> {
        let problem = sqlx::query_as::<_, Problem>(r#"SELECT * FROM problems WHERE id = $1"#)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(problem)
    }

    async fn test_cases(&self, problem_id: Uuid) -> AppResult<Vec<TestCase>> {
        let test_cases = sqlx::query_as::<_, TestCase>(
            r#"SELECT * FROM test_cases WHERE problem_id = $1 ORDER BY position, id"#,
        )
        .bind(problem_id)
        .fetch_all(self.pool())
        .await?;

        Ok(test_cases)
    }
}
