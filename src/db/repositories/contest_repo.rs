//! Contest repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::PgStore,
    error::{AppError, AppResult},
    models::{Contest, ContestParticipant, ProblemScore},
};

#[async_trait]
pub trait ContestRepository: Send + Sync {
    async fn find_contest(&self, id: Uuid) -> AppResult<Option<Contest>>;

    /// Whether the problem is in the contest's problem set
    async fn contains_problem(&self, contest_id: Uuid, problem_id: Uuid) -> AppResult<bool>;

    async fn is_participant(&self, contest_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Fails with `AlreadyExists` when the user is already registered
    async fn register(&self, contest_id: Uuid, user_id: Uuid) -> AppResult<ContestParticipant>;

    /// Keep the best score per (contest, user, problem). A lower score never
    /// replaces a higher one.
    async fn record_score(
        &self,
        contest_id: Uuid,
        user_id: Uuid,
        problem_id: Uuid,
        score: i32,
        solved: bool,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Per-problem bests for the contest, optionally for one user
    async fn problem_scores(
        &self,
        contest_id: Uuid,
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<ProblemScore>>;
}

#[async_trait]
impl ContestRepository for PgStore {
    async fn find_contest(&self, id: Uuid) -> AppResult<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>(r#"SELECT * FROM contests WHERE id = $1"#)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(contest)
    }

    async fn contains_problem(&self, contest_id: Uuid, problem_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM contest_problems WHERE contest_id = $1 AND problem_id = $2
            )
            "#,
        )
        .bind(contest_id)
        .bind(problem_id)
        .fetch_one(self.pool())
        .await?;

        Ok(exists)
    }

    async fn is_participant(&self, contest_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM contest_participants WHERE contest_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(contest_id)
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;

        Ok(exists)
    }

    async fn register(&self, contest_id: Uuid, user_id: Uuid) -> AppResult<ContestParticipant> {
        sqlx::query_as::<_, ContestParticipant>(
            r#"
            INSERT INTO contest_participants (contest_id, user_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(contest_id)
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(|err| match AppError::from(err) {
            AppError::AlreadyExists(_) => {
                AppError::AlreadyExists("Already registered for this contest".to_string())
            }
            other => other,
        })
    }

    async fn record_score(
        &self,
        contest_id: Uuid,
        user_id: Uuid,
        problem_id: Uuid,
        score: i32,
        solved: bool,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO contest_scores (contest_id, user_id, problem_id, best_score, solved, improved_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (contest_id, user_id, problem_id) DO UPDATE
            SET
                improved_at = CASE
                    WHEN EXCLUDED.best_score > contest_scores.best_score THEN EXCLUDED.improved_at
                    ELSE contest_scores.improved_at
                END,
                best_score = GREATEST(contest_scores.best_score, EXCLUDED.best_score),
                solved = contest_scores.solved OR EXCLUDED.solved
            "#,
        )
        .bind(contest_id)
        .bind(user_id)
        .bind(problem_id)
        .bind(score)
        .bind(solved)
        .bind(at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn problem_scores(
        &self,
        contest_id: Uuid,
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<ProblemScore>> {
        let scores = sqlx::query_as::<_, ProblemScore>(
            r#"
            SELECT * FROM contest_scores
            WHERE contest_id = $1 AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY user_id, problem_id
            "#,
        )
        .bind(contest_id)
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(scores)
    }
}
