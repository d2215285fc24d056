//! Submission repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    db::PgStore,
    error::AppResult,
    models::{JudgeOutcome, NewSubmission, Submission, SubmissionStatus},
};

/// Listing filters; `None` means "any"
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub user_id: Option<Uuid>,
    pub problem_id: Option<Uuid>,
    pub contest_id: Option<Uuid>,
    pub status: Option<SubmissionStatus>,
}

impl SubmissionFilter {
    pub fn matches(&self, submission: &Submission) -> bool {
        self.user_id.is_none_or(|id| submission.user_id == id)
            && self.problem_id.is_none_or(|id| submission.problem_id == id)
            && self.contest_id.is_none_or(|id| submission.contest_id == Some(id))
            && self.status.is_none_or(|status| submission.status == status)
    }
}

/// Submission persistence
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Persist a new submission in `pending`
    async fn insert(&self, new: NewSubmission) -> AppResult<Submission>;

    /// Find submission by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Submission>>;

    /// Newest first, with the total count matching the filter
    async fn list(
        &self,
        filter: &SubmissionFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Submission>, i64)>;

    /// Move `pending` to `judging` and stamp `claimed_at`. Returns `None` if
    /// another worker got there first.
    async fn claim(&self, id: Uuid) -> AppResult<Option<Submission>>;

    /// Write the terminal state of a claimed submission. Returns `None` if the
    /// submission was no longer `judging`.
    async fn finalize(&self, id: Uuid, outcome: &JudgeOutcome) -> AppResult<Option<Submission>>;

    /// Fail a submission that never reached a worker. Returns `None` if it had
    /// already left `pending`.
    async fn fail_pending(&self, id: Uuid, message: &str) -> AppResult<Option<Submission>>;

    /// Pending submissions created before `created_before`, oldest first
    async fn pending_ids(&self, created_before: DateTime<Utc>, limit: i64) -> AppResult<Vec<Uuid>>;

    /// Mark `judging` submissions claimed before `claimed_before` as system
    /// errors. Claims newer than the cutoff may still have a live worker.
    async fn abandon_stale(&self, claimed_before: DateTime<Utc>, message: &str) -> AppResult<u64>;
}

#[async_trait]
impl SubmissionRepository for PgStore {
    async fn insert(&self, new: NewSubmission) -> AppResult<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (id, user_id, problem_id, contest_id, language, source_code, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.problem_id)
        .bind(new.contest_id)
        .bind(new.language.as_str())
        .bind(&new.source_code)
        .bind(SubmissionStatus::Pending.as_str())
        .fetch_one(self.pool())
        .await?;

        Ok(submission)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Submission>> {
        let submission =
            sqlx::query_as::<_, Submission>(r#"SELECT * FROM submissions WHERE id = $1"#)
                .bind(id)
                .fetch_optional(self.pool())
                .await?;

        Ok(submission)
    }

    async fn list(
        &self,
        filter: &SubmissionFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let status = filter.status.map(|s| s.as_str());

        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT * FROM submissions
            WHERE
                ($1::uuid IS NULL OR user_id = $1)
                AND ($2::uuid IS NULL OR problem_id = $2)
                AND ($3::uuid IS NULL OR contest_id = $3)
                AND ($4::text IS NULL OR status = $4)
            ORDER BY created_at DESC, id
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.problem_id)
        .bind(filter.contest_id)
        .bind(status)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM submissions
            WHERE
                ($1::uuid IS NULL OR user_id = $1)
                AND ($2::uuid IS NULL OR problem_id = $2)
                AND ($3::uuid IS NULL OR contest_id = $3)
                AND ($4::text IS NULL OR status = $4)
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.problem_id)
        .bind(filter.contest_id)
        .bind(status)
        .fetch_one(self.pool())
        .await?;

        Ok((submissions, count))
    }

    async fn claim(&self, id: Uuid) -> AppResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET status = 'judging', claimed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(submission)
    }

    async fn finalize(&self, id: Uuid, outcome: &JudgeOutcome) -> AppResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET
                status = $2,
                score = $3,
                execution_time_ms = $4,
                memory_usage_kb = $5,
                tests_passed = $6,
                tests_total = $7,
                error_message = $8,
                case_results = $9,
                judged_at = NOW()
            WHERE id = $1 AND status = 'judging'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(outcome.status.as_str())
        .bind(outcome.score)
        .bind(outcome.execution_time_ms)
        .bind(outcome.memory_usage_kb)
        .bind(outcome.tests_passed)
        .bind(outcome.tests_total)
        .bind(outcome.error_message.as_deref())
        .bind(Json(&outcome.case_results))
        .fetch_optional(self.pool())
        .await?;

        Ok(submission)
    }

    async fn fail_pending(&self, id: Uuid, message: &str) -> AppResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET status = 'system_error', error_message = $2, judged_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(message)
        .fetch_optional(self.pool())
        .await?;

        Ok(submission)
    }

    async fn pending_ids(&self, created_before: DateTime<Utc>, limit: i64) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM submissions
            WHERE status = 'pending' AND created_at < $1
            ORDER BY created_at
            LIMIT $2
            "#,
        )
        .bind(created_before)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(ids)
    }

    async fn abandon_stale(&self, claimed_before: DateTime<Utc>, message: &str) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET status = 'system_error', error_message = $2, judged_at = NOW()
            WHERE status = 'judging' AND COALESCE(claimed_at, created_at) < $1
            "#,
        )
        .bind(claimed_before)
        .bind(message)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}
