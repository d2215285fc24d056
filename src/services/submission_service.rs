//! Submission service
//!
//! Intake validation, persistence and the read side of submissions. Judging
//! itself happens in [`crate::judge::Dispatcher`].

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    constants::SYSTEM_ERROR_MESSAGE,
    db::{JudgeStore, SubmissionFilter},
    error::{AppError, AppResult},
    handlers::submissions::{
        request::{CreateSubmissionRequest, ListMySubmissionsQuery, ListSubmissionsQuery},
        response::{SubmissionResponse, SubmissionsListResponse},
    },
    middleware::auth::AuthenticatedUser,
    models::{Language, NewSubmission, Submission, SubmissionStatus},
    queue::SubmissionQueue,
};

use super::paginate;

/// Submission service for business logic
pub struct SubmissionService;

impl SubmissionService {
    /// Validate and persist a submission, then queue it for judging.
    ///
    /// Every check runs before the insert, so a rejected request leaves no record.
    pub async fn create_submission(
        store: &dyn JudgeStore,
        queue: &dyn SubmissionQueue,
        user_id: Uuid,
        payload: CreateSubmissionRequest,
    ) -> AppResult<Submission> {
        payload.validate()?;
        let language: Language = payload.language.parse()?;

        if payload.code.trim().is_empty() {
            return Err(AppError::Validation("Code cannot be empty".to_string()));
        }

        let problem = store
            .find_problem(payload.problem_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Problem not found".to_string()))?;

        if store.test_cases(problem.id).await?.is_empty() {
            return Err(AppError::Validation(
                "Problem has no test cases".to_string(),
            ));
        }

        if let Some(contest_id) = payload.contest_id {
            Self::check_contest_entry(store, contest_id, problem.id, user_id).await?;
        }

        let submission = store
            .insert(NewSubmission {
                user_id,
                problem_id: problem.id,
                contest_id: payload.contest_id,
                language,
                source_code: payload.code,
            })
            .await?;

        // No worker will ever see an unqueued submission, so it ends here
        if let Err(e) = queue.push(submission.id).await {
            tracing::error!(submission_id = %submission.id, error = %e, "Failed to queue submission");
            store
                .fail_pending(submission.id, SYSTEM_ERROR_MESSAGE)
                .await?;
            return Err(e);
        }

        tracing::info!(
            submission_id = %submission.id,
            user_id = %user_id,
            problem_id = %problem.id,
            contest_id = ?submission.contest_id,
            language = %language,
            "Submission accepted"
        );

        Ok(submission)
    }

    /// Contest gate: problem membership, then the window, then registration
    async fn check_contest_entry(
        store: &dyn JudgeStore,
        contest_id: Uuid,
        problem_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<()> {
        let contest = store
            .find_contest(contest_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))?;

        if !store.contains_problem(contest.id, problem_id).await? {
            return Err(AppError::ProblemNotInContest);
        }

        if !contest.is_open_at(Utc::now()) {
            return Err(AppError::ContestClosed);
        }

        if !store.is_participant(contest.id, user_id).await? {
            return Err(AppError::NotRegistered);
        }

        Ok(())
    }

    /// Get submission by ID; only the owner or an admin may read it
    pub async fn get_submission(
        store: &dyn JudgeStore,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> AppResult<SubmissionResponse> {
        let submission = store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        if submission.user_id != user.id && !user.is_admin() {
            return Err(AppError::Forbidden(
                "Cannot view other users' submissions".to_string(),
            ));
        }

        Ok(submission.into())
    }

    /// List the caller's own submissions
    pub async fn list_my_submissions(
        store: &dyn JudgeStore,
        user_id: Uuid,
        query: ListMySubmissionsQuery,
    ) -> AppResult<SubmissionsListResponse> {
        let filter = SubmissionFilter {
            user_id: Some(user_id),
            problem_id: query.problem_id,
            contest_id: None,
            status: parse_status(query.status.as_deref())?,
        };
        Self::list(store, filter, query.page, query.limit).await
    }

    /// Contest- and status-filtered listing. Admins see everyone's
    /// submissions; other callers only their own.
    pub async fn list_submissions(
        store: &dyn JudgeStore,
        user: &AuthenticatedUser,
        query: ListSubmissionsQuery,
    ) -> AppResult<SubmissionsListResponse> {
        let user_id = if user.is_admin() {
            query.user_id
        } else {
            Some(user.id)
        };

        let filter = SubmissionFilter {
            user_id,
            problem_id: query.problem_id,
            contest_id: query.contest_id,
            status: parse_status(query.status.as_deref())?,
        };
        Self::list(store, filter, query.page, query.limit).await
    }

    /// The caller's submissions in one contest
    pub async fn list_contest_submissions(
        store: &dyn JudgeStore,
        user_id: Uuid,
        contest_id: Uuid,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> AppResult<SubmissionsListResponse> {
        if store.find_contest(contest_id).await?.is_none() {
            return Err(AppError::NotFound("Contest not found".to_string()));
        }

        let filter = SubmissionFilter {
            user_id: Some(user_id),
            contest_id: Some(contest_id),
            ..Default::default()
        };
        Self::list(store, filter, page, limit).await
    }

    async fn list(
        store: &dyn JudgeStore,
        filter: SubmissionFilter,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> AppResult<SubmissionsListResponse> {
        let (page, limit, offset) = paginate(page, limit);
        let (submissions, total) = store.list(&filter, offset, i64::from(limit)).await?;

        Ok(SubmissionsListResponse {
            submissions: submissions.into_iter().map(Into::into).collect(),
            total,
            page,
            limit,
        })
    }
}

fn parse_status(raw: Option<&str>) -> AppResult<Option<SubmissionStatus>> {
    raw.map(str::parse::<SubmissionStatus>)
        .transpose()
        .map_err(AppError::from)
}
