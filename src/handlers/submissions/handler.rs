//! Submission handler implementations

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::auth::AuthenticatedUser,
    services::{RunService, SubmissionService},
    state::AppState,
};

use super::{
    request::{
        CreateSubmissionRequest, ListMySubmissionsQuery, ListSubmissionsQuery, RunCodeRequest,
    },
    response::{CreateSubmissionResponse, RunResponse, SubmissionResponse, SubmissionsListResponse},
};

/// Page parameters for the contest listing
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Create a new submission; judging happens asynchronously
pub async fn create_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<CreateSubmissionRequest>,
) -> AppResult<(StatusCode, Json<CreateSubmissionResponse>)> {
    let submission =
        SubmissionService::create_submission(state.store(), state.queue(), auth_user.id, payload)
            .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateSubmissionResponse {
            id: submission.id,
            status: submission.status,
            message: "Submission queued for judging".to_string(),
        }),
    ))
}

/// List submissions, optionally by contest and status
pub async fn list_submissions(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(query): Query<ListSubmissionsQuery>,
) -> AppResult<Json<SubmissionsListResponse>> {
    let response = SubmissionService::list_submissions(state.store(), &auth_user, query).await?;
    Ok(Json(response))
}

/// List the caller's submissions
pub async fn list_my_submissions(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(query): Query<ListMySubmissionsQuery>,
) -> AppResult<Json<SubmissionsListResponse>> {
    let response =
        SubmissionService::list_my_submissions(state.store(), auth_user.id, query).await?;
    Ok(Json(response))
}

/// List the caller's submissions in one contest
pub async fn list_contest_submissions(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(contest_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<SubmissionsListResponse>> {
    let response = SubmissionService::list_contest_submissions(
        state.store(),
        auth_user.id,
        contest_id,
        query.page,
        query.limit,
    )
    .await?;
    Ok(Json(response))
}

/// Get submission by ID
pub async fn get_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SubmissionResponse>> {
    let submission = SubmissionService::get_submission(state.store(), &auth_user, id).await?;
    Ok(Json(submission))
}

/// Run code against custom input without creating a submission
pub async fn run_code(
    State(state): State<AppState>,
    _auth_user: AuthenticatedUser,
    Json(payload): Json<RunCodeRequest>,
) -> AppResult<Json<RunResponse>> {
    let response = RunService::run_code(state.pool(), payload).await?;
    Ok(Json(response))
}
