//! Contest handler implementations

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::AppResult, middleware::auth::AuthenticatedUser, services::ContestService,
    state::AppState,
};

use super::response::{ContestScoreResponse, RegistrationResponse, StandingsResponse};

/// Register the caller for a contest
pub async fn register_for_contest(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<RegistrationResponse>)> {
    let participant = ContestService::register(state.store(), id, auth_user.id).await?;
    Ok((StatusCode::CREATED, Json(participant.into())))
}

/// Ranked contest standings
pub async fn get_standings(
    State(state): State<AppState>,
    _auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StandingsResponse>> {
    let standings = ContestService::standings(state.store(), id).await?;
    Ok(Json(standings))
}

/// The caller's aggregate and per-problem bests
pub async fn get_my_score(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ContestScoreResponse>> {
    let score = ContestService::score(state.store(), id, auth_user.id).await?;
    Ok(Json(score))
}
