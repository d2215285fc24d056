//! Contest response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{ContestParticipant, ProblemScore};

/// Registration response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub contest_id: Uuid,
    pub user_id: Uuid,
    pub registered_at: DateTime<Utc>,
}

impl From<ContestParticipant> for RegistrationResponse {
    fn from(participant: ContestParticipant) -> Self {
        Self {
            contest_id: participant.contest_id,
            user_id: participant.user_id,
            registered_at: participant.registered_at,
        }
    }
}

/// Standings entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingEntry {
    pub rank: u32,
    pub user_id: Uuid,
    pub total_score: i64,
    pub solved: i64,
    pub last_improvement: DateTime<Utc>,
}

/// Standings response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsResponse {
    pub contest_id: Uuid,
    pub standings: Vec<StandingEntry>,
}

/// Best score on one problem
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemScoreResponse {
    pub problem_id: Uuid,
    pub best_score: i32,
    pub solved: bool,
}

impl From<ProblemScore> for ProblemScoreResponse {
    fn from(score: ProblemScore) -> Self {
        Self {
            problem_id: score.problem_id,
            best_score: score.best_score,
            solved: score.solved,
        }
    }
}

/// Caller's contest aggregate
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestScoreResponse {
    pub contest_id: Uuid,
    pub user_id: Uuid,
    pub total_score: i64,
    pub problems: Vec<ProblemScoreResponse>,
}
