//! Contest model

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Contest database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contest {
    pub id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Contest {
    /// Status of the contest at `now`
    pub fn status_at(&self, now: DateTime<Utc>) -> ContestStatus {
        if now < self.start_time {
            ContestStatus::Upcoming
        } else if now < self.end_time {
            ContestStatus::Ongoing
        } else {
            ContestStatus::Ended
        }
    }

    /// The window is half-open: `[start_time, end_time)`
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == ContestStatus::Ongoing
    }

    /// Registration stays open until the contest ends
    pub fn is_registration_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) != ContestStatus::Ended
    }
}

/// Where a contest stands relative to its window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestStatus {
    Upcoming,
    Ongoing,
    Ended,
}

/// Contest participant model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContestParticipant {
    pub contest_id: Uuid,
    pub user_id: Uuid,
    pub registered_at: DateTime<Utc>,
}

/// Best score a user holds on one contest problem
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProblemScore {
    pub contest_id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub best_score: i32,
    pub solved: bool,
    /// When `best_score` last went up
    pub improved_at: DateTime<Utc>,
}

/// One row of the contest standings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub user_id: Uuid,
    pub total_score: i64,
    pub solved: i64,
    pub last_improvement: DateTime<Utc>,
}

/// Fold per-problem bests into ranked standings.
///
/// Ordering: total score desc, solved count desc, earliest last improvement
/// first. Exact ties fall back to user id so the order is stable.
pub fn rank_standings(scores: &[ProblemScore]) -> Vec<StandingRow> {
    let mut by_user: HashMap<Uuid, StandingRow> = HashMap::new();

    for score in scores {
        by_user
            .entry(score.user_id)
            .and_modify(|row| {
                row.total_score += i64::from(score.best_score);
                row.solved += i64::from(score.solved);
                row.last_improvement = row.last_improvement.max(score.improved_at);
            })
            .or_insert_with(|| StandingRow {
                user_id: score.user_id,
                total_score: i64::from(score.best_score),
                solved: i64::from(score.solved),
                last_improvement: score.improved_at,
            });
    }

    let mut rows: Vec<StandingRow> = by_user.into_values().collect();
    rows.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then(b.solved.cmp(&a.solved))
            .then(a.last_improvement.cmp(&b.last_improvement))
            .then(a.user_id.cmp(&b.user_id))
    });
    rows
}
