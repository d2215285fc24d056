//! Contest service
//!
//! Registration and the read side of contest scoring. Scores themselves are
//! written by the dispatcher after each graded verdict.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::JudgeStore,
    error::{AppError, AppResult},
    handlers::contests::response::{
        ContestScoreResponse, ProblemScoreResponse, StandingEntry, StandingsResponse,
    },
    models::{Contest, ContestParticipant, rank_standings},
};

/// Contest service for business logic
pub struct ContestService;

impl ContestService {
    /// Register a user; allowed until the contest ends
    pub async fn register(
        store: &dyn JudgeStore,
        contest_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<ContestParticipant> {
        let contest = Self::find(store, contest_id).await?;

        if !contest.is_registration_open_at(Utc::now()) {
            return Err(AppError::ContestClosed);
        }

        let participant = store.register(contest.id, user_id).await?;
        tracing::info!(contest_id = %contest.id, user_id = %user_id, "User registered for contest");
        Ok(participant)
    }

    pub async fn standings(store: &dyn JudgeStore, contest_id: Uuid) -> AppResult<StandingsResponse> {
        let contest = Self::find(store, contest_id).await?;
        let scores = store.problem_scores(contest.id, None).await?;

        let standings = rank_standings(&scores)
            .into_iter()
            .zip(1u32..)
            .map(|(row, rank)| StandingEntry {
                rank,
                user_id: row.user_id,
                total_score: row.total_score,
                solved: row.solved,
                last_improvement: row.last_improvement,
            })
            .collect();

        Ok(StandingsResponse {
            contest_id: contest.id,
            standings,
        })
    }

    /// Sum of the caller's best score per problem
    pub async fn score(
        store: &dyn JudgeStore,
        contest_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<ContestScoreResponse> {
        let contest = Self::find(store, contest_id).await?;
        let scores = store.problem_scores(contest.id, Some(user_id)).await?;

        let total_score = scores.iter().map(|s| i64::from(s.best_score)).sum();

        Ok(ContestScoreResponse {
            contest_id: contest.id,
            user_id,
            total_score,
            problems: scores.into_iter().map(ProblemScoreResponse::from).collect(),
        })
    }

    async fn find(store: &dyn JudgeStore, contest_id: Uuid) -> AppResult<Contest> {
        store
            .find_contest(contest_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::{ContestRepository, MemoryStore};

    async fn store_with_contest(start: Duration, end: Duration) -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let contest = Contest {
            id: Uuid::new_v4(),
            title: "Weekly".to_string(),
            start_time: Utc::now() + start,
            end_time: Utc::now() + end,
            created_at: Utc::now(),
        };
        let id = contest.id;
        store.add_contest(contest, &[]).await;
        (store, id)
    }

    #[tokio::test]
    async fn test_register_before_start_and_once_only() {
        let (store, contest_id) = store_with_contest(Duration::hours(1), Duration::hours(3)).await;
        let user = Uuid::new_v4();

        ContestService::register(&store, contest_id, user).await.unwrap();
        let err = ContestService::register(&store, contest_id, user).await.unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_register_after_end_is_closed() {
        let (store, contest_id) = store_with_contest(Duration::hours(-3), Duration::hours(-1)).await;
        let err = ContestService::register(&store, contest_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "CONTEST_CLOSED");
    }

    #[tokio::test]
    async fn test_unknown_contest_is_not_found() {
        let store = MemoryStore::new();
        let err = ContestService::standings(&store, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_standings_are_ranked() {
        let (store, contest_id) = store_with_contest(Duration::hours(-1), Duration::hours(1)).await;
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();

        store.record_score(contest_id, alice, p1, 100, true, now).await.unwrap();
        store.record_score(contest_id, bob, p1, 100, true, now).await.unwrap();
        store.record_score(contest_id, bob, p2, 40, false, now).await.unwrap();

        let response = ContestService::standings(&store, contest_id).await.unwrap();
        let order: Vec<(u32, Uuid, i64)> = response
            .standings
            .iter()
            .map(|s| (s.rank, s.user_id, s.total_score))
            .collect();
        assert_eq!(order, vec![(1, bob, 140), (2, alice, 100)]);
    }

    #[tokio::test]
    async fn test_score_sums_best_per_problem() {
        let (store, contest_id) = store_with_contest(Duration::hours(-1), Duration::hours(1)).await;
        let user = Uuid::new_v4();
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();

        store.record_score(contest_id, user, p1, 60, false, now).await.unwrap();
        store.record_score(contest_id, user, p1, 30, false, now).await.unwrap();
        store.record_score(contest_id, user, p2, 25, false, now).await.unwrap();

        let response = ContestService::score(&store, contest_id, user).await.unwrap();
        assert_eq!(response.total_score, 85);
        assert_eq!(response.problems.len(), 2);
    }
}
