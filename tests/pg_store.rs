//! PostgreSQL store against a real database.
//!
//! Each test gets a fresh database with `migrations/` applied. Run with
//! `DATABASE_URL` pointing at a server the tests may create databases on:
//! `cargo test --test pg_store -- --ignored`.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use codejudge::{
    db::{ContestRepository, PgStore, SubmissionRepository},
    models::{JudgeOutcome, Language, NewSubmission, SubmissionStatus},
};

async fn seed_problem(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO problems (id, title) VALUES ($1, 'A + B')")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    id
}

async fn seed_contest(pool: &PgPool, problem_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO contests (id, title, start_time, end_time) \
         VALUES ($1, 'Weekly', NOW() - INTERVAL '1 hour', NOW() + INTERVAL '1 hour')",
    )
    .bind(id)
    .execute(pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO contest_problems (contest_id, problem_id) VALUES ($1, $2)")
        .bind(id)
        .bind(problem_id)
        .execute(pool)
        .await
        .unwrap();
    id
}

fn new_submission(problem_id: Uuid) -> NewSubmission {
    NewSubmission {
        user_id: Uuid::new_v4(),
        problem_id,
        contest_id: None,
        language: Language::Python,
        source_code: "print(1+1)".to_string(),
    }
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_concurrent_claims_have_one_winner(pool: PgPool) {
    let problem_id = seed_problem(&pool).await;
    let store = PgStore::new(pool);
    let submission = store.insert(new_submission(problem_id)).await.unwrap();

    let (a, b) = tokio::join!(store.claim(submission.id), store.claim(submission.id));
    let winners: Vec<_> = [a.unwrap(), b.unwrap()].into_iter().flatten().collect();

    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].status, SubmissionStatus::Judging);
    assert!(winners[0].claimed_at.is_some());
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_finalize_only_from_judging(pool: PgPool) {
    let problem_id = seed_problem(&pool).await;
    let store = PgStore::new(pool);
    let submission = store.insert(new_submission(problem_id)).await.unwrap();
    let outcome = JudgeOutcome::compile_error("SyntaxError", 3);

    assert!(store.finalize(submission.id, &outcome).await.unwrap().is_none());

    store.claim(submission.id).await.unwrap();
    let judged = store.finalize(submission.id, &outcome).await.unwrap().unwrap();
    assert_eq!(judged.status, SubmissionStatus::CompileError);
    assert_eq!(judged.score, None);
    assert_eq!(judged.tests_total, Some(3));
    assert!(judged.judged_at.is_some());

    let again = JudgeOutcome::system_error("late writer");
    assert!(store.finalize(submission.id, &again).await.unwrap().is_none());
    let stored = store.find_by_id(submission.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SubmissionStatus::CompileError);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_abandon_stale_spares_live_claims(pool: PgPool) {
    let problem_id = seed_problem(&pool).await;
    let store = PgStore::new(pool.clone());
    let orphaned = store.insert(new_submission(problem_id)).await.unwrap();
    let live = store.insert(new_submission(problem_id)).await.unwrap();
    store.claim(orphaned.id).await.unwrap();
    store.claim(live.id).await.unwrap();

    sqlx::query("UPDATE submissions SET claimed_at = NOW() - INTERVAL '1 hour' WHERE id = $1")
        .bind(orphaned.id)
        .execute(&pool)
        .await
        .unwrap();

    let cutoff = Utc::now() - Duration::minutes(10);
    assert_eq!(store.abandon_stale(cutoff, "lost worker").await.unwrap(), 1);

    let orphaned = store.find_by_id(orphaned.id).await.unwrap().unwrap();
    assert_eq!(orphaned.status, SubmissionStatus::SystemError);
    assert_eq!(orphaned.error_message.as_deref(), Some("lost worker"));
    let live = store.find_by_id(live.id).await.unwrap().unwrap();
    assert_eq!(live.status, SubmissionStatus::Judging);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_fail_pending_and_pending_ids(pool: PgPool) {
    let problem_id = seed_problem(&pool).await;
    let store = PgStore::new(pool);
    let unqueued = store.insert(new_submission(problem_id)).await.unwrap();
    let waiting = store.insert(new_submission(problem_id)).await.unwrap();

    let failed = store
        .fail_pending(unqueued.id, "queue down")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.status, SubmissionStatus::SystemError);
    assert!(store.fail_pending(unqueued.id, "queue down").await.unwrap().is_none());

    let later = Utc::now() + Duration::minutes(1);
    assert_eq!(store.pending_ids(later, 10).await.unwrap(), vec![waiting.id]);
    let earlier = Utc::now() - Duration::minutes(10);
    assert!(store.pending_ids(earlier, 10).await.unwrap().is_empty());
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_record_score_keeps_best(pool: PgPool) {
    let problem_id = seed_problem(&pool).await;
    let contest_id = seed_contest(&pool, problem_id).await;
    let store = PgStore::new(pool);
    let user_id = Uuid::new_v4();
    let t0 = Utc::now() - Duration::minutes(30);

    store
        .record_score(contest_id, user_id, problem_id, 6, false, t0)
        .await
        .unwrap();
    // worse resubmission: the best and its timestamp stay
    store
        .record_score(contest_id, user_id, problem_id, 2, false, t0 + Duration::minutes(5))
        .await
        .unwrap();

    let scores = store.problem_scores(contest_id, Some(user_id)).await.unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].best_score, 6);
    assert!(!scores[0].solved);
    assert_eq!(
        scores[0].improved_at.timestamp_micros(),
        t0.timestamp_micros()
    );

    let solved_at = t0 + Duration::minutes(10);
    store
        .record_score(contest_id, user_id, problem_id, 10, true, solved_at)
        .await
        .unwrap();

    let scores = store.problem_scores(contest_id, None).await.unwrap();
    assert_eq!(scores[0].best_score, 10);
    assert!(scores[0].solved);
    assert_eq!(
        scores[0].improved_at.timestamp_micros(),
        solved_at.timestamp_micros()
    );
}
