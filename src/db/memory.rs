//! In-process store
//!
//! Implements every repository over plain collections behind a single lock, so
//! the compare-and-swap in [`SubmissionRepository::claim`] holds exactly as it
//! does in PostgreSQL. Used by the test suites and for local runs without a
//! database.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::repositories::{
        ContestRepository, ProblemRepository, SubmissionFilter, SubmissionRepository,
    },
    error::{AppError, AppResult},
    models::{
        Contest, ContestParticipant, JudgeOutcome, NewSubmission, Problem, ProblemScore,
        Submission, SubmissionStatus, TestCase,
    },
};

#[derive(Default)]
struct Tables {
    submissions: HashMap<Uuid, Submission>,
    problems: HashMap<Uuid, Problem>,
    test_cases: HashMap<Uuid, Vec<TestCase>>,
    contests: HashMap<Uuid, Contest>,
    contest_problems: HashSet<(Uuid, Uuid)>,
    participants: HashMap<(Uuid, Uuid), ContestParticipant>,
    scores: HashMap<(Uuid, Uuid, Uuid), ProblemScore>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a problem with its test cases
    pub async fn add_problem(&self, problem: Problem, mut test_cases: Vec<TestCase>) {
        test_cases.sort_by_key(|case| case.position);
        let mut tables = self.tables.write().await;
        tables.test_cases.insert(problem.id, test_cases);
        tables.problems.insert(problem.id, problem);
    }

    /// Seed a contest and its problem set
    pub async fn add_contest(&self, contest: Contest, problem_ids: &[Uuid]) {
        let mut tables = self.tables.write().await;
        for problem_id in problem_ids {
            tables.contest_problems.insert((contest.id, *problem_id));
        }
        tables.contests.insert(contest.id, contest);
    }

    /// Number of stored submissions, across all users
    pub async fn submission_count(&self) -> usize {
        self.tables.read().await.submissions.len()
    }
}

/// Apply a status change if the transition table allows it
fn advance(submission: &mut Submission, next: SubmissionStatus) -> bool {
    if !submission.status.can_transition_to(next) {
        return false;
    }
    submission.status = next;
    true
}

fn fail(submission: &mut Submission, message: &str, at: DateTime<Utc>) -> bool {
    if !advance(submission, SubmissionStatus::SystemError) {
        return false;
    }
    submission.error_message = Some(message.to_string());
    submission.judged_at = Some(at);
    true
}

#[async_trait]
impl SubmissionRepository for MemoryStore {
    async fn insert(&self, new: NewSubmission) -> AppResult<Submission> {
        let submission = Submission {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            problem_id: new.problem_id,
            contest_id: new.contest_id,
            language: new.language,
            source_code: new.source_code,
            status: SubmissionStatus::Pending,
            score: None,
            execution_time_ms: None,
            memory_usage_kb: None,
            tests_passed: None,
            tests_total: None,
            error_message: None,
            case_results: Json(Vec::new()),
            created_at: Utc::now(),
            claimed_at: None,
            judged_at: None,
        };

        self.tables
            .write()
            .await
            .submissions
            .insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Submission>> {
        Ok(self.tables.read().await.submissions.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &SubmissionFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Submission> = tables
            .submissions
            .values()
            .filter(|submission| filter.matches(submission))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn claim(&self, id: Uuid) -> AppResult<Option<Submission>> {
        let mut tables = self.tables.write().await;
        let Some(submission) = tables.submissions.get_mut(&id) else {
            return Ok(None);
        };
        if !advance(submission, SubmissionStatus::Judging) {
            return Ok(None);
        }
        submission.claimed_at = Some(Utc::now());
        Ok(Some(submission.clone()))
    }

    async fn finalize(&self, id: Uuid, outcome: &JudgeOutcome) -> AppResult<Option<Submission>> {
        let mut tables = self.tables.write().await;
        let Some(submission) = tables.submissions.get_mut(&id) else {
            return Ok(None);
        };
        if submission.status != SubmissionStatus::Judging || !advance(submission, outcome.status) {
            return Ok(None);
        }

        submission.score = outcome.score;
        submission.execution_time_ms = outcome.execution_time_ms;
        submission.memory_usage_kb = outcome.memory_usage_kb;
        submission.tests_passed = outcome.tests_passed;
        submission.tests_total = outcome.tests_total;
        submission.error_message = outcome.error_message.clone();
        submission.case_results = Json(outcome.case_results.clone());
        submission.judged_at = Some(Utc::now());
        Ok(Some(submission.clone()))
    }

    async fn fail_pending(&self, id: Uuid, message: &str) -> AppResult<Option<Submission>> {
        let mut tables = self.tables.write().await;
        let Some(submission) = tables.submissions.get_mut(&id) else {
            return Ok(None);
        };
        if submission.status != SubmissionStatus::Pending || !fail(submission, message, Utc::now()) {
            return Ok(None);
        }
        Ok(Some(submission.clone()))
    }

    async fn pending_ids(&self, created_before: DateTime<Utc>, limit: i64) -> AppResult<Vec<Uuid>> {
        let tables = self.tables.read().await;
        let mut pending: Vec<&Submission> = tables
            .submissions
            .values()
            .filter(|s| s.status == SubmissionStatus::Pending && s.created_at < created_before)
            .collect();
        pending.sort_by_key(|submission| submission.created_at);
        Ok(pending
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|submission| submission.id)
            .collect())
    }

    async fn abandon_stale(&self, claimed_before: DateTime<Utc>, message: &str) -> AppResult<u64> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut abandoned = 0;
        for submission in tables.submissions.values_mut() {
            let claimed_at = submission.claimed_at.unwrap_or(submission.created_at);
            if submission.status == SubmissionStatus::Judging
                && claimed_at < claimed_before
                && fail(submission, message, now)
            {
                abandoned += 1;
            }
        }
        Ok(abandoned)
    }
}

#[async_trait]
impl ProblemRepository for MemoryStore {
    async fn find_problem(&self, id: Uuid) -> AppResult<Option<Problem>> {
        Ok(self.tables.read().await.problems.get(&id).cloned())
    }

    async fn test_cases(&self, problem_id: Uuid) -> AppResult<Vec<TestCase>> {
        Ok(self
            .tables
            .read()
            .await
            .test_cases
            .get(&problem_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ContestRepository for MemoryStore {
    async fn find_contest(&self, id: Uuid) -> AppResult<Option<Contest>> {
        Ok(self.tables.read().await.contests.get(&id).cloned())
    }

    async fn contains_problem(&self, contest_id: Uuid, problem_id: Uuid) -> AppResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .contest_problems
            .contains(&(contest_id, problem_id)))
    }

    async fn is_participant(&self, contest_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .participants
            .contains_key(&(contest_id, user_id)))
    }

    async fn register(&self, contest_id: Uuid, user_id: Uuid) -> AppResult<ContestParticipant> {
        let mut tables = self.tables.write().await;
        if tables.participants.contains_key(&(contest_id, user_id)) {
            return Err(AppError::AlreadyExists(
                "Already registered for this contest".to_string(),
            ));
        }

        let participant = ContestParticipant {
            contest_id,
            user_id,
            registered_at: Utc::now(),
        };
        tables
            .participants
            .insert((contest_id, user_id), participant.clone());
        Ok(participant)
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
        let mut tables = self.tables.write().await;
        tables
            .scores
            .entry((contest_id, user_id, problem_id))
            .and_modify(|best| {
                if score > best.best_score {
                    best.best_score = score;
                    best.improved_at = at;
                }
                best.solved |= solved;
            })
            .or_insert(ProblemScore {
                contest_id,
                user_id,
                problem_id,
                best_score: score,
                solved,
                improved_at: at,
            });
        Ok(())
    }

    async fn problem_scores(
        &self,
        contest_id: Uuid,
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<ProblemScore>> {
        let tables = self.tables.read().await;
        let mut scores: Vec<ProblemScore> = tables
            .scores
            .values()
            .filter(|s| s.contest_id == contest_id && user_id.is_none_or(|id| s.user_id == id))
            .cloned()
            .collect();
        scores.sort_by_key(|s| (s.user_id, s.problem_id));
        Ok(scores)
    }
}
