//! Judge dispatcher
//!
//! Pulls submission ids off the queue, claims each one (`pending -> judging`)
//! and runs it through the sandbox and the evaluator. At most `workers`
//! submissions are judged at once; the rest wait in the queue.
//!
//! A sweep runs alongside the dispatch loop. It fails claims that outlived
//! `stale_after` and re-queues pending work the queue has lost.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    config::JudgeConfig,
    constants::{RECOVERY_BATCH_SIZE, SYSTEM_ERROR_MESSAGE},
    db::JudgeStore,
    error::{AppError, AppResult},
    models::{JudgeOutcome, Submission, SubmissionStatus},
    queue::SubmissionQueue,
    sandbox::{Prepared, ResourceLimits, SandboxPool},
};

use super::evaluator::{Evaluator, Flow};

/// Pause after a queue failure before polling again
const QUEUE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

pub struct Dispatcher {
    store: Arc<dyn JudgeStore>,
    queue: Arc<dyn SubmissionQueue>,
    pool: SandboxPool,
    config: JudgeConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn JudgeStore>,
        queue: Arc<dyn SubmissionQueue>,
        pool: SandboxPool,
        config: JudgeConfig,
    ) -> Self {
        Self {
            store,
            queue,
            pool,
            config,
        }
    }

    /// Start the dispatch loop and the sweep on the runtime
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(self.clone().sweep_periodically());
        tokio::spawn(async move { self.run().await })
    }

    /// Dispatch loop. An id is popped first and then waits for a pool slot,
    /// so idle workers never hold permits while the queue is empty.
    pub async fn run(self: Arc<Self>) {
        tracing::info!(workers = self.pool.size(), "Starting judge dispatcher");

        loop {
            let id = match self.queue.pop().await {
                Ok(Some(id)) => id,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to pop from judge queue");
                    tokio::time::sleep(QUEUE_ERROR_BACKOFF).await;
                    continue;
                }
            };

            let permit = match self.pool.acquire_worker().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(error = %e, "Stopping judge dispatcher");
                    return;
                }
            };

            let dispatcher = self.clone();
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = dispatcher.judge(id).await {
                    tracing::error!(submission_id = %id, error = %e, "Failed to judge submission");
                }
            });
        }
    }

    /// Claim and judge one submission.
    ///
    /// Returns `None` when the submission was not `pending` (already claimed by
    /// another worker, or already finished).
    pub async fn judge(&self, id: Uuid) -> AppResult<Option<Submission>> {
        let Some(submission) = self.store.claim(id).await? else {
            tracing::debug!(submission_id = %id, "Submission already claimed");
            return Ok(None);
        };
        tracing::info!(submission_id = %id, language = %submission.language, "Judging submission");

        let outcome = match tokio::time::timeout(self.config.wall_clock, self.execute(&submission))
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    submission_id = %id,
                    ceiling_secs = self.config.wall_clock.as_secs(),
                    "Judging exceeded the wall-clock ceiling"
                );
                JudgeOutcome::wall_clock_exceeded(self.config.wall_clock.as_millis() as i64)
            }
        };

        // A failed write leaves the claim in place; the sweep fails it later
        let Some(judged) = self.store.finalize(id, &outcome).await? else {
            tracing::warn!(submission_id = %id, "Submission left judging before it was finalized");
            return Ok(None);
        };

        tracing::info!(
            submission_id = %id,
            status = %judged.status,
            score = ?judged.score,
            time_ms = ?judged.execution_time_ms,
            "Submission judged"
        );

        if let Err(e) = self.record_contest_score(&judged).await {
            tracing::error!(submission_id = %id, error = %e, "Failed to update contest score");
        }

        Ok(Some(judged))
    }

    /// Startup pass over work left behind by a previous process. Every
    /// pending submission is pushed again and claims older than `stale_after`
    /// are failed; younger claims may belong to another live instance.
    /// Returns (abandoned, requeued).
    pub async fn recover(&self) -> AppResult<(u64, usize)> {
        let abandoned = self.abandon_stale().await?;
        let requeued = self.requeue_pending(Utc::now()).await?;
        log_reconciled("Recovered judge state", abandoned, requeued);
        Ok((abandoned, requeued))
    }

    /// Periodic pass. Claims older than `stale_after` are failed. Pending
    /// submissions of that age are pushed again only while the queue is
    /// empty, since nothing can still be carrying them then.
    pub async fn sweep(&self) -> AppResult<(u64, usize)> {
        let abandoned = self.abandon_stale().await?;
        let requeued = if self.queue.len().await? == 0 {
            self.requeue_pending(self.stale_cutoff()).await?
        } else {
            0
        };
        log_reconciled("Swept orphaned judge work", abandoned, requeued);
        Ok((abandoned, requeued))
    }

    async fn sweep_periodically(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        // the first tick is immediate and startup has just recovered
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep().await {
                tracing::error!(error = %e, "Judge sweep failed");
            }
        }
    }

    async fn abandon_stale(&self) -> AppResult<u64> {
        self.store
            .abandon_stale(self.stale_cutoff(), SYSTEM_ERROR_MESSAGE)
            .await
    }

    async fn requeue_pending(&self, created_before: DateTime<Utc>) -> AppResult<usize> {
        let pending = self
            .store
            .pending_ids(created_before, RECOVERY_BATCH_SIZE)
            .await?;
        for id in &pending {
            self.queue.push(*id).await?;
        }
        Ok(pending.len())
    }

    fn stale_cutoff(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.config.stale_after)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Always yields a terminal outcome; infrastructure failures become system errors
    async fn execute(&self, submission: &Submission) -> JudgeOutcome {
        match self.try_execute(submission).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(submission_id = %submission.id, error = %e, "Judging failed");
                JudgeOutcome::system_error(SYSTEM_ERROR_MESSAGE)
            }
        }
    }

    async fn try_execute(&self, submission: &Submission) -> AppResult<JudgeOutcome> {
        let problem = self
            .store
            .find_problem(submission.problem_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Problem not found".to_string()))?;
        let cases = self.store.test_cases(problem.id).await?;
        if cases.is_empty() {
            return Err(AppError::Validation("Problem has no test cases".to_string()));
        }

        let program = match self
            .pool
            .prepare(submission.language, &submission.source_code)
            .await?
        {
            Prepared::Ready(program) => program,
            Prepared::CompileFailed(message) => {
                return Ok(JudgeOutcome::compile_error(message, cases.len() as i32));
            }
        };

        let limits = ResourceLimits::new(problem.time_limit_ms, problem.memory_limit_kb);
        let mut evaluator = Evaluator::new(&problem, &cases);

        let mut failure = None;
        for (i, case) in cases.iter().enumerate() {
            match program.run(&case.input, limits).await {
                Ok(output) => {
                    if evaluator.record(i + 1, case, &output) == Flow::Stop {
                        break;
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        program.release().await;

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(evaluator.finish()),
        }
    }

    async fn record_contest_score(&self, submission: &Submission) -> AppResult<()> {
        let (Some(contest_id), Some(score)) = (submission.contest_id, submission.score) else {
            return Ok(());
        };
        if !submission.status.carries_score() {
            return Ok(());
        }

        self.store
            .record_score(
                contest_id,
                submission.user_id,
                submission.problem_id,
                score,
                submission.status == SubmissionStatus::Accepted,
                submission.judged_at.unwrap_or_else(Utc::now),
            )
            .await
    }
}

fn log_reconciled(message: &'static str, abandoned: u64, requeued: usize) {
    if abandoned > 0 || requeued > 0 {
        tracing::info!(abandoned, requeued, "{message}");
    }
}
