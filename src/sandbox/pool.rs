//! Shared sandbox capacity
//!
//! Graded judging and scratch runs draw from the same pool of `workers`
//! permits. Scratch runs must additionally hold one of `scratch_slots` permits,
//! so at most that many pool slots are ever spent on them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

use crate::{
    config::JudgeConfig,
    error::{AppError, AppResult},
    models::Language,
};

use super::{Prepared, Sandbox, SandboxError};

#[derive(Clone)]
pub struct SandboxPool {
    sandbox: Arc<dyn Sandbox>,
    workers: Arc<Semaphore>,
    scratch: Arc<Semaphore>,
    size: usize,
    start_retries: u32,
    start_backoff: Duration,
    scratch_wall_clock: Duration,
}

/// Permits held for the duration of one scratch run
pub struct ScratchPermit {
    _scratch: OwnedSemaphorePermit,
    _worker: OwnedSemaphorePermit,
}

impl SandboxPool {
    pub fn new(sandbox: Arc<dyn Sandbox>, config: &JudgeConfig) -> Self {
        Self {
            sandbox,
            workers: Arc::new(Semaphore::new(config.workers)),
            scratch: Arc::new(Semaphore::new(config.scratch_slots)),
            size: config.workers,
            start_retries: config.start_retries,
            start_backoff: config.start_backoff,
            scratch_wall_clock: config.scratch_wall_clock,
        }
    }

    /// Prepare a program, retrying start failures with linear backoff.
    /// Start failures happen before any user code runs, so a retry is safe.
    pub async fn prepare(&self, language: Language, source: &str) -> Result<Prepared, SandboxError> {
        let mut attempt = 1;
        loop {
            match self.sandbox.prepare(language, source).await {
                Ok(prepared) => return Ok(prepared),
                Err(e) if e.is_retryable() && attempt < self.start_retries => {
                    tracing::warn!(attempt, error = %e, "Sandbox failed to start, retrying");
                    tokio::time::sleep(self.start_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Ceiling on one scratch run, compile included
    pub fn scratch_wall_clock(&self) -> Duration {
        self.scratch_wall_clock
    }

    /// Wait for a pool slot for graded judging
    pub async fn acquire_worker(&self) -> AppResult<OwnedSemaphorePermit> {
        self.workers.clone().acquire_owned().await.map_err(pool_closed)
    }

    /// Wait for a scratch slot, then a pool slot
    pub async fn acquire_scratch(&self) -> AppResult<ScratchPermit> {
        let scratch = self.scratch.clone().acquire_owned().await.map_err(pool_closed)?;
        let worker = self.workers.clone().acquire_owned().await.map_err(pool_closed)?;
        Ok(ScratchPermit {
            _scratch: scratch,
            _worker: worker,
        })
    }

    /// Pool slots currently free
    pub fn available(&self) -> usize {
        self.workers.available_permits()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

fn pool_closed(_: AcquireError) -> AppError {
    AppError::SandboxUnavailable("sandbox pool is shut down".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::MockSandbox;

    fn pool(workers: usize, scratch_slots: usize) -> SandboxPool {
        let config = JudgeConfig {
            workers,
            scratch_slots,
            ..JudgeConfig::default()
        };
        SandboxPool::new(Arc::new(MockSandbox::new()), &config)
    }

    #[tokio::test]
    async fn test_scratch_runs_are_capped() {
        let pool = pool(3, 1);

        let _first = pool.acquire_scratch().await.unwrap();
        assert_eq!(pool.available(), 2);

        // A second scratch run waits even though worker slots are free
        let second = tokio::time::timeout(Duration::from_millis(50), pool.acquire_scratch()).await;
        assert!(second.is_err());

        // Graded work still gets the remaining slots
        let _a = pool.acquire_worker().await.unwrap();
        let _b = pool.acquire_worker().await.unwrap();
        assert_eq!(pool.available(), 0);
    }

    #[tokio::test]
    async fn test_permits_return_on_drop() {
        let pool = pool(2, 1);
        {
            let _scratch = pool.acquire_scratch().await.unwrap();
            let _worker = pool.acquire_worker().await.unwrap();
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.size(), 2);
    }

    #[tokio::test]
    async fn test_prepare_gives_up_after_configured_attempts() {
        let mut sandbox = MockSandbox::new();
        sandbox
            .expect_prepare()
            .times(2)
            .returning(|_, _| Err(SandboxError::Start("no such image".to_string())));
        let config = JudgeConfig {
            start_retries: 2,
            start_backoff: Duration::from_millis(1),
            ..JudgeConfig::default()
        };
        let pool = SandboxPool::new(Arc::new(sandbox), &config);

        let err = pool.prepare(Language::Cpp, "int main(){}").await.unwrap_err();
        assert!(matches!(err, SandboxError::Start(_)));
    }
}
