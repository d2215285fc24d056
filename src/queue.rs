//! Pending-submission queue
//!
//! Intake pushes submission ids; the dispatcher pops them. The queue only
//! carries ids: ownership of a submission is decided by the status claim in
//! the database, so a duplicated id is harmless.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use crate::{
    constants::{JUDGE_QUEUE_KEY, QUEUE_POLL_TIMEOUT_SECONDS},
    error::AppResult,
};

#[async_trait]
pub trait SubmissionQueue: Send + Sync {
    async fn push(&self, id: Uuid) -> AppResult<()>;

    /// Wait a bounded time for the next id; `None` when nothing arrived
    async fn pop(&self) -> AppResult<Option<Uuid>>;

    /// Ids waiting for a worker
    async fn len(&self) -> AppResult<u64>;
}

/// Redis list consumed with BRPOP
#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
}

impl RedisQueue {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SubmissionQueue for RedisQueue {
    async fn push(&self, id: Uuid) -> AppResult<()> {
        self.conn
            .clone()
            .lpush::<_, _, ()>(JUDGE_QUEUE_KEY, id.to_string())
            .await?;
        Ok(())
    }

    async fn pop(&self) -> AppResult<Option<Uuid>> {
        let result: Option<(String, String)> = self
            .conn
            .clone()
            .brpop(JUDGE_QUEUE_KEY, QUEUE_POLL_TIMEOUT_SECONDS)
            .await?;

        let Some((_, raw)) = result else {
            return Ok(None);
        };

        match Uuid::parse_str(&raw) {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                tracing::error!(entry = %raw, "Invalid submission ID in queue");
                Ok(None)
            }
        }
    }

    async fn len(&self) -> AppResult<u64> {
        let len: u64 = self.conn.clone().llen(JUDGE_QUEUE_KEY).await?;
        Ok(len)
    }
}

/// In-process FIFO
pub struct MemoryQueue {
    items: Mutex<VecDeque<Uuid>>,
    ready: Notify,
    poll_timeout: Duration,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::with_poll_timeout(Duration::from_secs_f64(QUEUE_POLL_TIMEOUT_SECONDS))
    }

    pub fn with_poll_timeout(poll_timeout: Duration) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            ready: Notify::new(),
            poll_timeout,
        }
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionQueue for MemoryQueue {
    async fn push(&self, id: Uuid) -> AppResult<()> {
        self.items.lock().await.push_back(id);
        self.ready.notify_one();
        Ok(())
    }

    async fn pop(&self) -> AppResult<Option<Uuid>> {
        let deadline = tokio::time::Instant::now() + self.poll_timeout;
        loop {
            if let Some(id) = self.items.lock().await.pop_front() {
                return Ok(Some(id));
            }
            if tokio::time::timeout_at(deadline, self.ready.notified())
                .await
                .is_err()
            {
                return Ok(None);
            }
        }
    }

    async fn len(&self) -> AppResult<u64> {
        Ok(self.items.lock().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_queue_is_fifo() {
        let queue = MemoryQueue::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        queue.push(a).await.unwrap();
        queue.push(b).await.unwrap();

        assert_eq!(queue.len().await.unwrap(), 2);
        assert_eq!(queue.pop().await.unwrap(), Some(a));
        assert_eq!(queue.pop().await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn test_memory_queue_pop_times_out() {
        let queue = MemoryQueue::with_poll_timeout(Duration::from_millis(20));
        assert_eq!(queue.pop().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_queue_wakes_waiting_consumer() {
        let queue = std::sync::Arc::new(MemoryQueue::with_poll_timeout(Duration::from_secs(5)));
        let id = Uuid::new_v4();

        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::task::yield_now().await;
        queue.push(id).await.unwrap();

        assert_eq!(consumer.await.unwrap().unwrap(), Some(id));
    }
}
