//! Isolated execution of untrusted programs
//!
//! A [`Sandbox`] turns source code into a runnable [`Program`] (compiling it if
//! the language needs it); a program is then run once per input under CPU time
//! and memory limits. [`docker::DockerSandbox`] is the production backend.

pub mod docker;
pub mod languages;
pub mod pool;

use async_trait::async_trait;

use crate::models::Language;

pub use docker::DockerSandbox;
pub use pool::SandboxPool;

/// Limits applied to a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// CPU time in milliseconds
    pub time_limit_ms: i64,
    pub memory_limit_kb: i64,
}

impl ResourceLimits {
    pub fn new(time_limit_ms: i32, memory_limit_kb: i32) -> Self {
        Self {
            time_limit_ms: i64::from(time_limit_ms),
            memory_limit_kb: i64::from(memory_limit_kb),
        }
    }
}

/// What a single run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// CPU time (user + system) in milliseconds
    pub time_ms: i64,
    /// Peak resident set size in kilobytes
    pub memory_kb: i64,
    pub timed_out: bool,
    pub memory_exceeded: bool,
}

/// Result of preparing source code for execution
pub enum Prepared {
    Ready(Box<dyn Program>),
    /// The compiler (or syntax check) rejected the source
    CompileFailed(String),
}

impl std::fmt::Debug for Prepared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready(..)"),
            Self::CompileFailed(message) => f.debug_tuple("CompileFailed").field(message).finish(),
        }
    }
}

/// Sandbox infrastructure failures. Never a verdict on the user's program.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// The sandbox could not be brought up; no user code has run yet
    #[error("failed to start sandbox: {0}")]
    Start(String),

    /// The sandbox broke while user code was running
    #[error("sandbox execution failed: {0}")]
    Execution(String),
}

impl SandboxError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Start(_))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Stage `source` and compile it when the language requires it
    async fn prepare(&self, language: Language, source: &str) -> Result<Prepared, SandboxError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Program: Send + Sync {
    /// Run once with `stdin` as standard input
    async fn run(&self, stdin: &str, limits: ResourceLimits) -> Result<RunOutput, SandboxError>;

    /// Tear the sandbox down. Safe to call more than once.
    async fn release(&self);
}
