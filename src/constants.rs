//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// JUDGE DEFAULTS
// =============================================================================

/// Default number of concurrent graded sandbox executions
pub const DEFAULT_JUDGE_WORKERS: usize = 4;

/// Default number of pool slots the run-only path may occupy at once
pub const DEFAULT_SCRATCH_SLOTS: usize = 1;

/// Default wall-clock ceiling for judging one submission, in seconds
pub const DEFAULT_WALL_CLOCK_SECONDS: u64 = 120;

/// Default number of attempts to start a sandbox before giving up
pub const DEFAULT_START_RETRIES: u32 = 3;

/// Default compile timeout in seconds
pub const DEFAULT_COMPILE_TIMEOUT_SECONDS: u64 = 30;

/// Delay before the second sandbox start attempt, in milliseconds; grows linearly
pub const DEFAULT_START_BACKOFF_MS: u64 = 500;

/// Default age after which a `judging` claim is considered orphaned, in seconds.
/// Must exceed the wall-clock ceiling.
pub const DEFAULT_STALE_AFTER_SECONDS: u64 = 180;

/// Default period of the orphaned-work sweep, in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 30;

/// Default end-to-end ceiling on one scratch run, compile included, in seconds
pub const DEFAULT_SCRATCH_WALL_CLOCK_SECONDS: u64 = 60;

/// Shown to users whose submission hit an infrastructure failure
pub const SYSTEM_ERROR_MESSAGE: &str = "system error, please resubmit";

/// Maximum source code size in bytes
pub const MAX_SOURCE_BYTES: u64 = 1_048_576;

/// Maximum custom input size for scratch runs in bytes
pub const MAX_SCRATCH_INPUT_BYTES: u64 = 1_048_576;

/// Output preview kept per test case, in bytes
pub const OUTPUT_PREVIEW_BYTES: usize = 1_024;

/// Captured stdout/stderr beyond this is dropped
pub const MAX_CAPTURED_OUTPUT_BYTES: usize = 8 * 1_048_576;

/// Hard memory cap of a sandbox container, above any per-problem limit
pub const SANDBOX_MEMORY_CEILING_BYTES: i64 = 1_073_741_824;

/// Process cap inside a sandbox container
pub const SANDBOX_PIDS_LIMIT: i64 = 64;

// =============================================================================
// SCRATCH (RUN-ONLY) LIMITS
// =============================================================================

/// CPU time ceiling for scratch runs, in milliseconds
pub const SCRATCH_TIME_LIMIT_MS: i32 = 10_000;

/// Memory ceiling for scratch runs, in kilobytes
pub const SCRATCH_MEMORY_LIMIT_KB: i32 = 262_144;

// =============================================================================
// QUEUE
// =============================================================================

/// Redis list holding submission ids waiting for a worker
pub const JUDGE_QUEUE_KEY: &str = "judge_queue";

/// Seconds a BRPOP waits before looping
pub const QUEUE_POLL_TIMEOUT_SECONDS: f64 = 5.0;

/// Maximum pending submissions re-queued per sweep
pub const RECOVERY_BATCH_SIZE: i64 = 1_000;

// =============================================================================
// SUPPORTED LANGUAGES
// =============================================================================

/// Language identifiers
pub mod languages {
    pub const PYTHON: &str = "python";
    pub const JAVASCRIPT: &str = "javascript";
    pub const CPP: &str = "cpp";
    pub const JAVA: &str = "java";
}

/// Container images for each language
pub mod container_images {
    pub const PYTHON: &str = "codejudge/python:latest";
    pub const JAVASCRIPT: &str = "codejudge/node:latest";
    pub const CPP: &str = "codejudge/cpp:latest";
    pub const JAVA: &str = "codejudge/java:latest";
}

// =============================================================================
// USER ROLES
// =============================================================================

pub mod roles {
    pub const ADMIN: &str = "admin";
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum page size
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// API VERSIONING
// =============================================================================

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";

/// Request bodies above this are rejected before deserialization; room for
/// the largest source plus the largest scratch input and JSON overhead
pub const MAX_REQUEST_BODY_BYTES: usize = 3 * 1_048_576;
