//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_COMPILE_TIMEOUT_SECONDS, DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_JUDGE_WORKERS,
    DEFAULT_SCRATCH_SLOTS, DEFAULT_SCRATCH_WALL_CLOCK_SECONDS, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, DEFAULT_STALE_AFTER_SECONDS, DEFAULT_START_BACKOFF_MS,
    DEFAULT_START_RETRIES, DEFAULT_SWEEP_INTERVAL_SECONDS, DEFAULT_WALL_CLOCK_SECONDS,
};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub docker: DockerConfig,
    pub judge: JudgeConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Bearer token verification; tokens are issued elsewhere
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

/// Docker configuration for sandbox containers
#[derive(Debug, Clone)]
pub struct DockerConfig {
    pub socket_path: String,
}

/// Judge worker pool configuration
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Concurrent sandbox executions
    pub workers: usize,
    /// How many of `workers` the run-only path may hold at once
    pub scratch_slots: usize,
    /// Ceiling on judging one submission end to end
    pub wall_clock: Duration,
    /// Ceiling on one scratch run end to end
    pub scratch_wall_clock: Duration,
    /// Attempts to start a sandbox before the submission becomes a system error
    pub start_retries: u32,
    pub start_backoff: Duration,
    pub compile_timeout: Duration,
    /// A `judging` claim older than this has lost its worker
    pub stale_after: Duration,
    pub sweep_interval: Duration,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_JUDGE_WORKERS,
            scratch_slots: DEFAULT_SCRATCH_SLOTS,
            wall_clock: Duration::from_secs(DEFAULT_WALL_CLOCK_SECONDS),
            scratch_wall_clock: Duration::from_secs(DEFAULT_SCRATCH_WALL_CLOCK_SECONDS),
            start_retries: DEFAULT_START_RETRIES,
            start_backoff: Duration::from_millis(DEFAULT_START_BACKOFF_MS),
            compile_timeout: Duration::from_secs(DEFAULT_COMPILE_TIMEOUT_SECONDS),
            stale_after: Duration::from_secs(DEFAULT_STALE_AFTER_SECONDS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECONDS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            docker: DockerConfig::from_env()?,
            judge: JudgeConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") | Err(_) => LogFormat::Pretty,
            Ok(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
        };

        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: parsed("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format,
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: required("DATABASE_URL")?,
            max_connections: parsed("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS)?,
        })
    }
}

impl RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        })
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: required("JWT_SECRET")?,
        })
    }
}

impl DockerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            socket_path: env::var("DOCKER_SOCKET")
                .unwrap_or_else(|_| "/var/run/docker.sock".to_string()),
        })
    }
}

impl JudgeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            workers: parsed("JUDGE_WORKERS", DEFAULT_JUDGE_WORKERS)?,
            scratch_slots: parsed("JUDGE_SCRATCH_SLOTS", DEFAULT_SCRATCH_SLOTS)?,
            wall_clock: Duration::from_secs(parsed(
                "JUDGE_WALL_CLOCK_SECS",
                DEFAULT_WALL_CLOCK_SECONDS,
            )?),
            scratch_wall_clock: Duration::from_secs(parsed(
                "JUDGE_SCRATCH_WALL_CLOCK_SECS",
                DEFAULT_SCRATCH_WALL_CLOCK_SECONDS,
            )?),
            start_retries: parsed("JUDGE_START_RETRIES", DEFAULT_START_RETRIES)?,
            start_backoff: Duration::from_millis(parsed(
                "JUDGE_START_BACKOFF_MS",
                DEFAULT_START_BACKOFF_MS,
            )?),
            compile_timeout: Duration::from_secs(parsed(
                "JUDGE_COMPILE_TIMEOUT_SECS",
                DEFAULT_COMPILE_TIMEOUT_SECONDS,
            )?),
            stale_after: Duration::from_secs(parsed(
                "JUDGE_STALE_AFTER_SECS",
                DEFAULT_STALE_AFTER_SECONDS,
            )?),
            sweep_interval: Duration::from_secs(parsed(
                "JUDGE_SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_INTERVAL_SECONDS,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject pool shapes that could stall graded judging.
    ///
    /// Scratch runs always leave at least one pool slot to graded work, so the
    /// pool needs two or more workers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers < 2 {
            return Err(ConfigError::InvalidValue("JUDGE_WORKERS".to_string()));
        }
        if self.scratch_slots == 0 || self.scratch_slots >= self.workers {
            return Err(ConfigError::InvalidValue("JUDGE_SCRATCH_SLOTS".to_string()));
        }
        if self.start_retries == 0 {
            return Err(ConfigError::InvalidValue("JUDGE_START_RETRIES".to_string()));
        }
        if self.wall_clock.is_zero() {
            return Err(ConfigError::InvalidValue("JUDGE_WALL_CLOCK_SECS".to_string()));
        }
        if self.scratch_wall_clock.is_zero() {
            return Err(ConfigError::InvalidValue(
                "JUDGE_SCRATCH_WALL_CLOCK_SECS".to_string(),
            ));
        }
        if self.stale_after <= self.wall_clock {
            return Err(ConfigError::InvalidValue("JUDGE_STALE_AFTER_SECS".to_string()));
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue("JUDGE_SWEEP_INTERVAL_SECS".to_string()));
        }
        Ok(())
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
