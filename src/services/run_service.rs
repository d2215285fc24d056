//! Scratch execution
//!
//! Runs code once against caller-supplied input under fixed limits. Nothing
//! is persisted and no verdict is computed.

use validator::Validate;

use crate::{
    constants::{SCRATCH_MEMORY_LIMIT_KB, SCRATCH_TIME_LIMIT_MS},
    error::{AppError, AppResult},
    handlers::submissions::{request::RunCodeRequest, response::RunResponse},
    models::Language,
    sandbox::{Prepared, ResourceLimits, RunOutput, SandboxPool},
};

pub struct RunService;

impl RunService {
    pub async fn run_code(pool: &SandboxPool, payload: RunCodeRequest) -> AppResult<RunResponse> {
        payload.validate()?;
        let language: Language = payload.language.parse()?;

        if payload.code.trim().is_empty() {
            return Err(AppError::Validation("Code cannot be empty".to_string()));
        }

        let _permit = pool.acquire_scratch().await?;

        let ceiling = pool.scratch_wall_clock();
        let input = payload.input.as_deref().unwrap_or_default();
        match tokio::time::timeout(ceiling, Self::execute(pool, language, &payload.code, input)).await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    language = %language,
                    ceiling_secs = ceiling.as_secs(),
                    "Scratch run exceeded the wall-clock ceiling"
                );
                Ok(RunResponse {
                    output: None,
                    error: Some(time_limit_message()),
                    execution_time: ceiling.as_millis() as i64,
                })
            }
        }
    }

    async fn execute(
        pool: &SandboxPool,
        language: Language,
        code: &str,
        input: &str,
    ) -> AppResult<RunResponse> {
        let program = match pool.prepare(language, code).await? {
            Prepared::Ready(program) => program,
            Prepared::CompileFailed(message) => {
                return Ok(RunResponse {
                    output: None,
                    error: Some(message),
                    execution_time: 0,
                });
            }
        };

        let limits = ResourceLimits::new(SCRATCH_TIME_LIMIT_MS, SCRATCH_MEMORY_LIMIT_KB);
        let result = program.run(input, limits).await;
        program.release().await;

        let output = result?;
        tracing::debug!(
            language = %language,
            exit_code = output.exit_code,
            time_ms = output.time_ms,
            "Scratch run finished"
        );

        Ok(scratch_response(output))
    }
}

fn time_limit_message() -> String {
    format!("Time Limit Exceeded ({}s)", SCRATCH_TIME_LIMIT_MS / 1000)
}

fn scratch_response(output: RunOutput) -> RunResponse {
    let error = if output.timed_out {
        Some(time_limit_message())
    } else if output.memory_exceeded {
        Some(format!(
            "Memory Limit Exceeded ({}MB)",
            SCRATCH_MEMORY_LIMIT_KB / 1024
        ))
    } else if output.exit_code != 0 {
        Some(if output.stderr.trim().is_empty() {
            format!("Process exited with code {}", output.exit_code)
        } else {
            output.stderr
        })
    } else {
        None
    };

    match error {
        Some(error) => RunResponse {
            output: None,
            error: Some(error),
            execution_time: output.time_ms,
        },
        None => RunResponse {
            output: Some(output.stdout),
            error: None,
            execution_time: output.time_ms,
        },
    }
}
