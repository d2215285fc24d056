//! Docker-backed sandbox
//!
//! One container per prepared program: network disabled, memory and swap
//! capped, a single CPU, and a process limit. Programs run through
//! `/usr/bin/time -v` wrapped around `timeout`, so CPU time and peak RSS come
//! from the kernel's rusage rather than from wall-clock guesses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bollard::{
    Docker,
    container::LogOutput,
    exec::{CreateExecOptions, StartExecResults},
    models::{ContainerCreateBody, HostConfig},
    query_parameters::{CreateContainerOptionsBuilder, RemoveContainerOptionsBuilder},
};
use futures::StreamExt;
use uuid::Uuid;

use crate::{
    constants::{MAX_CAPTURED_OUTPUT_BYTES, SANDBOX_MEMORY_CEILING_BYTES, SANDBOX_PIDS_LIMIT},
    models::Language,
};

use super::{
    Prepared, Program, ResourceLimits, RunOutput, Sandbox, SandboxError,
    languages::{LanguageHandler, WORKSPACE},
};

/// Exit status GNU `timeout` reports when it had to stop the command
const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit status of a SIGKILLed process (cgroup OOM killer, or `timeout -k`)
const KILLED_EXIT_CODE: i32 = 137;

const TIME_REPORT: &str = "/workspace/.time";
const INPUT_FILE: &str = "/workspace/.input";

/// Raw bytes per staging exec; a multiple of 3 so chunks encode independently
const WRITE_CHUNK_BYTES: usize = 48 * 1024;

/// Sandbox that runs each program in a fresh Docker container
pub struct DockerSandbox {
    docker: Docker,
    compile_timeout: Duration,
}

impl DockerSandbox {
    pub fn new(docker: Docker, compile_timeout: Duration) -> Self {
        Self {
            docker,
            compile_timeout,
        }
    }

    /// Create and start a container for the language
    async fn create_container(&self, handler: &LanguageHandler) -> Result<String, SandboxError> {
        let container_name = format!("codejudge-{}", Uuid::new_v4());

        let options = CreateContainerOptionsBuilder::default()
            .name(&container_name)
            .build();

        let host_config = HostConfig {
            memory: Some(SANDBOX_MEMORY_CEILING_BYTES),
            memory_swap: Some(SANDBOX_MEMORY_CEILING_BYTES),
            cpu_period: Some(100_000),
            cpu_quota: Some(100_000),
            network_mode: Some("none".to_string()),
            pids_limit: Some(SANDBOX_PIDS_LIMIT),
            ..Default::default()
        };

        let config = ContainerCreateBody {
            image: Some(handler.image.to_string()),
            // Keep the container alive between execs
            cmd: Some(vec!["sleep".to_string(), "infinity".to_string()]),
            host_config: Some(host_config),
            working_dir: Some(WORKSPACE.to_string()),
            env: Some(vec!["LANG=C.UTF-8".to_string()]),
            labels: Some(HashMap::from([(
                "codejudge.language".to_string(),
                handler.language.to_string(),
            )])),
            ..Default::default()
        };

        let container = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| SandboxError::Start(e.to_string()))?;

        if let Err(e) = self
            .docker
            .start_container(
                &container.id,
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
        {
            remove_container(&self.docker, &container.id).await;
            return Err(SandboxError::Start(e.to_string()));
        }

        Ok(container.id)
    }
}

#[async_trait]
impl Sandbox for DockerSandbox {
    async fn prepare(&self, language: Language, source: &str) -> Result<Prepared, SandboxError> {
        let handler = LanguageHandler::for_language(language);
        let container_id = self.create_container(&handler).await?;
        tracing::debug!(container_id = %container_id, language = %language, "Sandbox container started");

        let program = DockerProgram {
            docker: self.docker.clone(),
            container_id,
            handler,
            released: AtomicBool::new(false),
        };

        if let Err(e) = program.stage(source).await {
            program.release().await;
            return Err(SandboxError::Start(e.to_string()));
        }

        let Some(compile_cmd) = program.handler.compile_command else {
            return Ok(Prepared::Ready(Box::new(program)));
        };

        let cmd = format!(
            "timeout -k 1 {}s {} 2>&1",
            self.compile_timeout.as_secs().max(1),
            compile_cmd
        );
        let result = match program.exec(&cmd).await {
            Ok(result) => result,
            Err(e) => {
                program.release().await;
                return Err(SandboxError::Start(e.to_string()));
            }
        };

        if result.exit_code == 0 {
            return Ok(Prepared::Ready(Box::new(program)));
        }

        program.release().await;
        let message = if result.exit_code == TIMEOUT_EXIT_CODE {
            "Compilation timed out".to_string()
        } else {
            format!("{}{}", result.stdout, result.stderr).trim().to_string()
        };
        Ok(Prepared::CompileFailed(message))
    }
}

/// Raw result of one exec
struct ExecResult {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

/// A staged (and compiled) program living in its own container
pub struct DockerProgram {
    docker: Docker,
    container_id: String,
    handler: LanguageHandler,
    released: AtomicBool,
}

impl DockerProgram {
    /// Write the source file into the workspace
    async fn stage(&self, source: &str) -> Result<(), bollard::errors::Error> {
        self.write_file(&self.handler.source_path(), source).await
    }

    /// Write a file to the container
    ///
    /// base64 keeps quotes and newlines intact through the shell. Content is
    /// appended in chunks since a single exec argument is capped at 128 KiB.
    async fn write_file(&self, path: &str, content: &str) -> Result<(), bollard::errors::Error> {
        self.exec(&format!(": > {}", path)).await?;

        for chunk in content.as_bytes().chunks(WRITE_CHUNK_BYTES) {
            let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, chunk);
            self.exec(&format!("echo '{}' | base64 -d >> {}", encoded, path))
                .await?;
        }
        Ok(())
    }

    /// Execute a shell command in the container
    async fn exec(&self, cmd: &str) -> Result<ExecResult, bollard::errors::Error> {
        let exec = self
            .docker
            .create_exec(
                &self.container_id,
                CreateExecOptions {
                    cmd: Some(vec!["/bin/sh", "-c", cmd]),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        let output = self.docker.start_exec(&exec.id, None).await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        if let StartExecResults::Attached { mut output, .. } = output {
            while let Some(msg) = output.next().await {
                match msg? {
                    LogOutput::StdOut { message } => append_capped(&mut stdout, &message),
                    LogOutput::StdErr { message } => append_capped(&mut stderr, &message),
                    _ => {}
                }
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;
        let exit_code = inspect.exit_code.unwrap_or(-1) as i32;

        Ok(ExecResult {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code,
        })
    }
}

#[async_trait]
impl Program for DockerProgram {
    async fn run(&self, stdin: &str, limits: ResourceLimits) -> Result<RunOutput, SandboxError> {
        let execution = |e: bollard::errors::Error| SandboxError::Execution(e.to_string());

        self.write_file(INPUT_FILE, stdin).await.map_err(execution)?;

        // CPU-bound programs hit the CPU limit first; the wall-clock bound only
        // catches programs that sleep or block.
        let wall_limit_ms = limits.time_limit_ms * 2 + 1_000;
        let cmd = format!(
            "cd {} && /usr/bin/time -v -o {} timeout -k 1 {:.3}s {} < {}",
            WORKSPACE,
            TIME_REPORT,
            wall_limit_ms as f64 / 1000.0,
            self.handler.run_command,
            INPUT_FILE
        );

        let start = Instant::now();
        let result = self.exec(&cmd).await.map_err(execution)?;
        let wall_time_ms = start.elapsed().as_millis() as i64;

        let report = self
            .exec(&format!("cat {} 2>/dev/null", TIME_REPORT))
            .await
            .map_err(execution)?
            .stdout;

        let cpu_time_ms = parse_cpu_time_ms(&report).unwrap_or(wall_time_ms);
        let memory_kb = parse_memory_kb(&report).unwrap_or(0);

        let timed_out = result.exit_code == TIMEOUT_EXIT_CODE
            || cpu_time_ms > limits.time_limit_ms
            || (result.exit_code == KILLED_EXIT_CODE && wall_time_ms >= wall_limit_ms);
        let memory_exceeded = !timed_out
            && (memory_kb > limits.memory_limit_kb || result.exit_code == KILLED_EXIT_CODE);

        Ok(RunOutput {
            stdout: result.stdout,
            stderr: result.stderr,
            exit_code: result.exit_code,
            time_ms: cpu_time_ms,
            memory_kb,
            timed_out,
            memory_exceeded,
        })
    }

    async fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        remove_container(&self.docker, &self.container_id).await;
    }
}

impl Drop for DockerProgram {
    fn drop(&mut self) {
        // A judging task cancelled by the wall-clock ceiling never reaches release()
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(container_id = %self.container_id, "Leaking sandbox container: no runtime");
            return;
        };
        let docker = self.docker.clone();
        let container_id = std::mem::take(&mut self.container_id);
        runtime.spawn(async move {
            remove_container(&docker, &container_id).await;
        });
    }
}

/// Force-remove a container, logging failures
async fn remove_container(docker: &Docker, container_id: &str) {
    let options = RemoveContainerOptionsBuilder::default().force(true).build();

    if let Err(e) = docker.remove_container(container_id, Some(options)).await {
        tracing::warn!(container_id = %container_id, error = %e, "Failed to remove sandbox container");
    }
}

fn append_capped(buffer: &mut Vec<u8>, chunk: &[u8]) {
    let room = MAX_CAPTURED_OUTPUT_BYTES.saturating_sub(buffer.len());
    buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);
}

/// Value after the colon of the first `/usr/bin/time -v` line containing `label`
fn report_field<'a>(report: &'a str, label: &str) -> Option<&'a str> {
    report
        .lines()
        .find(|line| line.contains(label))
        .and_then(|line| line.rsplit(':').next())
        .map(str::trim)
}

/// Parse peak RSS from /usr/bin/time -v output
fn parse_memory_kb(report: &str) -> Option<i64> {
    report_field(report, "Maximum resident set size")?.parse().ok()
}

/// Parse user + system CPU time from /usr/bin/time -v output
fn parse_cpu_time_ms(report: &str) -> Option<i64> {
    let user: f64 = report_field(report, "User time (seconds)")?.parse().ok()?;
    let sys: f64 = report_field(report, "System time (seconds)")?.parse().ok()?;
    Some(((user + sys) * 1000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\tCommand being timed: \"timeout -k 1 5.000s python3 /workspace/solution.py\"
\tUser time (seconds): 0.41
\tSystem time (seconds): 0.03
\tPercent of CPU this job got: 97%
\tElapsed (wall clock) time (h:mm:ss or m:ss): 0:00.45
\tMaximum resident set size (kbytes): 9876
\tExit status: 0
";

    #[test]
    fn test_parse_time_report() {
        assert_eq!(parse_cpu_time_ms(REPORT), Some(440));
        assert_eq!(parse_memory_kb(REPORT), Some(9876));
    }

    #[test]
    fn test_parse_missing_report() {
        assert_eq!(parse_cpu_time_ms(""), None);
        assert_eq!(parse_memory_kb("Command terminated by signal 9"), None);
    }

    #[test]
    fn test_append_capped_stops_at_limit() {
        let mut buffer = vec![0u8; MAX_CAPTURED_OUTPUT_BYTES - 2];
        append_capped(&mut buffer, b"abcdef");
        assert_eq!(buffer.len(), MAX_CAPTURED_OUTPUT_BYTES);
        assert_eq!(&buffer[buffer.len() - 2..], b"ab");
    }
}
