//! Shared harness: the full router over the in-memory store and queue, with a
//! scripted sandbox that understands a handful of one-line python programs.

#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use codejudge::{
    config::{JudgeConfig, JwtConfig},
    db::MemoryStore,
    handlers,
    judge::Dispatcher,
    models::{Contest, Language, Problem, TestCase},
    queue::{MemoryQueue, SubmissionQueue},
    sandbox::{Prepared, Program, ResourceLimits, RunOutput, Sandbox, SandboxError, SandboxPool},
    services::auth_service::Claims,
    state::AppState,
};

pub const JWT_SECRET: &str = "integration-test-secret";

/// Interprets `print(<expr>)` where expr is `a+b`, a quoted string, a bare
/// literal or `input()`. `while True` never finishes; `syntax error` fails to
/// compile.
#[derive(Default)]
pub struct ScriptedSandbox {
    prepares: AtomicUsize,
}

impl ScriptedSandbox {
    pub fn prepares(&self) -> usize {
        self.prepares.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sandbox for ScriptedSandbox {
    async fn prepare(&self, _language: Language, source: &str) -> Result<Prepared, SandboxError> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if source.contains("syntax error") {
            return Ok(Prepared::CompileFailed(
                "SyntaxError: invalid syntax".to_string(),
            ));
        }
        Ok(Prepared::Ready(Box::new(ScriptedProgram {
            source: source.trim().to_string(),
        })))
    }
}

struct ScriptedProgram {
    source: String,
}

#[async_trait]
impl Program for ScriptedProgram {
    async fn run(&self, stdin: &str, limits: ResourceLimits) -> Result<RunOutput, SandboxError> {
        if self.source.contains("while True") {
            return Ok(RunOutput {
                exit_code: 124,
                time_ms: limits.time_limit_ms + 1,
                timed_out: true,
                ..RunOutput::default()
            });
        }

        let expr = self
            .source
            .strip_prefix("print(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or_default();

        let stdout = if expr == "input()" {
            stdin.trim_end().to_string()
        } else if expr.starts_with('\'') {
            expr.trim_matches('\'').to_string()
        } else if let Some((a, b)) = expr.split_once('+') {
            let sum: i64 = a.trim().parse::<i64>().unwrap() + b.trim().parse::<i64>().unwrap();
            sum.to_string()
        } else {
            expr.to_string()
        };

        Ok(RunOutput {
            stdout: format!("{stdout}\n"),
            time_ms: 15,
            memory_kb: 9_000,
            ..RunOutput::default()
        })
    }

    async fn release(&self) {}
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub queue: Arc<MemoryQueue>,
    pub sandbox: Arc<ScriptedSandbox>,
    pub dispatcher: Arc<Dispatcher>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::with_poll_timeout(Duration::from_millis(10)));
        let sandbox = Arc::new(ScriptedSandbox::default());
        let config = JudgeConfig {
            workers: 2,
            scratch_slots: 1,
            start_backoff: Duration::from_millis(1),
            ..JudgeConfig::default()
        };
        let pool = SandboxPool::new(sandbox.clone(), &config);

        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            queue.clone(),
            pool.clone(),
            config,
        ));
        let state = AppState::new(
            store.clone(),
            queue.clone(),
            pool,
            JwtConfig {
                secret: JWT_SECRET.to_string(),
            },
        );

        Self {
            app: handlers::router(state),
            store,
            queue,
            sandbox,
            dispatcher,
        }
    }

    /// Judge everything queued so far, in order
    pub async fn drain(&self) {
        while let Some(id) = self.queue.pop().await.unwrap() {
            tokio_test::assert_ok!(self.dispatcher.judge(id).await);
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Seed a problem whose test cases are (input, expected, weight)
    pub async fn problem(&self, time_limit_ms: i32, cases: &[(&str, &str, i32)]) -> Uuid {
        let problem = Problem {
            id: Uuid::new_v4(),
            title: "Problem".to_string(),
            time_limit_ms,
            memory_limit_kb: 262_144,
            float_epsilon: None,
            created_at: Utc::now(),
        };
        let id = problem.id;
        let cases = cases
            .iter()
            .zip(0..)
            .map(|(&(input, expected, weight), position)| TestCase {
                id: Uuid::new_v4(),
                problem_id: id,
                input: input.to_string(),
                expected_output: expected.to_string(),
                weight,
                position,
            })
            .collect();
        self.store.add_problem(problem, cases).await;
        id
    }

    /// Seed a contest whose window is `[now + start, now + end)`
    pub async fn contest(&self, start: chrono::Duration, end: chrono::Duration, problems: &[Uuid]) -> Uuid {
        let now = Utc::now();
        let contest = Contest {
            id: Uuid::new_v4(),
            title: "Contest".to_string(),
            start_time: now + start,
            end_time: now + end,
            created_at: now,
        };
        let id = contest.id;
        self.store.add_contest(contest, problems).await;
        id
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

pub fn user(role: &str) -> TestUser {
    let id = Uuid::new_v4();
    let claims = Claims {
        sub: id.to_string(),
        username: format!("user-{}", &id.to_string()[..8]),
        role: role.to_string(),
        exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
        iat: Utc::now().timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    TestUser { id, token }
}

pub fn student() -> TestUser {
    user("student")
}
