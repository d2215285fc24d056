//! Submission model

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::constants::languages;

use super::UnknownVariant;

/// Submission database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub contest_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub language: Language,
    #[serde(skip_serializing)]
    pub source_code: String,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub score: Option<i32>,
    pub execution_time_ms: Option<i64>,
    pub memory_usage_kb: Option<i64>,
    pub tests_passed: Option<i32>,
    pub tests_total: Option<i32>,
    pub error_message: Option<String>,
    pub case_results: Json<Vec<CaseResult>>,
    pub created_at: DateTime<Utc>,
    /// Set when a worker takes the submission into `judging`
    #[serde(skip_serializing)]
    pub claimed_at: Option<DateTime<Utc>>,
    pub judged_at: Option<DateTime<Utc>>,
}

/// Fields supplied by intake when a submission is created
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub contest_id: Option<Uuid>,
    pub language: Language,
    pub source_code: String,
}

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
    Cpp,
    Java,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Python,
        Language::Javascript,
        Language::Cpp,
        Language::Java,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => languages::PYTHON,
            Self::Javascript => languages::JAVASCRIPT,
            Self::Cpp => languages::CPP,
            Self::Java => languages::JAVA,
        }
    }
}

impl FromStr for Language {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("language", s))
    }
}

impl TryFrom<String> for Language {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission lifecycle state.
///
/// `Pending` and `Judging` are transient; everything else is terminal. `SystemError`
/// is not a verdict: it marks a platform failure and tells the user to resubmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Judging,
    Accepted,
    WrongAnswer,
    TimeLimit,
    MemoryLimit,
    RuntimeError,
    CompileError,
    SystemError,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 9] = [
        Self::Pending,
        Self::Judging,
        Self::Accepted,
        Self::WrongAnswer,
        Self::TimeLimit,
        Self::MemoryLimit,
        Self::RuntimeError,
        Self::CompileError,
        Self::SystemError,
    ];

    /// Get status as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Judging => "judging",
            Self::Accepted => "accepted",
            Self::WrongAnswer => "wrong_answer",
            Self::TimeLimit => "time_limit",
            Self::MemoryLimit => "memory_limit",
            Self::RuntimeError => "runtime_error",
            Self::CompileError => "compile_error",
            Self::SystemError => "system_error",
        }
    }

    /// Check if judging is complete
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Judging)
    }

    /// Terminal statuses that classify the user's program
    pub fn is_verdict(&self) -> bool {
        self.is_terminal() && *self != Self::SystemError
    }

    /// Whether a finished submission in this state carries a score
    pub fn carries_score(&self) -> bool {
        self.is_verdict() && *self != Self::CompileError
    }

    /// Forward-only transition table
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        match self {
            Self::Pending => matches!(
                next,
                Self::Judging | Self::CompileError | Self::SystemError
            ),
            Self::Judging => next.is_terminal(),
            _ => false,
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubmissionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("status", s))
    }
}

impl TryFrom<String> for SubmissionStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    WrongAnswer,
    TimeLimit,
    MemoryLimit,
    RuntimeError,
}

/// Per test case result stored alongside the submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResult {
    pub test_case_id: Uuid,
    pub status: CaseStatus,
    pub weight: i32,
    pub time_ms: i64,
    pub memory_kb: i64,
    pub output_preview: Option<String>,
}

/// Final state written when judging finishes
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeOutcome {
    pub status: SubmissionStatus,
    pub score: Option<i32>,
    pub execution_time_ms: Option<i64>,
    pub memory_usage_kb: Option<i64>,
    pub tests_passed: Option<i32>,
    pub tests_total: Option<i32>,
    pub error_message: Option<String>,
    pub case_results: Vec<CaseResult>,
}

impl JudgeOutcome {
    pub fn compile_error(message: impl Into<String>, tests_total: i32) -> Self {
        Self {
            status: SubmissionStatus::CompileError,
            score: None,
            execution_time_ms: None,
            memory_usage_kb: None,
            tests_passed: Some(0),
            tests_total: Some(tests_total),
            error_message: Some(message.into()),
            case_results: Vec::new(),
        }
    }

    pub fn system_error(message: impl Into<String>) -> Self {
        Self {
            status: SubmissionStatus::SystemError,
            score: None,
            execution_time_ms: None,
            memory_usage_kb: None,
            tests_passed: None,
            tests_total: None,
            error_message: Some(message.into()),
            case_results: Vec::new(),
        }
    }

    /// Forced verdict when the dispatcher's wall-clock ceiling elapses
    pub fn wall_clock_exceeded(elapsed_ms: i64) -> Self {
        Self {
            status: SubmissionStatus::TimeLimit,
            score: Some(0),
            execution_time_ms: Some(elapsed_ms),
            memory_usage_kb: None,
            tests_passed: None,
            tests_total: None,
            error_message: Some("Time Limit Exceeded (judge wall-clock ceiling)".to_string()),
            case_results: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in SubmissionStatus::ALL {
            assert_eq!(status.as_str().parse::<SubmissionStatus>().unwrap(), status);
        }
        assert!("compilation_error".parse::<SubmissionStatus>().is_err());
    }

    #[test]
    fn test_transitions_are_forward_only() {
        use SubmissionStatus::*;

        assert!(Pending.can_transition_to(Judging));
        assert!(Pending.can_transition_to(CompileError));
        assert!(!Pending.can_transition_to(Accepted));
        assert!(Judging.can_transition_to(Accepted));
        assert!(Judging.can_transition_to(SystemError));
        assert!(!Judging.can_transition_to(Pending));
        assert!(!Accepted.can_transition_to(WrongAnswer));
        assert!(!CompileError.can_transition_to(Judging));
    }

    #[test]
    fn test_score_is_carried_by_graded_verdicts_only() {
        assert!(SubmissionStatus::WrongAnswer.carries_score());
        assert!(SubmissionStatus::TimeLimit.carries_score());
        assert!(!SubmissionStatus::CompileError.carries_score());
        assert!(!SubmissionStatus::SystemError.carries_score());
        assert!(!SubmissionStatus::Judging.carries_score());
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("cpp".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!(Language::Javascript.to_string(), "javascript");
        assert!("rust".parse::<Language>().is_err());
        assert!("Python".parse::<Language>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&SubmissionStatus::TimeLimit).unwrap();
        assert_eq!(json, "\"time_limit\"");
    }
}
