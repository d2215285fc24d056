//! Submission response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{CaseResult, Language, Submission, SubmissionStatus};

/// Returned by intake; judging continues asynchronously
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionResponse {
    pub id: Uuid,
    pub status: SubmissionStatus,
    pub message: String,
}

/// Submission response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contest_id: Option<Uuid>,
    pub language: Language,
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    /// Milliseconds of CPU time on the slowest test case
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<i64>,
    /// Peak memory in kilobytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests_passed: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests_total: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub test_case_results: Vec<CaseResult>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judged_at: Option<DateTime<Utc>>,
}

impl From<Submission> for SubmissionResponse {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            user_id: submission.user_id,
            problem_id: submission.problem_id,
            contest_id: submission.contest_id,
            language: submission.language,
            status: submission.status,
            score: submission.score,
            execution_time: submission.execution_time_ms,
            memory: submission.memory_usage_kb,
            tests_passed: submission.tests_passed,
            tests_total: submission.tests_total,
            error_message: submission.error_message,
            test_case_results: submission.case_results.0,
            created_at: submission.created_at,
            judged_at: submission.judged_at,
        }
    }
}

/// Submission list response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionsListResponse {
    pub submissions: Vec<SubmissionResponse>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

/// Scratch run result
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds of CPU time
    pub execution_time: i64,
}
