//! Submission request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::constants::{MAX_SCRATCH_INPUT_BYTES, MAX_SOURCE_BYTES};

/// Create submission request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    /// Problem ID to submit for
    pub problem_id: Uuid,

    /// Contest ID (optional - for contest submissions)
    pub contest_id: Option<Uuid>,

    /// Programming language
    #[validate(length(min = 1, max = 20))]
    pub language: String,

    /// Source code
    #[serde(alias = "sourceCode")]
    #[validate(length(max = MAX_SOURCE_BYTES))]
    pub code: String,
}

/// Run code against custom input; nothing is stored
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RunCodeRequest {
    #[validate(length(min = 1, max = 20))]
    pub language: String,

    #[serde(alias = "sourceCode")]
    #[validate(length(max = MAX_SOURCE_BYTES))]
    pub code: String,

    #[validate(length(max = MAX_SCRATCH_INPUT_BYTES))]
    pub input: Option<String>,
}

/// `GET /submissions` query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubmissionsQuery {
    pub contest_id: Option<Uuid>,
    pub problem_id: Option<Uuid>,
    /// Honored for admins only
    pub user_id: Option<Uuid>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// `GET /submissions/my` query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMySubmissionsQuery {
    pub problem_id: Option<Uuid>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
