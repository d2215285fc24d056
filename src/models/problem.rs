//! Problem and test case models
//!
//! Problem CRUD belongs to another service; the judge only reads the limits
//! and the ordered test data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Problem database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Problem {
    pub id: Uuid,
    pub title: String,
    pub time_limit_ms: i32,
    pub memory_limit_kb: i32,
    /// When set, outputs are compared token-wise as floats within this tolerance
    pub float_epsilon: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Test case database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestCase {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub input: String,
    pub expected_output: String,
    /// Always >= 1; enforced by a CHECK constraint
    pub weight: i32,
    pub position: i32,
}

/// Sum of the weights of a problem's test cases
pub fn total_weight(cases: &[TestCase]) -> i32 {
    cases.iter().map(|case| case.weight).sum()
}
