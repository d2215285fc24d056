//! Business logic services

pub mod auth_service;
pub mod contest_service;
pub mod run_service;
pub mod submission_service;

pub use auth_service::AuthService;
pub use contest_service::ContestService;
pub use run_service::RunService;
pub use submission_service::SubmissionService;

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Resolve `page`/`limit` query values into (page, limit, offset)
pub fn paginate(page: Option<u32>, limit: Option<u32>) -> (u32, u32, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = i64::from(page - 1) * i64::from(limit);
    (page, limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        assert_eq!(paginate(None, None), (1, 20, 0));
        assert_eq!(paginate(Some(3), Some(10)), (3, 10, 20));
        assert_eq!(paginate(Some(0), Some(1_000)), (1, 100, 0));
    }
}
