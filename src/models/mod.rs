//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod contest;
pub mod problem;
pub mod submission;

pub use contest::*;
pub use problem::*;
pub use submission::*;

/// A string column or request field that names no known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
