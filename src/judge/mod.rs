//! Judging pipeline: dispatch, sandboxed execution, and verdicts

pub mod compare;
pub mod dispatcher;
pub mod evaluator;

pub use dispatcher::Dispatcher;
pub use evaluator::{Evaluator, Flow};
