//! Provide the shared vocabulary of the verity test engine: exception types, comparison messages and
//! assertion helpers.
//!
//! This crate is intentionally small and dependency-light. It holds everything a *test body* needs to report
//! a result, without pulling in the engine, listeners or CLI.
//!
//! ## Notes
//!
//! - This is a "semantic core" crate: **no IO**, no global state.
//! - Test code signals outcomes by returning [`Exception`] values; the engine classifies them by
//!   [`ExceptionType`] (see [`exception`]).

pub mod assert;
pub mod compare;
pub mod exception;

pub use compare::Comparison;
pub use exception::{AbortKind, Exception, ExceptionType};
