#![forbid(unsafe_code)]
//! Verity: an xUnit-style test execution engine
//!
//! Test classes are described explicitly ([`group::TestClass`], [`group::TestMethod`]) instead of through
//! reflection, turned into [`group::TestGroup`]s, and executed by a [`Runner`] that reports every outcome to
//! its [`Listener`]s and aggregates them into a [`TestResult`].
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Test bodies**: panics raised by test bodies, hooks, actions, values providers and instance factories
//!   are caught and classified like returned exceptions, so `assert!` works inside tests. [`cli::run`]
//!   silences the default hook for these panics; library callers keep their own hook.

pub mod action;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod expect;
mod guard;
pub mod group;
pub mod listener;
pub mod metrics;
pub mod outcome;
pub mod result;
pub mod runner;
pub mod values;

pub use verity_core::{assert, compare, exception};
pub use verity_core::{AbortKind, Comparison, Exception, ExceptionType};

pub use action::{FnAction, TestAction};
pub use config::RunConfig;
pub use listener::{Listener, RecordingListener};
pub use outcome::{Outcome, OutcomeKind};
pub use result::TestResult;
pub use runner::Runner;
pub use test::{TestConfig, TestId, TestUnit};
pub use values::ValuesSpec;
