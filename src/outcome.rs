//! Test outcomes
//!
//! An [`Outcome`] is created once by the engine right after a variation finishes (or is short-circuited by a
//! class-level skip) and is immutable afterwards.
//!
//! | Kind | Category | Listener event | Code |
//! |------|----------|----------------|------|
//! | `Succeeded`, `ExpectationMet` | succeeded | `test_succeeded` | `.` |
//! | `Failed` | failed | `test_failed` | `F` |
//! | `Errored` | failed | `test_error` | `E` |
//! | `Warning` | failed | `test_warning` | `W` |
//! | `Skipped` | skipped | `test_skipped` | `S` |
//! | `NotRun` | skipped | `test_not_run` | `N` |

use std::fmt;
use std::time::Duration;

use verity_core::{AbortKind, Exception};

use crate::test::TestId;

/// Which result bucket an outcome lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Succeeded,
    Failed,
    Skipped,
}

/// Listener event an outcome is reported through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Succeeded,
    Failed,
    Error,
    Warning,
    Skipped,
    NotRun,
}

impl Event {
    pub fn as_str(self) -> &'static str {
        match self {
            Event::Succeeded => "succeeded",
            Event::Failed => "failed",
            Event::Error => "error",
            Event::Warning => "warning",
            Event::Skipped => "skipped",
            Event::NotRun => "not-run",
        }
    }
}

/// Kind-specific payload of an outcome.
#[derive(Debug, Clone)]
pub enum OutcomeKind {
    Succeeded,
    /// The expected exception was raised.
    ExpectationMet,
    /// Assertion failures, timeouts, expectation violations, failed prerequisites.
    Failed(Exception),
    /// Any other raised exception.
    Errored(Exception),
    /// Diagnostics raised during an otherwise successful run.
    Warning(Vec<String>),
    /// Prerequisites not met.
    Skipped(Exception),
    /// Ignored, with the reason.
    NotRun(String),
}

impl OutcomeKind {
    /// Map an aborted condition onto its own outcome. Non-aborted exceptions map to `Errored`.
    pub fn aborted(reason: Exception) -> Self {
        match reason.abort_kind() {
            Some(AbortKind::Ignored) => OutcomeKind::NotRun(reason.message().to_string()),
            Some(AbortKind::PrerequisitesNotMet) => OutcomeKind::Skipped(reason),
            Some(AbortKind::PrerequisitesFailed) => OutcomeKind::Failed(reason),
            None => OutcomeKind::Errored(reason),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            OutcomeKind::Succeeded | OutcomeKind::ExpectationMet => Category::Succeeded,
            OutcomeKind::Failed(_) | OutcomeKind::Errored(_) | OutcomeKind::Warning(_) => Category::Failed,
            OutcomeKind::Skipped(_) | OutcomeKind::NotRun(_) => Category::Skipped,
        }
    }

    pub fn event(&self) -> Event {
        match self {
            OutcomeKind::Succeeded | OutcomeKind::ExpectationMet => Event::Succeeded,
            OutcomeKind::Failed(_) => Event::Failed,
            OutcomeKind::Errored(_) => Event::Error,
            OutcomeKind::Warning(_) => Event::Warning,
            OutcomeKind::Skipped(_) => Event::Skipped,
            OutcomeKind::NotRun(_) => Event::NotRun,
        }
    }

    /// Single-letter code used by terse reporters.
    pub fn code(&self) -> char {
        match self.event() {
            Event::Succeeded => '.',
            Event::Failed => 'F',
            Event::Error => 'E',
            Event::Warning => 'W',
            Event::Skipped => 'S',
            Event::NotRun => 'N',
        }
    }

    /// The exception behind a failure, error or skip.
    pub fn reason(&self) -> Option<&Exception> {
        match self {
            OutcomeKind::Failed(e) | OutcomeKind::Errored(e) | OutcomeKind::Skipped(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, OutcomeKind::Warning(_))
    }
}

/// Classified result of one variation.
#[derive(Debug, Clone)]
pub struct Outcome {
    test: TestId,
    elapsed: Duration,
    kind: OutcomeKind,
}

impl Outcome {
    pub fn new(test: TestId, elapsed: Duration, kind: OutcomeKind) -> Self {
        Self { test, elapsed, kind }
    }

    pub fn succeeded(test: TestId, elapsed: Duration) -> Self {
        Self::new(test, elapsed, OutcomeKind::Succeeded)
    }

    pub fn failed(test: TestId, elapsed: Duration, reason: Exception) -> Self {
        Self::new(test, elapsed, OutcomeKind::Failed(reason))
    }

    pub fn skipped(test: TestId, elapsed: Duration, reason: Exception) -> Self {
        Self::new(test, elapsed, OutcomeKind::Skipped(reason))
    }

    pub fn test(&self) -> &TestId {
        &self.test
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn kind(&self) -> &OutcomeKind {
        &self.kind
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.event().as_str(), self.test)?;
        match &self.kind {
            OutcomeKind::NotRun(reason) => write!(f, ": {reason}"),
            OutcomeKind::Warning(messages) => write!(f, ": {}", messages.join("; ")),
            kind => match kind.reason() {
                Some(reason) => write!(f, ": {reason}"),
                None => Ok(()),
            },
        }
    }
}
