//! Exception taxonomy for test bodies, hooks and actions.
//!
//! Test code reports failure by returning an [`Exception`] value. Every exception carries a static
//! [`ExceptionType`] descriptor; descriptors form a single-inheritance tree so that an expected-exception
//! contract naming a supertype also matches its subtypes.
//!
//! ## Notes
//!
//! - Descriptors are compared by address. Declare your own as `static`, never `const`:
//!
//! ```rust
//! use verity_core::exception::{Exception, ExceptionType, ILLEGAL_ARGUMENT};
//!
//! static NEGATIVE_AMOUNT: ExceptionType = ExceptionType::new("NegativeAmount", Some(&ILLEGAL_ARGUMENT));
//!
//! let e = Exception::new(&NEGATIVE_AMOUNT, "amount must be positive");
//! assert!(e.is_instance_of(&ILLEGAL_ARGUMENT));
//! ```
//!
//! - Causes are an explicit linked chain (`cause`), not a language-level field, so teardown failures can be
//!   stacked most-recent-first deterministically.

use std::fmt;
use std::ptr;

use crate::compare::Comparison;

/// Describe one node of the exception type hierarchy.
#[derive(Debug)]
pub struct ExceptionType {
    name: &'static str,
    parent: Option<&'static ExceptionType>,
}

impl ExceptionType {
    /// Create a descriptor. Use in a `static` item.
    pub const fn new(name: &'static str, parent: Option<&'static ExceptionType>) -> Self {
        Self { name, parent }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static ExceptionType> {
        self.parent
    }

    /// Check whether `self` is `other` or one of its descendants.
    pub fn is_subtype_of(&self, other: &ExceptionType) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ptr::eq(ty, other) {
                return true;
            }
            current = ty.parent;
        }
        false
    }
}

impl PartialEq for ExceptionType {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for ExceptionType {}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ============================================================================
// Builtin hierarchy
// ============================================================================

/// Root of every exception type.
pub static EXCEPTION: ExceptionType = ExceptionType::new("Exception", None);
pub static ILLEGAL_ARGUMENT: ExceptionType = ExceptionType::new("IllegalArgumentException", Some(&EXCEPTION));
pub static ILLEGAL_STATE: ExceptionType = ExceptionType::new("IllegalStateException", Some(&EXCEPTION));
pub static FORMAT: ExceptionType = ExceptionType::new("FormatException", Some(&EXCEPTION));
/// A panic caught while running test code.
pub static RUST_PANIC: ExceptionType = ExceptionType::new("RustPanic", Some(&EXCEPTION));

/// Raised by the assertion surface.
pub static ASSERTION_FAILED: ExceptionType = ExceptionType::new("AssertionFailedError", Some(&EXCEPTION));
/// Synthetic reason for a test that exceeded its time limit.
pub static TIMED_OUT: ExceptionType = ExceptionType::new("TimedOut", Some(&ASSERTION_FAILED));
/// A panic whose message starts with `assertion` (`assert!`, `assert_eq!`, ...).
pub static PANICKED_ASSERTION: ExceptionType = ExceptionType::new("PanickedAssertion", Some(&ASSERTION_FAILED));

/// Infrastructure-level conditions that short-circuit outcome classification.
pub static TEST_ABORTED: ExceptionType = ExceptionType::new("TestAborted", Some(&EXCEPTION));
pub static IGNORED: ExceptionType = ExceptionType::new("IgnoredBecause", Some(&TEST_ABORTED));
pub static PREREQUISITES_NOT_MET: ExceptionType =
    ExceptionType::new("PrerequisitesNotMetError", Some(&TEST_ABORTED));
pub static PREREQUISITES_FAILED: ExceptionType =
    ExceptionType::new("PrerequisitesFailedError", Some(&TEST_ABORTED));

/// Which aborted condition an exception represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortKind {
    /// The test was ignored; maps to a not-run outcome.
    Ignored,
    /// Prerequisites were not met; maps to a skipped outcome.
    PrerequisitesNotMet,
    /// Prerequisites failed; maps to a failed outcome.
    PrerequisitesFailed,
}

// ============================================================================
// Exception value
// ============================================================================

/// A raised condition: type, message, optional comparison payload and an optional cause.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct Exception {
    kind: &'static ExceptionType,
    message: String,
    comparison: Option<Comparison>,
    #[source]
    cause: Option<Box<Exception>>,
}

impl Exception {
    pub fn new(kind: &'static ExceptionType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            comparison: None,
            cause: None,
        }
    }

    /// Generic `Exception`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(&EXCEPTION, message)
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(&ILLEGAL_ARGUMENT, message)
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::new(&ILLEGAL_STATE, message)
    }

    pub fn assertion_failed(message: impl Into<String>) -> Self {
        Self::new(&ASSERTION_FAILED, message)
    }

    /// An assertion failure carrying an expected/actual comparison.
    pub fn comparison_failed(comparison: Comparison) -> Self {
        Self {
            kind: &ASSERTION_FAILED,
            message: comparison.to_string(),
            comparison: Some(comparison),
            cause: None,
        }
    }

    pub fn ignored(reason: impl Into<String>) -> Self {
        Self::new(&IGNORED, reason)
    }

    pub fn prerequisites_not_met(reason: impl Into<String>) -> Self {
        Self::new(&PREREQUISITES_NOT_MET, reason)
    }

    pub fn prerequisites_failed(reason: impl Into<String>) -> Self {
        Self::new(&PREREQUISITES_FAILED, reason)
    }

    /// Translate a caught panic payload.
    ///
    /// `&str` and `String` payloads keep their text; anything else becomes `"Box<dyn Any>"`, matching the
    /// standard panic hook. Messages starting with `assertion` become [`PANICKED_ASSERTION`].
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };
        let kind = if message.starts_with("assertion") {
            &PANICKED_ASSERTION
        } else {
            &RUST_PANIC
        };
        Self::new(kind, message)
    }

    /// Attach `cause` at the end of this exception's cause chain.
    pub fn with_cause(mut self, cause: Exception) -> Self {
        match self.cause.take() {
            None => self.cause = Some(Box::new(cause)),
            Some(existing) => self.cause = Some(Box::new((*existing).with_cause(cause))),
        }
        self
    }

    /// Like [`with_cause`](Self::with_cause), tolerating an absent cause.
    pub fn caused_by(self, cause: Option<Exception>) -> Self {
        match cause {
            Some(cause) => self.with_cause(cause),
            None => self,
        }
    }

    pub fn kind(&self) -> &'static ExceptionType {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn comparison(&self) -> Option<&Comparison> {
        self.comparison.as_ref()
    }

    pub fn cause(&self) -> Option<&Exception> {
        self.cause.as_deref()
    }

    /// Iterate this exception followed by its causes, most recent first.
    pub fn chain(&self) -> impl Iterator<Item = &Exception> {
        std::iter::successors(Some(self), |e| e.cause())
    }

    pub fn is_instance_of(&self, ty: &ExceptionType) -> bool {
        self.kind.is_subtype_of(ty)
    }

    pub fn is_assertion(&self) -> bool {
        self.is_instance_of(&ASSERTION_FAILED)
    }

    pub fn is_aborted(&self) -> bool {
        self.abort_kind().is_some()
    }

    /// Classify an aborted condition. Unknown `TestAborted` subtypes are treated as not-met prerequisites.
    pub fn abort_kind(&self) -> Option<AbortKind> {
        if !self.is_instance_of(&TEST_ABORTED) {
            None
        } else if self.is_instance_of(&IGNORED) {
            Some(AbortKind::Ignored)
        } else if self.is_instance_of(&PREREQUISITES_FAILED) {
            Some(AbortKind::PrerequisitesFailed)
        } else {
            Some(AbortKind::PrerequisitesNotMet)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static CUSTOM: ExceptionType = ExceptionType::new("CustomArgument", Some(&ILLEGAL_ARGUMENT));

    #[test]
    fn test_subtype_is_instance_of_parent() {
        let e = Exception::new(&CUSTOM, "nope");
        assert!(e.is_instance_of(&CUSTOM));
        assert!(e.is_instance_of(&ILLEGAL_ARGUMENT));
        assert!(e.is_instance_of(&EXCEPTION));
        assert!(!e.is_instance_of(&ILLEGAL_STATE));
    }

    #[test]
    fn test_parent_is_not_instance_of_child() {
        let e = Exception::illegal_argument("nope");
        assert!(!e.is_instance_of(&CUSTOM));
    }

    #[test]
    fn test_abort_kinds() {
        assert_eq!(Exception::ignored("WIP").abort_kind(), Some(AbortKind::Ignored));
        assert_eq!(
            Exception::prerequisites_not_met("no db").abort_kind(),
            Some(AbortKind::PrerequisitesNotMet)
        );
        assert_eq!(
            Exception::prerequisites_failed("db broke").abort_kind(),
            Some(AbortKind::PrerequisitesFailed)
        );
        assert_eq!(Exception::error("boom").abort_kind(), None);
    }

    #[test]
    fn test_with_cause_appends_to_end_of_chain() {
        let e = Exception::error("third")
            .with_cause(Exception::error("second"))
            .with_cause(Exception::error("first"));
        let messages: Vec<&str> = e.chain().map(Exception::message).collect();
        assert_eq!(messages, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_caused_by_none_keeps_exception() {
        let e = Exception::error("alone").caused_by(None);
        assert!(e.cause().is_none());
    }

    #[test]
    fn test_source_is_cause() {
        use std::error::Error;

        let e = Exception::error("outer").with_cause(Exception::error("inner"));
        assert_eq!(e.source().map(|s| s.to_string()), Some("inner".to_string()));
    }

    #[test]
    fn test_from_panic_assertion_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("assertion failed: x == y".to_string());
        let e = Exception::from_panic(payload.as_ref());
        assert!(e.is_assertion());
        assert_eq!(e.message(), "assertion failed: x == y");
    }

    #[test]
    fn test_from_panic_plain_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("index out of bounds");
        let e = Exception::from_panic(payload.as_ref());
        assert!(e.is_instance_of(&RUST_PANIC));
        assert!(!e.is_assertion());
    }
}
