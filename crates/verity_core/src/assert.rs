//! Assertion helpers for test bodies.
//!
//! Every helper returns `Result<_, Exception>` so a body can chain them with `?`:
//!
//! ```rust
//! use verity_core::assert::{assert_equals, assert_true};
//! use verity_core::exception::Exception;
//!
//! fn adds() -> Result<(), Exception> {
//!     assert_equals(4, 2 + 2)?;
//!     assert_true(4 > 2)
//! }
//! assert!(adds().is_ok());
//! ```

use std::fmt::Debug;

use crate::compare::Comparison;
use crate::exception::{Exception, ExceptionType};

/// Assert that `actual` equals `expected`.
///
/// The failure carries a [`Comparison`] of both `Debug` renderings.
pub fn assert_equals<T: PartialEq + Debug>(expected: T, actual: T) -> Result<(), Exception> {
    if expected == actual {
        Ok(())
    } else {
        Err(Exception::comparison_failed(Comparison::new(
            format!("{expected:?}"),
            format!("{actual:?}"),
        )))
    }
}

/// Assert that `actual` differs from `unexpected`.
pub fn assert_not_equals<T: PartialEq + Debug>(unexpected: T, actual: T) -> Result<(), Exception> {
    if unexpected != actual {
        Ok(())
    } else {
        Err(Exception::assertion_failed(format!(
            "expected [{actual:?}] to differ from [{unexpected:?}]"
        )))
    }
}

pub fn assert_true(condition: bool) -> Result<(), Exception> {
    assert_equals(true, condition)
}

pub fn assert_false(condition: bool) -> Result<(), Exception> {
    assert_equals(false, condition)
}

/// Assert that `value` is `None`.
pub fn assert_none<T: Debug>(value: Option<T>) -> Result<(), Exception> {
    match value {
        None => Ok(()),
        Some(v) => Err(Exception::comparison_failed(Comparison::new("None", format!("Some({v:?})")))),
    }
}

/// Assert that `value` is `Some`, returning the contained value.
pub fn assert_some<T>(value: Option<T>) -> Result<T, Exception> {
    value.ok_or_else(|| Exception::comparison_failed(Comparison::new("Some(_)", "None")))
}

/// Assert that `exception` is an instance of `ty` (subtypes match).
pub fn assert_instance_of(ty: &ExceptionType, exception: &Exception) -> Result<(), Exception> {
    if exception.is_instance_of(ty) {
        Ok(())
    } else {
        Err(Exception::comparison_failed(Comparison::new(
            ty.name(),
            exception.kind().name(),
        )))
    }
}

/// Fail unconditionally.
pub fn fail<T>(message: impl Into<String>) -> Result<T, Exception> {
    Err(Exception::assertion_failed(message))
}

/// Skip the running test because a prerequisite is missing.
pub fn skip<T>(reason: impl Into<String>) -> Result<T, Exception> {
    Err(Exception::prerequisites_not_met(reason))
}

/// Mark the running test as not run.
pub fn ignore<T>(reason: impl Into<String>) -> Result<T, Exception> {
    Err(Exception::ignored(reason))
}
