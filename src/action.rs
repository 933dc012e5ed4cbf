//! Test actions: around-advice for test units
//!
//! Actions attach to a test class (run for every unit) or to a single method. The effective list for a unit
//! is class actions followed by method actions. `before_test` runs in that order; `after_test` runs in the
//! **same** order, not reversed.
//!
//! `after_test` always runs once per executed variation. Its failures are chained rather than dropped: each
//! new failure becomes the propagated error, with the error propagating so far attached as its cause.

use std::fmt;
use std::rc::Rc;

use verity_core::Exception;

use crate::guard::guarded;
use crate::test::TestId;

/// Before/after hooks around each test unit, plus optional group-level hooks for class actions.
pub trait TestAction {
    /// Runs before the unit. Returning a prerequisites-not-met exception skips the unit.
    fn before_test(&self, _test: &TestId) -> Result<(), Exception> {
        Ok(())
    }

    /// Runs after the unit, whatever its outcome.
    fn after_test(&self, _test: &TestId) -> Result<(), Exception> {
        Ok(())
    }

    /// Runs once before a group's units, for actions attached at class level.
    fn before_group(&self, _group: &str) -> Result<(), Exception> {
        Ok(())
    }

    /// Runs once after a group's units, for actions attached at class level.
    fn after_group(&self, _group: &str) -> Result<(), Exception> {
        Ok(())
    }
}

type Hook = Box<dyn Fn(&TestId) -> Result<(), Exception>>;

/// An action built from closures.
///
/// ```rust
/// use verity::action::FnAction;
///
/// let action = FnAction::new().after(|test| {
///     tracing::debug!(test = %test, "cleaning up");
///     Ok(())
/// });
/// # let _ = action;
/// ```
#[derive(Default)]
pub struct FnAction {
    before: Option<Hook>,
    after: Option<Hook>,
}

impl FnAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TestId) -> Result<(), Exception> + 'static,
    {
        self.before = Some(Box::new(hook));
        self
    }

    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TestId) -> Result<(), Exception> + 'static,
    {
        self.after = Some(Box::new(hook));
        self
    }
}

impl TestAction for FnAction {
    fn before_test(&self, test: &TestId) -> Result<(), Exception> {
        self.before.as_ref().map_or(Ok(()), |hook| hook(test))
    }

    fn after_test(&self, test: &TestId) -> Result<(), Exception> {
        self.after.as_ref().map_or(Ok(()), |hook| hook(test))
    }
}

impl fmt::Debug for FnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

/// Run every action's `before_test` in order, stopping at the first failure.
pub(crate) fn run_before(actions: &[Rc<dyn TestAction>], test: &TestId) -> Result<(), Exception> {
    actions
        .iter()
        .try_for_each(|action| guarded(|| action.before_test(test)))
}

/// Run the teardown chain: every action's `after_test` in order, starting from `raised`.
///
/// Returns the error propagating at the end of the chain, most recent first.
pub(crate) fn run_after(actions: &[Rc<dyn TestAction>], test: &TestId, raised: Option<Exception>) -> Option<Exception> {
    actions
        .iter()
        .fold(raised, |current, action| match guarded(|| action.after_test(test)) {
            Ok(()) => current,
            Err(e) => Some(e.caused_by(current)),
        })
}
