//! Listener protocol
//!
//! Listeners observe a run through nine callbacks, all with no-op defaults. The runner broadcasts every
//! event to its listeners in registration order.
//!
//! Event order for one executed variation is always `test_started` followed by exactly one outcome event.

use std::cell::RefCell;
use std::rc::Rc;

use crate::outcome::{Event, Outcome};
use crate::result::TestResult;
use crate::test::TestId;

/// Observer of test execution.
pub trait Listener {
    /// Called once before any group of the run starts, with the number of units about to run.
    fn test_run_started(&mut self, _num_tests: usize) {}

    /// Called once after the last group of the run.
    fn test_run_finished(&mut self, _result: &TestResult) {}

    fn test_started(&mut self, _test: &TestId) {}

    fn test_succeeded(&mut self, _outcome: &Outcome) {}

    fn test_failed(&mut self, _outcome: &Outcome) {}

    fn test_error(&mut self, _outcome: &Outcome) {}

    fn test_warning(&mut self, _outcome: &Outcome) {}

    fn test_skipped(&mut self, _outcome: &Outcome) {}

    fn test_not_run(&mut self, _outcome: &Outcome) {}
}

impl<L: Listener + ?Sized> Listener for Box<L> {
    fn test_run_started(&mut self, num_tests: usize) {
        (**self).test_run_started(num_tests);
    }

    fn test_run_finished(&mut self, result: &TestResult) {
        (**self).test_run_finished(result);
    }

    fn test_started(&mut self, test: &TestId) {
        (**self).test_started(test);
    }

    fn test_succeeded(&mut self, outcome: &Outcome) {
        (**self).test_succeeded(outcome);
    }

    fn test_failed(&mut self, outcome: &Outcome) {
        (**self).test_failed(outcome);
    }

    fn test_error(&mut self, outcome: &Outcome) {
        (**self).test_error(outcome);
    }

    fn test_warning(&mut self, outcome: &Outcome) {
        (**self).test_warning(outcome);
    }

    fn test_skipped(&mut self, outcome: &Outcome) {
        (**self).test_skipped(outcome);
    }

    fn test_not_run(&mut self, outcome: &Outcome) {
        (**self).test_not_run(outcome);
    }
}

/// Shared listeners: the caller keeps a handle and inspects it after the run.
impl<L: Listener + ?Sized> Listener for Rc<RefCell<L>> {
    fn test_run_started(&mut self, num_tests: usize) {
        self.borrow_mut().test_run_started(num_tests);
    }

    fn test_run_finished(&mut self, result: &TestResult) {
        self.borrow_mut().test_run_finished(result);
    }

    fn test_started(&mut self, test: &TestId) {
        self.borrow_mut().test_started(test);
    }

    fn test_succeeded(&mut self, outcome: &Outcome) {
        self.borrow_mut().test_succeeded(outcome);
    }

    fn test_failed(&mut self, outcome: &Outcome) {
        self.borrow_mut().test_failed(outcome);
    }

    fn test_error(&mut self, outcome: &Outcome) {
        self.borrow_mut().test_error(outcome);
    }

    fn test_warning(&mut self, outcome: &Outcome) {
        self.borrow_mut().test_warning(outcome);
    }

    fn test_skipped(&mut self, outcome: &Outcome) {
        self.borrow_mut().test_skipped(outcome);
    }

    fn test_not_run(&mut self, outcome: &Outcome) {
        self.borrow_mut().test_not_run(outcome);
    }
}

/// Route `outcome` to the callback matching its kind.
pub(crate) fn dispatch(listener: &mut dyn Listener, outcome: &Outcome) {
    match outcome.kind().event() {
        Event::Succeeded => listener.test_succeeded(outcome),
        Event::Failed => listener.test_failed(outcome),
        Event::Error => listener.test_error(outcome),
        Event::Warning => listener.test_warning(outcome),
        Event::Skipped => listener.test_skipped(outcome),
        Event::NotRun => listener.test_not_run(outcome),
    }
}

/// Records every event as a string, e.g. `started:adds` or `failed:adds(1, 2)`.
///
/// Run events are recorded as `run-started:N` and `run-finished:N` where `N` is the test count.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Vec<String>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener shared with the caller, ready to hand to a runner.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    fn outcome(&mut self, outcome: &Outcome) {
        self.events
            .push(format!("{}:{}", outcome.kind().event().as_str(), outcome.test().name()));
    }
}

impl Listener for RecordingListener {
    fn test_run_started(&mut self, num_tests: usize) {
        self.events.push(format!("run-started:{num_tests}"));
    }

    fn test_run_finished(&mut self, result: &TestResult) {
        self.events.push(format!("run-finished:{}", result.count()));
    }

    fn test_started(&mut self, test: &TestId) {
        self.events.push(format!("started:{}", test.name()));
    }

    fn test_succeeded(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }

    fn test_failed(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }

    fn test_error(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }

    fn test_warning(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }

    fn test_skipped(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }

    fn test_not_run(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }
}
