//! Test execution engine
//!
//! The [`Runner`] executes groups sequentially: group `before`, then each unit, then group `after`. Each
//! unit is expanded into its variations (derived fresh on every run) and every variation goes through the
//! same steps:
//!
//! 1. `test_started`, clear diagnostics, start the clock;
//! 2. the actions' `before_test` in order, then the unit body (set_up, method, tear_down);
//! 3. the teardown chain: every action's `after_test`, in the same order, whatever happened in (2);
//! 4. classification into an [`Outcome`], which is recorded and reported to the listeners.
//!
//! ## Notes
//! - An aborted condition raised in (2) (ignored, prerequisites not met, prerequisites failed) short-circuits
//!   classification, even when the test expects an exception. It represents infrastructure state rather
//!   than test-body behaviour.
//! - Time limits are checked after the variation finished; nothing is interrupted.
//! - Listener panics are not caught.

use std::rc::Rc;
use std::time::{Duration, Instant};

use verity_core::Exception;
use verity_core::exception::TIMED_OUT;

use crate::action::{run_after, run_before};
use crate::config::RunConfig;
use crate::diagnostics::{Diagnostics, ThreadDiagnostics};
use crate::group::TestGroup;
use crate::guard::guarded;
use crate::listener::{Listener, dispatch};
use crate::metrics::Metric;
use crate::outcome::{Category, Outcome, OutcomeKind};
use crate::result::TestResult;
use crate::test::{ResolvedConfig, TestUnit, Variation};

/// Sequential test runner.
pub struct Runner {
    config: RunConfig,
    diagnostics: Rc<dyn Diagnostics>,
    listeners: Vec<Box<dyn Listener>>,
    metrics: Vec<(String, Rc<dyn Metric>)>,
    halted: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            config: RunConfig::default(),
            diagnostics: Rc::new(ThreadDiagnostics),
            listeners: Vec::new(),
            metrics: Vec::new(),
            halted: false,
        }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the diagnostics registry consulted for warnings.
    pub fn with_diagnostics(mut self, diagnostics: Rc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_listener(mut self, listener: impl Listener + 'static) -> Self {
        self.add_listener(listener);
        self
    }

    /// Register a listener; listeners are notified in registration order.
    pub fn add_listener(&mut self, listener: impl Listener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Register a metric on every result this runner produces.
    pub fn add_metric(&mut self, name: impl Into<String>, metric: Rc<dyn Metric>) {
        self.metrics.push((name.into(), metric));
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run one group.
    #[tracing::instrument(skip_all, fields(group = group.reflect()))]
    pub fn run(&mut self, group: &dyn TestGroup) -> TestResult {
        self.all(&[group])
    }

    /// Run several groups, in order, as one test run.
    #[tracing::instrument(skip_all, fields(groups = groups.len()))]
    pub fn all(&mut self, groups: &[&dyn TestGroup]) -> TestResult {
        let mut result = self.new_result();
        let total: usize = groups.iter().map(|group| group.num_tests()).sum();

        self.halted = false;
        self.broadcast(|listener| listener.test_run_started(total));
        for group in groups {
            if self.halted {
                break;
            }
            self.execute_group(*group, &mut result);
        }
        self.broadcast(|listener| listener.test_run_finished(&result));

        tracing::debug!(summary = %result, "test run finished");
        result
    }

    /// Run a single unit outside of any group.
    #[tracing::instrument(skip_all, fields(test = %unit.id()))]
    pub fn run_one(&mut self, unit: &TestUnit) -> TestResult {
        let mut result = self.new_result();
        self.halted = false;
        self.broadcast(|listener| listener.test_run_started(1));
        self.execute_unit(unit, &mut result);
        self.broadcast(|listener| listener.test_run_finished(&result));
        result
    }

    fn new_result(&self) -> TestResult {
        let mut result = TestResult::new();
        for (name, metric) in &self.metrics {
            result.add_metric(name.clone(), metric.clone());
        }
        result
    }

    fn broadcast(&mut self, mut event: impl FnMut(&mut dyn Listener)) {
        for listener in &mut self.listeners {
            event(listener.as_mut());
        }
    }

    fn execute_group(&mut self, group: &dyn TestGroup, result: &mut TestResult) {
        let _span = tracing::debug_span!("group", name = group.reflect()).entered();

        if let Err(reason) = guarded(|| group.before()) {
            tracing::debug!(group = group.reflect(), %reason, "group skipped");
            for unit in group.tests() {
                if !self.selects(&unit) {
                    continue;
                }
                self.broadcast(|listener| listener.test_started(unit.id()));
                self.record(
                    result,
                    Outcome::new(unit.id().clone(), Duration::ZERO, OutcomeKind::Skipped(reason.clone())),
                );
            }
            return;
        }

        for unit in group.tests() {
            if self.halted {
                break;
            }
            if self.selects(&unit) {
                self.execute_unit(&unit, result);
            }
        }

        if let Err(e) = guarded(|| group.after()) {
            tracing::warn!(group = group.reflect(), error = %e, "group teardown failed");
        }
    }

    fn selects(&self, unit: &TestUnit) -> bool {
        self.config.selects(&unit.id().to_string())
    }

    fn execute_unit(&mut self, unit: &TestUnit, result: &mut TestResult) {
        if let Some(reason) = unit.config().ignored() {
            self.broadcast(|listener| listener.test_started(unit.id()));
            self.record(
                result,
                Outcome::new(unit.id().clone(), Duration::ZERO, OutcomeKind::NotRun(reason.to_string())),
            );
            return;
        }

        let variations = match guarded(|| unit.variations()) {
            Ok(variations) => variations,
            Err(e) => {
                self.broadcast(|listener| listener.test_started(unit.id()));
                self.record(result, Outcome::new(unit.id().clone(), Duration::ZERO, OutcomeKind::Errored(e)));
                return;
            }
        };

        for variation in &variations {
            if self.halted {
                break;
            }
            let outcome = self.execute_variation(unit, variation);
            self.record(result, outcome);
        }
    }

    fn execute_variation(&mut self, unit: &TestUnit, variation: &Variation) -> Outcome {
        let test = variation.id();
        self.broadcast(|listener| listener.test_started(test));
        self.diagnostics.clear();
        let started = Instant::now();

        let raised = run_before(unit.actions(), test)
            .and_then(|()| guarded(|| unit.invoke(variation.args())))
            .err();
        let thrown = run_after(unit.actions(), test, raised.clone());

        let elapsed = started.elapsed();
        let warnings = self.diagnostics.raised();
        self.diagnostics.clear();

        let kind = match raised {
            Some(e) if e.is_aborted() => OutcomeKind::aborted(e),
            _ => classify(unit.config(), elapsed, thrown, warnings),
        };
        Outcome::new(test.clone(), elapsed, kind)
    }

    fn record(&mut self, result: &mut TestResult, outcome: Outcome) {
        tracing::debug!(
            test = %outcome.test(),
            outcome = outcome.kind().event().as_str(),
            elapsed_ms = outcome.elapsed().as_millis() as u64,
            "recorded outcome"
        );
        if self.config.stop_on_failure && failed(&outcome) {
            self.halted = true;
        }
        let outcome = result.record(outcome);
        for listener in &mut self.listeners {
            dispatch(listener.as_mut(), outcome);
        }
    }
}

/// Failures and errors stop a run in stop-on-failure mode; warnings do not.
fn failed(outcome: &Outcome) -> bool {
    outcome.kind().category() == Category::Failed && !outcome.kind().is_warning()
}

/// Classify a finished variation from its configuration, run time, propagated error and raised diagnostics.
pub fn classify(
    config: &ResolvedConfig,
    elapsed: Duration,
    thrown: Option<Exception>,
    warnings: Vec<String>,
) -> OutcomeKind {
    if let Some(limit) = config.time_limit().filter(|limit| elapsed > *limit) {
        let timeout = Exception::new(
            &TIMED_OUT,
            format!(
                "Test runtime of {:.3} seconds longer than eta of {:.3} seconds",
                elapsed.as_secs_f64(),
                limit.as_secs_f64()
            ),
        );
        return OutcomeKind::Failed(timeout.caused_by(thrown));
    }

    match (thrown, config.expectation()) {
        (Some(thrown), Some(expected)) => {
            if !expected.matches_type(&thrown) {
                let message = format!(
                    "Caught {} instead of expected {}",
                    thrown.kind().name(),
                    expected.kind().name()
                );
                OutcomeKind::Failed(Exception::assertion_failed(message).with_cause(thrown))
            } else if !expected.matches_message(&thrown) {
                let pattern = expected.message().map(ToString::to_string).unwrap_or_default();
                OutcomeKind::Failed(Exception::assertion_failed(format!(
                    "Expected {}'s message \"{}\" differs from expected {}",
                    thrown.kind().name(),
                    thrown.message(),
                    pattern
                )))
            } else if !warnings.is_empty() {
                OutcomeKind::Warning(warnings)
            } else {
                OutcomeKind::ExpectationMet
            }
        }
        (Some(thrown), None) if thrown.is_aborted() => OutcomeKind::aborted(thrown),
        (Some(thrown), None) if thrown.is_assertion() => OutcomeKind::Failed(thrown),
        (Some(thrown), None) => OutcomeKind::Errored(thrown),
        (None, Some(expected)) => OutcomeKind::Failed(Exception::assertion_failed(format!(
            "Expected {} not caught",
            expected.kind().name()
        ))),
        (None, None) if !warnings.is_empty() => OutcomeKind::Warning(warnings),
        (None, None) => OutcomeKind::Succeeded,
    }
}
