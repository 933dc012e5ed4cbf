//! Result aggregation.
//!
//! [`TestResult`] keeps three insertion-ordered buckets (succeeded, failed, skipped) keyed by [`TestHash`].
//! A hash lives in at most one bucket: recording an outcome for a known hash replaces the earlier one and
//! moves it to the bucket of the new outcome. Warnings and errors count as failures.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use indexmap::IndexMap;

use crate::metrics::Metric;
use crate::outcome::{Category, Outcome};
use crate::test::{TestHash, TestId};

struct MetricSlot {
    metric: Rc<dyn Metric>,
    cached: Cell<Option<f64>>,
}

/// Aggregated outcomes of a run, plus named metrics.
#[derive(Default)]
pub struct TestResult {
    succeeded: IndexMap<TestHash, Outcome>,
    failed: IndexMap<TestHash, Outcome>,
    skipped: IndexMap<TestHash, Outcome>,
    metrics: IndexMap<String, MetricSlot>,
}

impl TestResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `outcome`, replacing any earlier outcome for the same test.
    pub fn record(&mut self, outcome: Outcome) -> &Outcome {
        let hash = outcome.test().hash();
        self.succeeded.shift_remove(&hash);
        self.failed.shift_remove(&hash);
        self.skipped.shift_remove(&hash);

        let bucket = match outcome.kind().category() {
            Category::Succeeded => &mut self.succeeded,
            Category::Failed => &mut self.failed,
            Category::Skipped => &mut self.skipped,
        };
        let (index, _) = bucket.insert_full(hash, outcome);
        &bucket[index]
    }

    /// The recorded outcome for `test`, whichever bucket holds it.
    pub fn outcome_of(&self, test: &TestId) -> Option<&Outcome> {
        let hash = test.hash();
        self.succeeded
            .get(&hash)
            .or_else(|| self.failed.get(&hash))
            .or_else(|| self.skipped.get(&hash))
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &Outcome> {
        self.succeeded.values()
    }

    /// Failures, errors and warnings, in recording order.
    pub fn failed(&self) -> impl Iterator<Item = &Outcome> {
        self.failed.values()
    }

    /// Skipped and not-run outcomes, in recording order.
    pub fn skipped(&self) -> impl Iterator<Item = &Outcome> {
        self.skipped.values()
    }

    /// Every outcome: succeeded, then failed, then skipped.
    pub fn outcomes(&self) -> impl Iterator<Item = &Outcome> {
        self.succeeded().chain(self.failed()).chain(self.skipped())
    }

    pub fn count(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }

    /// Outcomes that actually executed: `count() - skip_count()`.
    pub fn run_count(&self) -> usize {
        self.count() - self.skip_count()
    }

    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Sum of all recorded outcome times.
    pub fn elapsed(&self) -> Duration {
        self.outcomes().map(Outcome::elapsed).sum()
    }

    // ========================================================================
    // Metrics
    // ========================================================================

    /// Register `metric` under `name`, replacing any metric of the same name.
    pub fn add_metric(&mut self, name: impl Into<String>, metric: Rc<dyn Metric>) {
        self.metrics.insert(
            name.into(),
            MetricSlot {
                metric,
                cached: Cell::new(None),
            },
        );
    }

    /// Value of the metric named `name`, calculated on first read and cached afterwards.
    pub fn metric(&self, name: &str) -> Option<f64> {
        let slot = self.metrics.get(name)?;
        if let Some(value) = slot.cached.get() {
            return Some(value);
        }
        let value = slot.metric.calculate(self);
        slot.cached.set(Some(value));
        Some(value)
    }

    /// Drop the cached value of `name` and recalculate it.
    pub fn refresh_metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name)?.cached.set(None);
        self.metric(name)
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// `(name, formatted value)` for every metric, in registration order.
    pub fn formatted_metrics(&self) -> Vec<(String, String)> {
        self.metrics
            .iter()
            .filter_map(|(name, slot)| {
                self.metric(name)
                    .map(|value| (name.clone(), slot.metric.format(value)))
            })
            .collect()
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Test run: {}/{} run ({} skipped), {} succeeded, {} failed",
            self.run_count(),
            self.count(),
            self.skip_count(),
            self.success_count(),
            self.failure_count()
        )
    }
}

impl fmt::Debug for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResult")
            .field("succeeded", &self.succeeded.len())
            .field("failed", &self.failed.len())
            .field("skipped", &self.skipped.len())
            .field("metrics", &self.metrics.keys().collect::<Vec<_>>())
            .finish()
    }
}
