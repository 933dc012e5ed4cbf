//! Named metrics computed over a [`TestResult`].

use crate::result::TestResult;

/// A derived figure over a finished (or running) test result.
pub trait Metric {
    fn calculate(&self, result: &TestResult) -> f64;

    fn format(&self, value: f64) -> String {
        format!("{value}")
    }
}

/// Total time of all recorded outcomes, in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElapsedTime;

impl Metric for ElapsedTime {
    fn calculate(&self, result: &TestResult) -> f64 {
        result.elapsed().as_secs_f64()
    }

    fn format(&self, value: f64) -> String {
        format!("{value:.3} seconds")
    }
}

/// Share of executed outcomes that succeeded; `1.0` when nothing ran.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuccessRate;

impl Metric for SuccessRate {
    fn calculate(&self, result: &TestResult) -> f64 {
        match result.run_count() {
            0 => 1.0,
            run => result.success_count() as f64 / run as f64,
        }
    }

    fn format(&self, value: f64) -> String {
        format!("{:.1}%", value * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{Outcome, OutcomeKind};
    use crate::test::TestId;
    use std::rc::Rc;
    use std::time::Duration;

    #[test]
    fn test_builtin_metrics() {
        let mut result = TestResult::new();
        result.add_metric("elapsed", Rc::new(ElapsedTime));
        result.add_metric("success", Rc::new(SuccessRate));
        assert_eq!(result.metric("success"), Some(1.0));
        result.refresh_metric("elapsed");

        result.record(Outcome::succeeded(TestId::new("M", "a"), Duration::from_millis(250)));
        result.record(Outcome::new(
            TestId::new("M", "b"),
            Duration::from_millis(250),
            OutcomeKind::NotRun("later".into()),
        ));
        result.refresh_metric("elapsed");
        result.refresh_metric("success");

        assert_eq!(
            result.formatted_metrics(),
            vec![
                ("elapsed".to_string(), "0.500 seconds".to_string()),
                ("success".to_string(), "100.0%".to_string()),
            ]
        );
    }
}
