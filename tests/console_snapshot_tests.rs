//! Golden snapshot tests for console output
//!
//! These tests feed a fixed sequence of outcomes through the console listener and compare its output
//! against stored snapshots, so report layout changes are reviewed and intentional.
//!
//! Run with: `cargo test --test console_snapshot_tests`
//! Review changes: `cargo insta review`

use std::rc::Rc;
use std::time::Duration;

use verity::cli::console::ConsoleListener;
use verity::metrics::SuccessRate;
use verity::outcome::Event;
use verity::{Exception, Listener, Outcome, OutcomeKind, RunConfig, TestId, TestResult};

fn outcomes() -> Vec<Outcome> {
    let ms = Duration::from_millis;
    vec![
        Outcome::succeeded(TestId::new("Calc", "adds"), ms(1)),
        Outcome::failed(
            TestId::new("Calc", "divides"),
            ms(2),
            Exception::assertion_failed("expected <2> but was <3>"),
        ),
        Outcome::new(
            TestId::new("Calc", "parses"),
            ms(3),
            OutcomeKind::Errored(
                Exception::illegal_state("bad input").with_cause(Exception::illegal_argument("not a number")),
            ),
        ),
        Outcome::new(
            TestId::new("Calc", "rounds"),
            ms(4),
            OutcomeKind::Warning(vec!["WARN calc: precision lost".to_string()]),
        ),
        Outcome::skipped(
            TestId::new("Calc", "remote"),
            Duration::ZERO,
            Exception::prerequisites_not_met("offline"),
        ),
        Outcome::new(TestId::new("Calc", "later"), Duration::ZERO, OutcomeKind::NotRun("WIP".to_string())),
    ]
}

/// Replay `outcomes` through a console listener the way the runner reports them.
fn render(config: &RunConfig) -> String {
    let outcomes = outcomes();
    let mut console = ConsoleListener::new(Vec::new(), config);
    let mut result = TestResult::new();
    result.add_metric("success rate", Rc::new(SuccessRate));

    console.test_run_started(outcomes.len());
    for outcome in outcomes {
        console.test_started(outcome.test());
        let outcome = result.record(outcome);
        match outcome.kind().event() {
            Event::Succeeded => console.test_succeeded(outcome),
            Event::Failed => console.test_failed(outcome),
            Event::Error => console.test_error(outcome),
            Event::Warning => console.test_warning(outcome),
            Event::Skipped => console.test_skipped(outcome),
            Event::NotRun => console.test_not_run(outcome),
        }
    }
    console.test_run_finished(&result);
    String::from_utf8(console.into_inner()).expect("console output is UTF-8")
}

#[test]
fn test_terse_report() {
    let output = render(&RunConfig::new().with_color(false));
    insta::assert_snapshot!("terse_report", output);
}

#[test]
fn test_verbose_report() {
    let output = render(&RunConfig::new().with_color(false).with_verbose(true));
    insta::assert_snapshot!("verbose_report", output);
}
