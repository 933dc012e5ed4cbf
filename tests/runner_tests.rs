//! End-to-end tests of the execution engine: lifecycle, classification, listeners and run options.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt;
use verity::assert::{assert_equals, assert_true, skip};
use verity::diagnostics::{self, Diagnostics, WarningCapture};
use verity::exception::{ILLEGAL_ARGUMENT, TIMED_OUT};
use verity::group::{ClassGroup, TestCase, TestClass, TestGroup, TestMethod};
use verity::metrics::SuccessRate;
use verity::values::ValuesSpec;
use verity::{
    Exception, ExceptionType, FnAction, OutcomeKind, RecordingListener, RunConfig, Runner, TestId, TestResult,
};

#[derive(Default)]
struct Fixture;

impl TestCase for Fixture {}

fn class() -> TestClass<Fixture> {
    TestClass::new("Fixture", Fixture::default)
}

fn group(class: TestClass<Fixture>) -> ClassGroup<Fixture> {
    ClassGroup::new(class).unwrap()
}

fn run(group: &dyn TestGroup) -> (TestResult, Vec<String>) {
    let listener = RecordingListener::shared();
    let mut runner = Runner::new().with_listener(listener.clone());
    let result = runner.run(group);
    let events = listener.borrow().events.clone();
    (result, events)
}

fn only_outcome(result: &TestResult) -> &OutcomeKind {
    assert_eq!(result.count(), 1, "expected exactly one outcome");
    result.outcomes().next().unwrap().kind()
}

// ============================================================================
// Literal scenarios
// ============================================================================

#[test]
fn failing_assertion_is_a_failure() {
    let group = group(class().test(TestMethod::new("asserts", |_: &mut Fixture, _| assert_equals(true, false))));
    let (result, _) = run(&group);

    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.success_count(), 0);
    assert!(matches!(only_outcome(&result), OutcomeKind::Failed(_)));
}

#[test]
fn ignored_test_is_not_run() {
    let touched = Rc::new(Cell::new(false));
    let flag = touched.clone();
    let group = group(class().test(
        TestMethod::new("later", move |_: &mut Fixture, _| {
            flag.set(true);
            Ok(())
        })
        .ignore("WIP")
        .action(FnAction::new().before(|_| panic!("actions must not run for ignored tests"))),
    ));
    let (result, events) = run(&group);

    assert_eq!(result.skip_count(), 1);
    assert!(matches!(only_outcome(&result), OutcomeKind::NotRun(reason) if reason == "WIP"));
    assert!(!touched.get());
    assert_eq!(events, vec!["run-started:1", "started:later", "not-run:later", "run-finished:1"]);
}

#[test]
fn expected_exception_is_a_success() {
    let group = group(class().test(
        TestMethod::new("throws", |_: &mut Fixture, _| Err(Exception::illegal_argument("bad")))
            .expect(&ILLEGAL_ARGUMENT),
    ));
    let (result, _) = run(&group);

    assert_eq!(result.success_count(), 1);
    assert!(matches!(only_outcome(&result), OutcomeKind::ExpectationMet));
}

#[test]
fn expected_message_mismatch_is_a_failure() {
    let group = group(class().test(
        TestMethod::new("throws", |_: &mut Fixture, _| Err(Exception::illegal_argument("Hello")))
            .expect_message(&ILLEGAL_ARGUMENT, "Test"),
    ));
    let (result, _) = run(&group);

    let reason = only_outcome(&result).reason().unwrap();
    assert_eq!(
        reason.message(),
        "Expected IllegalArgumentException's message \"Hello\" differs from expected Test"
    );
    assert_eq!(result.failure_count(), 1);
}

#[test]
fn slow_test_times_out() {
    let group = group(
        class()
            .test(
                TestMethod::new("sleeps", |_: &mut Fixture, _| {
                    thread::sleep(Duration::from_millis(20));
                    Ok(())
                })
                .time_limit(Duration::from_millis(10)),
            )
            .test(
                TestMethod::new("sleeps_and_throws", |_: &mut Fixture, _| {
                    thread::sleep(Duration::from_millis(20));
                    Err(Exception::error("also broken"))
                })
                .time_limit(Duration::from_millis(10)),
            ),
    );
    let (result, _) = run(&group);

    assert_eq!(result.failure_count(), 2);
    for outcome in result.failed() {
        let reason = outcome.kind().reason().unwrap();
        assert!(matches!(outcome.kind(), OutcomeKind::Failed(_)));
        assert!(reason.is_instance_of(&TIMED_OUT));
        assert!(reason.message().starts_with("Test runtime of "));
        assert!(reason.message().ends_with(" longer than eta of 0.010 seconds"));
    }
}

struct Numbered {
    index: usize,
}

impl TestCase for Numbered {
    fn set_up(&mut self) -> Result<(), Exception> {
        if self.index == 2 { skip("database offline") } else { Ok(()) }
    }
}

#[test]
fn mixed_group_counts() {
    let created = Rc::new(Cell::new(0));
    let counter = created.clone();
    let class = TestClass::new("Numbered", move || {
        let index = counter.get();
        counter.set(index + 1);
        Numbered { index }
    })
    .test(TestMethod::new("fails", |_: &mut Numbered, _| assert_true(false)))
    .test(TestMethod::new("succeeds", |_: &mut Numbered, _| Ok(())))
    .test(TestMethod::new("needs_database", |_: &mut Numbered, _| Ok(())))
    .test(TestMethod::new("ignored", |_: &mut Numbered, _| Ok(())).ignore("later"));
    let group = ClassGroup::new(class).unwrap();
    let (result, _) = run(&group);

    assert_eq!(result.count(), 4);
    assert_eq!(result.run_count(), 2);
    assert_eq!(result.success_count(), 1);
    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.skip_count(), 2);
    assert!(matches!(
        result.outcome_of(&TestId::new("Numbered", "needs_database")).unwrap().kind(),
        OutcomeKind::Skipped(reason) if reason.message() == "database offline"
    ));
}

#[test]
fn teardown_failures_chain_most_recent_first() {
    let group = group(
        class()
            .action(FnAction::new().after(|_| Err(Exception::error("First"))))
            .test(
                TestMethod::new("passes", |_: &mut Fixture, _| Ok(()))
                    .action(FnAction::new().after(|_| Err(Exception::error("Second")))),
            ),
    );
    let (result, _) = run(&group);

    assert_eq!(result.failure_count(), 1);
    let reason = only_outcome(&result).reason().unwrap();
    assert_eq!(reason.message(), "Second");
    assert_eq!(reason.cause().map(Exception::message), Some("First"));
}

// ============================================================================
// Group lifecycle
// ============================================================================

#[test]
fn events_bracket_each_test() {
    let group = group(
        class()
            .test(TestMethod::new("a", |_: &mut Fixture, _| Ok(())))
            .test(TestMethod::new("b", |_: &mut Fixture, _| Err(Exception::error("io")))),
    );
    let (_, events) = run(&group);
    assert_eq!(
        events,
        vec!["run-started:2", "started:a", "succeeded:a", "started:b", "error:b", "run-finished:2"]
    );
}

#[test]
fn failing_before_class_skips_everything_and_never_runs_after() {
    let after_ran = Rc::new(Cell::new(false));
    let flag = after_ran.clone();
    let group = group(
        class()
            .before_class("connect", || Err(Exception::error("refused")))
            .after_class("disconnect", move || {
                flag.set(true);
                Ok(())
            })
            .test(TestMethod::new("a", |_: &mut Fixture, _| Ok(())))
            .test(TestMethod::new("b", |_: &mut Fixture, _| Ok(()))),
    );
    let (result, events) = run(&group);

    assert_eq!(result.skip_count(), 2);
    assert!(!after_ran.get());
    assert_eq!(
        events,
        vec!["run-started:2", "started:a", "skipped:a", "started:b", "skipped:b", "run-finished:2"]
    );
    for outcome in result.skipped() {
        let reason = outcome.kind().reason().unwrap();
        assert_eq!(reason.message(), "Exception in beforeClass method connect");
        assert_eq!(reason.cause().map(Exception::message), Some("refused"));
    }
}

#[test]
fn after_class_runs_once_even_when_tests_fail_and_its_failure_is_swallowed() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let group = group(
        class()
            .after_class("cleanup", move || {
                counter.set(counter.get() + 1);
                Err(Exception::error("cleanup failed"))
            })
            .test(TestMethod::new("fails", |_: &mut Fixture, _| assert_true(false)))
            .test(TestMethod::new("passes", |_: &mut Fixture, _| Ok(()))),
    );
    let (result, _) = run(&group);

    assert_eq!(calls.get(), 1);
    assert_eq!(result.count(), 2);
    assert_eq!(result.failure_count(), 1);
}

#[test]
fn before_test_prerequisite_skips_but_after_test_still_runs() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let after_log = log.clone();
    let body_log = log.clone();
    let group = group(
        class().test(
            TestMethod::new("guarded", move |_: &mut Fixture, _| {
                body_log.borrow_mut().push("body");
                Ok(())
            })
            .action(
                FnAction::new()
                    .before(|_| Err(Exception::prerequisites_not_met("no network")))
                    .after(move |_| {
                        after_log.borrow_mut().push("after");
                        Ok(())
                    }),
            ),
        ),
    );
    let (result, _) = run(&group);

    assert!(matches!(only_outcome(&result), OutcomeKind::Skipped(_)));
    assert_eq!(*log.borrow(), vec!["after"]);
}

#[test]
fn abort_wins_over_expectation() {
    let group = group(class().test(
        TestMethod::new("skips", |_: &mut Fixture, _| skip("not today")).expect(&ILLEGAL_ARGUMENT),
    ));
    let (result, _) = run(&group);
    assert!(matches!(only_outcome(&result), OutcomeKind::Skipped(_)));
}

#[test]
fn abort_wins_over_timeout() {
    let group = group(class().test(
        TestMethod::new("slow_skip", |_: &mut Fixture, _| {
            thread::sleep(Duration::from_millis(20));
            skip("offline")
        })
        .time_limit(Duration::from_millis(5)),
    ));
    let (result, _) = run(&group);
    assert!(matches!(only_outcome(&result), OutcomeKind::Skipped(reason) if reason.message() == "offline"));
}

static TOO_LARGE: ExceptionType = ExceptionType::new("TooLargeException", Some(&ILLEGAL_ARGUMENT));

#[test]
fn expectation_accepts_subtypes() {
    let group = group(class().test(
        TestMethod::new("overflows", |_: &mut Fixture, _| Err(Exception::new(&TOO_LARGE, "42 > 10")))
            .expect(&ILLEGAL_ARGUMENT),
    ));
    let (result, _) = run(&group);
    assert!(matches!(only_outcome(&result), OutcomeKind::ExpectationMet));
}

#[test]
fn after_test_runs_once_per_variation_whatever_fails() {
    let afters = Rc::new(Cell::new(0));
    let bodies = Rc::new(Cell::new(0));
    let after_counter = afters.clone();
    let body_counter = bodies.clone();
    let group = group(
        class()
            .action(FnAction::new().after(move |_| {
                after_counter.set(after_counter.get() + 1);
                Ok(())
            }))
            .test(
                TestMethod::new("checks", move |_: &mut Fixture, _| {
                    body_counter.set(body_counter.get() + 1);
                    Err(Exception::illegal_state("broken"))
                })
                .action(FnAction::new().before(|test| {
                    if test.name() == "checks(2)" {
                        Err(Exception::error("no fixture"))
                    } else {
                        Ok(())
                    }
                }))
                .values(ValuesSpec::list([1, 2, 3])),
            ),
    );
    let (result, _) = run(&group);

    assert_eq!(result.count(), 3);
    assert_eq!(afters.get(), 3);
    assert_eq!(bodies.get(), 2);
    let skipped_body = result.outcome_of(&TestId::new("Fixture", "checks").variation(&[2.into()])).unwrap();
    assert!(matches!(skipped_body.kind(), OutcomeKind::Errored(e) if e.message() == "no fixture"));
}

#[test]
fn panicking_constructor_errors_its_test_and_the_run_completes() {
    let built = Rc::new(Cell::new(0));
    let counter = built.clone();
    let after_calls = Rc::new(Cell::new(0));
    let after_counter = after_calls.clone();
    let group = group(
        TestClass::new("Fixture", move || {
            counter.set(counter.get() + 1);
            if counter.get() == 2 {
                panic!("constructor broke");
            }
            Fixture
        })
        .after_class("cleanup", move || {
            after_counter.set(after_counter.get() + 1);
            Ok(())
        })
        .test(TestMethod::new("a", |_: &mut Fixture, _| Ok(())))
        .test(TestMethod::new("b", |_: &mut Fixture, _| Ok(())))
        .test(TestMethod::new("c", |_: &mut Fixture, _| Ok(()))),
    );
    let (result, events) = run(&group);

    assert_eq!(result.count(), 3);
    assert_eq!(result.success_count(), 2);
    let b = result.outcome_of(&TestId::new("Fixture", "b")).unwrap();
    assert!(matches!(
        b.kind(),
        OutcomeKind::Errored(e)
            if e.message() == "Exception in constructor of Fixture"
                && e.cause().map(Exception::message) == Some("constructor broke")
    ));
    assert_eq!(after_calls.get(), 1);
    assert_eq!(events.last().map(String::as_str), Some("run-finished:3"));
}

#[test]
fn panics_are_classified() {
    let group = group(
        class()
            .test(TestMethod::new("asserts", |_: &mut Fixture, _| {
                assert_eq!(1 + 1, 3);
                Ok(())
            }))
            .test(TestMethod::new("panics", |_: &mut Fixture, _| panic!("unexpected state"))),
    );
    let (result, _) = run(&group);

    let asserts = result.outcome_of(&TestId::new("Fixture", "asserts")).unwrap();
    let panics = result.outcome_of(&TestId::new("Fixture", "panics")).unwrap();
    assert!(matches!(asserts.kind(), OutcomeKind::Failed(_)));
    assert!(matches!(panics.kind(), OutcomeKind::Errored(e) if e.message() == "unexpected state"));
}

// ============================================================================
// Variations
// ============================================================================

#[test]
fn each_row_is_its_own_test() {
    let group = group(class().test(
        TestMethod::new("doubles", |_: &mut Fixture, args| {
            let (input, expected) = (args[0].as_i64().unwrap(), args[1].as_i64().unwrap());
            assert_equals(expected, input * 2)
        })
        .values(ValuesSpec::try_from(serde_json::json!([[1, 2], [2, 4], [3, 7]])).unwrap()),
    ));
    let (result, events) = run(&group);

    assert_eq!(result.count(), 3);
    assert_eq!(result.success_count(), 2);
    assert_eq!(result.failed().next().unwrap().test().name(), "doubles(3, 7)");
    assert_eq!(events[1], "started:doubles(1, 2)");
}

#[test]
fn rerunning_a_group_rederives_rows() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let group = group(
        class()
            .static_provider("rows", move |_| {
                counter.set(counter.get() + 1);
                Ok(vec![serde_json::json!(counter.get())])
            })
            .test(TestMethod::new("uses", |_: &mut Fixture, _| Ok(())).values(ValuesSpec::source("self::rows"))),
    );

    let (first, _) = run(&group);
    let (second, _) = run(&group);

    assert_eq!(calls.get(), 2);
    assert_eq!(first.succeeded().next().unwrap().test().name(), "uses(1)");
    assert_eq!(second.succeeded().next().unwrap().test().name(), "uses(2)");
}

#[test]
fn failing_provider_errors_the_base_test() {
    let group = group(
        class()
            .static_provider("rows", |_| Err(Exception::illegal_state("no rows")))
            .test(TestMethod::new("uses", |_: &mut Fixture, _| Ok(())).values(ValuesSpec::source("self::rows"))),
    );
    let (result, events) = run(&group);

    assert!(matches!(only_outcome(&result), OutcomeKind::Errored(e) if e.message() == "no rows"));
    assert_eq!(events, vec!["run-started:1", "started:uses", "error:uses", "run-finished:1"]);
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn raised_diagnostics_turn_success_into_warning() {
    let group = group(
        class()
            .test(TestMethod::new("warns", |_: &mut Fixture, _| {
                diagnostics::raise("deprecated API");
                Ok(())
            }))
            .test(TestMethod::new("clean", |_: &mut Fixture, _| Ok(()))),
    );
    let (result, _) = run(&group);

    let warns = result.outcome_of(&TestId::new("Fixture", "warns")).unwrap();
    assert!(matches!(warns.kind(), OutcomeKind::Warning(w) if w == &vec!["deprecated API".to_string()]));
    let clean = result.outcome_of(&TestId::new("Fixture", "clean")).unwrap();
    assert!(matches!(clean.kind(), OutcomeKind::Succeeded));
}

#[test]
fn logged_warnings_are_captured() {
    let group = group(class().test(TestMethod::new("logs", |_: &mut Fixture, _| {
        tracing::warn!(target: "calculator", "precision lost");
        Ok(())
    })));
    let subscriber = tracing_subscriber::registry().with(WarningCapture);
    let (result, _) = tracing::subscriber::with_default(subscriber, || run(&group));

    assert!(matches!(
        only_outcome(&result),
        OutcomeKind::Warning(w) if w == &vec!["WARN calculator: precision lost".to_string()]
    ));
}

struct FixedDiagnostics(Vec<String>);

impl Diagnostics for FixedDiagnostics {
    fn clear(&self) {}

    fn raised(&self) -> Vec<String> {
        self.0.clone()
    }
}

#[test]
fn diagnostics_registry_is_injected() {
    let group = group(class().test(TestMethod::new("quiet", |_: &mut Fixture, _| Ok(()))));
    let mut runner = Runner::new().with_diagnostics(Rc::new(FixedDiagnostics(vec!["injected".into()])));
    let result = runner.run(&group);
    assert!(only_outcome(&result).is_warning());
}

// ============================================================================
// Runner options
// ============================================================================

#[test]
fn filter_skips_unselected_tests_entirely() {
    let group = group(
        class()
            .test(TestMethod::new("adds", |_: &mut Fixture, _| Ok(())))
            .test(TestMethod::new("subtracts", |_: &mut Fixture, _| Ok(()))),
    );
    let mut runner = Runner::new().with_config(RunConfig::new().with_filter("add"));
    let result = runner.run(&group);

    assert_eq!(result.count(), 1);
    assert!(result.outcome_of(&TestId::new("Fixture", "adds")).is_some());
}

#[test]
fn stop_on_failure_halts_the_run() {
    let group = group(
        class()
            .test(TestMethod::new("first", |_: &mut Fixture, _| Ok(())))
            .test(TestMethod::new("second", |_: &mut Fixture, _| assert_true(false)))
            .test(TestMethod::new("third", |_: &mut Fixture, _| Ok(()))),
    );
    let mut runner = Runner::new().with_config(RunConfig::new().with_stop_on_failure(true));
    let result = runner.run(&group);

    assert_eq!(result.count(), 2);
    assert!(result.outcome_of(&TestId::new("Fixture", "third")).is_none());
}

#[test]
fn all_runs_groups_in_order_as_one_run() {
    let first = group(class().test(TestMethod::new("a", |_: &mut Fixture, _| Ok(()))));
    let second = ClassGroup::new(
        TestClass::new("Other", Fixture::default).test(TestMethod::new("b", |_: &mut Fixture, _| Ok(()))),
    )
    .unwrap();
    let listener = RecordingListener::shared();
    let mut runner = Runner::new().with_listener(listener.clone());
    let result = runner.all(&[&first, &second]);

    assert_eq!(result.count(), 2);
    assert_eq!(
        listener.borrow().events,
        vec!["run-started:2", "started:a", "succeeded:a", "started:b", "succeeded:b", "run-finished:2"]
    );
}

#[test]
fn run_one_executes_a_single_unit() {
    let group = group(class().test(TestMethod::new("solo", |_: &mut Fixture, _| Ok(()))));
    let unit = group.tests().next().unwrap();
    let result = Runner::new().run_one(&unit);
    assert_eq!(result.success_count(), 1);
}

#[test]
fn listeners_are_notified_in_registration_order() {
    let order = Rc::new(RefCell::new(Vec::new()));

    struct Named(&'static str, Rc<RefCell<Vec<&'static str>>>);
    impl verity::Listener for Named {
        fn test_started(&mut self, _test: &TestId) {
            self.1.borrow_mut().push(self.0);
        }
    }

    let group = group(class().test(TestMethod::new("a", |_: &mut Fixture, _| Ok(()))));
    let mut runner = Runner::new()
        .with_listener(Named("first", order.clone()))
        .with_listener(Named("second", order.clone()));
    runner.run(&group);
    assert_eq!(*order.borrow(), vec!["first", "second"]);
}

#[test]
fn runner_metrics_are_attached_to_results() {
    let group = group(
        class()
            .test(TestMethod::new("a", |_: &mut Fixture, _| Ok(())))
            .test(TestMethod::new("b", |_: &mut Fixture, _| assert_true(false))),
    );
    let mut runner = Runner::new();
    runner.add_metric("success", Rc::new(SuccessRate));
    let result = runner.run(&group);
    assert_eq!(result.metric("success"), Some(0.5));
    assert_eq!(result.to_string(), "Test run: 2/2 run (0 skipped), 1 succeeded, 1 failed");
}
