//! A small test binary exercising the engine end to end.
//!
//! Run with `cargo run --example calculator -- -v`. Pass `-k divide` to select tests by name or `-x` to stop
//! at the first failure.

use serde_json::{Value, json};
use verity::assert::{assert_equals, skip};
use verity::error::ConfigResult;
use verity::exception::ILLEGAL_ARGUMENT;
use verity::group::{ClassGroup, InstanceGroup, TestCase, TestClass, TestGroup, TestMethod};
use verity::values::ValuesSpec;
use verity::{Exception, FnAction};

#[derive(Default)]
struct Calculator {
    memory: i64,
}

impl Calculator {
    fn divide(&self, a: i64, b: i64) -> Result<i64, Exception> {
        if b == 0 {
            return Err(Exception::illegal_argument("Division by zero"));
        }
        Ok(a / b)
    }
}

impl TestCase for Calculator {
    fn set_up(&mut self) -> Result<(), Exception> {
        self.memory = 0;
        Ok(())
    }
}

fn int(args: &[Value], index: usize) -> i64 {
    args.get(index).and_then(Value::as_i64).unwrap_or_default()
}

fn arithmetic() -> ConfigResult<Box<dyn TestGroup>> {
    let class = TestClass::new("Calculator", Calculator::default)
        .action(FnAction::new().before(|test| {
            tracing::debug!(test = %test, "starting");
            Ok(())
        }))
        .static_provider("quotients", |_| Ok(vec![json!([6, 3, 2]), json!([9, 3, 3]), json!([7, 2, 3])]))
        .test(
            TestMethod::new("adds", |_: &mut Calculator, args| {
                assert_equals(int(args, 0) + int(args, 1), int(args, 2))
            })
            .values(ValuesSpec::list([json!([1, 1, 2]), json!([2, 3, 5])])),
        )
        .test(
            TestMethod::new("divides", |calc: &mut Calculator, args| {
                assert_equals(int(args, 2), calc.divide(int(args, 0), int(args, 1))?)
            })
            .values(ValuesSpec::source("self::quotients")),
        )
        .test(
            TestMethod::new("rejects_zero_divisor", |calc: &mut Calculator, _| {
                calc.divide(1, 0).map(drop)
            })
            .expect_message(&ILLEGAL_ARGUMENT, "/division by zero/i"),
        )
        .test(TestMethod::new("rounds", |_: &mut Calculator, _| {
            tracing::warn!("rounding mode not configured, using half-even");
            Ok(())
        }))
        .test(TestMethod::new("remote", |_: &mut Calculator, _| skip("no network in the demo")))
        .test(TestMethod::new("roots", |_: &mut Calculator, _| Ok(())).ignore("not implemented yet"));
    ClassGroup::new(class).map(|group| Box::new(group) as Box<dyn TestGroup>)
}

fn memory() -> ConfigResult<Box<dyn TestGroup>> {
    let class = TestClass::new("Memory", Calculator::default)
        .test(TestMethod::new("store", |calc: &mut Calculator, _| {
            calc.memory += 42;
            Ok(())
        }))
        .test(TestMethod::new("recall", |calc: &mut Calculator, _| assert_equals(42, calc.memory)));
    // `set_up` clears memory before every method, so `recall` fails: the shared instance is not enough.
    InstanceGroup::new(class).map(|group| Box::new(group) as Box<dyn TestGroup>)
}

fn main() {
    verity::cli::run([arithmetic(), memory()]);
}
