//! Test class definitions.
//!
//! A [`TestClass`] is the explicit, reflection-free description of a test class: its name, how to build an
//! instance, class-level hooks and actions, its test methods and the values providers its methods may name.
//! Groups are built from a definition and validate it once, at construction.

use std::rc::Rc;
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;
use verity_core::{Exception, ExceptionType};

use crate::action::TestAction;
use crate::test::TestConfig;
use crate::values::ValuesSpec;

pub(crate) type MethodBody<T> = Rc<dyn Fn(&mut T, &[Value]) -> Result<(), Exception>>;
pub(crate) type ClassHook = Rc<dyn Fn() -> Result<(), Exception>>;
pub(crate) type InstanceProvider<T> = Rc<dyn Fn(&mut T, &[Value]) -> Result<Vec<Value>, Exception>>;
pub(crate) type StaticProvider = Rc<dyn Fn(&[Value]) -> Result<Vec<Value>, Exception>>;

/// Per-instance lifecycle hooks, run around every test method.
///
/// A `tear_down` failure is chained over a failure of the method itself. When `set_up` fails, neither the
/// method nor `tear_down` runs.
pub trait TestCase: 'static {
    fn set_up(&mut self) -> Result<(), Exception> {
        Ok(())
    }

    fn tear_down(&mut self) -> Result<(), Exception> {
        Ok(())
    }
}

/// One test method and its configuration.
pub struct TestMethod<T> {
    pub(crate) name: String,
    pub(crate) body: MethodBody<T>,
    pub(crate) config: TestConfig,
}

impl<T> TestMethod<T> {
    /// A test method receiving the instance and one row of arguments (empty without values).
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut T, &[Value]) -> Result<(), Exception> + 'static,
    {
        Self {
            name: name.into(),
            body: Rc::new(body),
            config: TestConfig::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: TestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn ignore(mut self, reason: impl Into<String>) -> Self {
        self.config.ignored = Some(reason.into());
        self
    }

    /// Expect an exception of type `kind` (or a subtype), with any message.
    pub fn expect(mut self, kind: &'static ExceptionType) -> Self {
        self.config.expectation = Some((kind, None));
        self
    }

    /// Expect an exception of type `kind` whose message matches `message` (literal or `/regex/flags`).
    pub fn expect_message(mut self, kind: &'static ExceptionType, message: impl Into<String>) -> Self {
        self.config.expectation = Some((kind, Some(message.into())));
        self
    }

    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.config.time_limit = Some(limit);
        self
    }

    /// Attach a method-level action; runs after the class-level ones.
    pub fn action(mut self, action: impl TestAction + 'static) -> Self {
        self.config.actions.push(Rc::new(action));
        self
    }

    pub fn values(mut self, values: ValuesSpec) -> Self {
        self.config.values = Some(values);
        self
    }
}

/// Static values providers registered for other classes, addressed as `"Class::method"`.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, StaticProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, class: &str, method: &str, provider: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, Exception> + 'static,
    {
        self.providers.insert(format!("{class}::{method}"), Rc::new(provider));
        self
    }

    /// Register every static provider of `class` under its name.
    pub fn import<T>(&mut self, class: &TestClass<T>) -> &mut Self {
        for (method, provider) in &class.static_providers {
            self.providers
                .insert(format!("{}::{method}", class.name), provider.clone());
        }
        self
    }

    pub(crate) fn get(&self, class: &str, method: &str) -> Option<StaticProvider> {
        self.providers.get(&format!("{class}::{method}")).cloned()
    }
}

/// Definition of a test class.
///
/// ```rust
/// use verity::group::{TestCase, TestClass, TestMethod};
/// use verity::values::ValuesSpec;
/// use verity::assert::assert_equals;
/// use serde_json::json;
///
/// #[derive(Default)]
/// struct Calculator;
/// impl TestCase for Calculator {}
///
/// let class = TestClass::new("Calculator", Calculator::default)
///     .test(TestMethod::new("adds", |_: &mut Calculator, args| {
///         assert_equals(args[0].as_i64().unwrap_or_default() + 1, args[1].as_i64().unwrap_or_default())
///     }).values(ValuesSpec::list([json!([1, 2]), json!([2, 3])])));
/// assert_eq!(class.name(), "Calculator");
/// ```
pub struct TestClass<T> {
    pub(crate) name: String,
    pub(crate) factory: Rc<dyn Fn() -> T>,
    pub(crate) before_class: Vec<(String, ClassHook)>,
    pub(crate) after_class: Vec<(String, ClassHook)>,
    pub(crate) actions: Vec<Rc<dyn TestAction>>,
    pub(crate) methods: Vec<TestMethod<T>>,
    pub(crate) instance_providers: IndexMap<String, InstanceProvider<T>>,
    pub(crate) static_providers: IndexMap<String, StaticProvider>,
    pub(crate) registry: Option<Rc<ProviderRegistry>>,
}

impl<T: TestCase> TestClass<T> {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self {
            name: name.into(),
            factory: Rc::new(factory),
            before_class: Vec::new(),
            after_class: Vec::new(),
            actions: Vec::new(),
            methods: Vec::new(),
            instance_providers: IndexMap::new(),
            static_providers: IndexMap::new(),
            registry: None,
        }
    }

    /// Add a static hook run once before any test of the group.
    pub fn before_class<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn() -> Result<(), Exception> + 'static,
    {
        self.before_class.push((name.into(), Rc::new(hook)));
        self
    }

    /// Add a static hook run once after all tests of the group.
    pub fn after_class<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn() -> Result<(), Exception> + 'static,
    {
        self.after_class.push((name.into(), Rc::new(hook)));
        self
    }

    /// Attach a class-level action, applied to every test method.
    pub fn action(mut self, action: impl TestAction + 'static) -> Self {
        self.actions.push(Rc::new(action));
        self
    }

    pub fn test(mut self, method: TestMethod<T>) -> Self {
        self.methods.push(method);
        self
    }

    /// Values provider on the test instance, addressed as `"method"`.
    pub fn instance_provider<F>(mut self, name: impl Into<String>, provider: F) -> Self
    where
        F: Fn(&mut T, &[Value]) -> Result<Vec<Value>, Exception> + 'static,
    {
        self.instance_providers.insert(name.into(), Rc::new(provider));
        self
    }

    /// Static values provider, addressed as `"self::method"` (or `"Class::method"` through a registry).
    pub fn static_provider<F>(mut self, name: impl Into<String>, provider: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, Exception> + 'static,
    {
        self.static_providers.insert(name.into(), Rc::new(provider));
        self
    }

    /// Resolve `"Class::method"` sources through `registry`.
    pub fn with_registry(mut self, registry: Rc<ProviderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }
}

impl<T> TestClass<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[TestMethod<T>] {
        &self.methods
    }
}
