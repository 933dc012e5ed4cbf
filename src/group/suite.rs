//! Resolution of a [`TestClass`] definition into runnable parts.
//!
//! All three group variants go through [`Suite::resolve`], which validates the definition once: reserved and
//! duplicated method names, expected-message patterns and named values sources. Everything that needs late
//! binding by name is bound here; units built afterwards only call closures.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use serde_json::Value;
use verity_core::Exception;
use verity_core::exception::PREREQUISITES_NOT_MET;

use super::definition::{ClassHook, InstanceProvider, MethodBody, StaticProvider, TestCase, TestClass};
use crate::action::TestAction;
use crate::error::{ConfigError, ConfigResult};
use crate::expect::{Expectation, MessagePattern};
use crate::guard::guarded;
use crate::test::{ResolvedConfig, TestConfig, TestId, TestUnit};
use crate::values::{Row, SourceRef, ValuesSpec, rows_from_list, rows_from_map};

/// Method names taken by instance lifecycle hooks.
pub const RESERVED_NAMES: &[&str] = &["set_up", "tear_down", "name"];

enum ResolvedValues<T> {
    Rows(Vec<Row>),
    Instance { provider: InstanceProvider<T>, args: Vec<Value> },
    Static { provider: StaticProvider, args: Vec<Value> },
}

pub(crate) struct ResolvedMethod<T> {
    id: TestId,
    body: MethodBody<T>,
    config: Rc<ResolvedConfig>,
    actions: Vec<Rc<dyn TestAction>>,
    values: Option<ResolvedValues<T>>,
}

impl<T> ResolvedMethod<T> {
    pub(crate) fn id(&self) -> &TestId {
        &self.id
    }
}

/// The instance a unit runs on.
///
/// A lazy instance is built when the unit first needs it, so a panicking factory surfaces as that unit's
/// error instead of escaping the run. Variations of one unit share the built instance.
pub(crate) enum Instance<T> {
    Shared(Rc<RefCell<T>>),
    Lazy {
        class: String,
        factory: Rc<dyn Fn() -> T>,
        built: RefCell<Option<Rc<RefCell<T>>>>,
    },
}

impl<T> Instance<T> {
    pub(crate) fn shared(instance: Rc<RefCell<T>>) -> Rc<Self> {
        Rc::new(Instance::Shared(instance))
    }

    pub(crate) fn get(&self) -> Result<Rc<RefCell<T>>, Exception> {
        match self {
            Instance::Shared(instance) => Ok(instance.clone()),
            Instance::Lazy { class, factory, built } => {
                let existing = built.borrow().clone();
                if let Some(instance) = existing {
                    return Ok(instance);
                }
                let instance = guarded(|| Ok(factory()))
                    .map(|value| Rc::new(RefCell::new(value)))
                    .map_err(|e| Exception::error(format!("Exception in constructor of {class}")).with_cause(e))?;
                *built.borrow_mut() = Some(instance.clone());
                Ok(instance)
            }
        }
    }
}

/// A validated test class.
pub(crate) struct Suite<T> {
    pub(crate) name: String,
    factory: Rc<dyn Fn() -> T>,
    before_class: Vec<(String, ClassHook)>,
    after_class: Vec<(String, ClassHook)>,
    actions: Vec<Rc<dyn TestAction>>,
    pub(crate) methods: Vec<ResolvedMethod<T>>,
}

impl<T: TestCase> Suite<T> {
    pub(crate) fn resolve(class: TestClass<T>) -> ConfigResult<Self> {
        let mut seen = HashSet::new();
        let mut methods = Vec::with_capacity(class.methods.len());

        for method in &class.methods {
            if RESERVED_NAMES.contains(&method.name.as_str()) {
                return Err(ConfigError::ReservedName {
                    class: class.name.clone(),
                    method: method.name.clone(),
                });
            }
            if !seen.insert(method.name.as_str()) {
                return Err(ConfigError::DuplicateMethod {
                    class: class.name.clone(),
                    method: method.name.clone(),
                });
            }

            let config = resolve_config(&class.name, &method.name, &method.config)?;
            let values = match &method.config.values {
                None => None,
                Some(spec) => Some(resolve_values(&class, &method.name, spec)?),
            };
            let actions = class
                .actions
                .iter()
                .chain(&method.config.actions)
                .cloned()
                .collect();

            methods.push(ResolvedMethod {
                id: TestId::new(&class.name, &method.name),
                body: method.body.clone(),
                config: Rc::new(config),
                actions,
                values,
            });
        }

        tracing::debug!(class = %class.name, methods = methods.len(), "resolved test class");
        Ok(Self {
            name: class.name,
            factory: class.factory,
            before_class: class.before_class,
            after_class: class.after_class,
            actions: class.actions,
            methods,
        })
    }

    pub(crate) fn instantiate(&self) -> Rc<RefCell<T>> {
        Rc::new(RefCell::new((self.factory)()))
    }

    /// An instance built by the factory on first use.
    pub(crate) fn lazy_instance(&self) -> Rc<Instance<T>> {
        Rc::new(Instance::Lazy {
            class: self.name.clone(),
            factory: self.factory.clone(),
            built: RefCell::new(None),
        })
    }

    /// Bind `method` to `instance`: set_up, method, tear_down.
    pub(crate) fn unit(&self, method: &ResolvedMethod<T>, instance: Rc<Instance<T>>) -> TestUnit {
        let body = method.body.clone();
        let slot = instance.clone();
        let invoke = move |args: &[Value]| -> Result<(), Exception> {
            let instance = slot.get()?;
            let mut this = instance.borrow_mut();
            this.set_up()?;
            let result = body(&mut *this, args);
            match (result, this.tear_down()) {
                (result, Ok(())) => result,
                (Ok(()), Err(teardown)) => Err(teardown),
                (Err(failure), Err(teardown)) => Err(teardown.with_cause(failure)),
            }
        };

        let unit = TestUnit::from_parts(method.id.clone(), method.config.clone(), Rc::new(invoke))
            .with_actions(method.actions.clone());

        match &method.values {
            None => unit,
            Some(ResolvedValues::Rows(rows)) => {
                let rows = rows.clone();
                unit.with_values(move || Ok(rows.clone()))
            }
            Some(ResolvedValues::Instance { provider, args }) => {
                let provider = provider.clone();
                let args = args.clone();
                unit.with_values(move || {
                    let instance = instance.get()?;
                    let rows = provider(&mut *instance.borrow_mut(), &args)?;
                    Ok(rows_from_list(rows))
                })
            }
            Some(ResolvedValues::Static { provider, args }) => {
                let provider = provider.clone();
                let args = args.clone();
                unit.with_values(move || Ok(rows_from_list(provider(&args)?)))
            }
        }
    }

    /// Run class hooks, then `extra`, then the class actions' group hooks.
    ///
    /// Failures other than prerequisites-not-met are wrapped into one naming the failing hook.
    pub(crate) fn before(&self, extra: impl FnOnce() -> Result<(), Exception>) -> Result<(), Exception> {
        for (name, hook) in &self.before_class {
            guarded(|| hook()).map_err(|e| before_class_failure(name, e))?;
        }
        guarded(extra)?;
        for action in &self.actions {
            guarded(|| action.before_group(&self.name))
                .map_err(|e| before_class_failure(&format!("{}::before_group", self.name), e))?;
        }
        Ok(())
    }

    /// Run the actions' group hooks, then `extra`, then class hooks; all run and failures chain.
    pub(crate) fn after(&self, extra: impl FnOnce() -> Result<(), Exception>) -> Result<(), Exception> {
        let mut thrown = None;
        let mut step = |result: Result<(), Exception>| {
            if let Err(e) = result {
                thrown = Some(e.caused_by(thrown.take()));
            }
        };
        for action in &self.actions {
            step(guarded(|| action.after_group(&self.name)));
        }
        step(guarded(extra));
        for (_, hook) in &self.after_class {
            step(guarded(|| hook()));
        }
        thrown.map_or(Ok(()), Err)
    }
}

/// Wrap a hook failure so the whole group is skipped with a reason naming the hook.
pub(crate) fn before_class_failure(hook: &str, e: Exception) -> Exception {
    if e.is_instance_of(&PREREQUISITES_NOT_MET) {
        return e;
    }
    Exception::prerequisites_not_met(format!("Exception in beforeClass method {hook}")).with_cause(e)
}

fn resolve_config(class: &str, method: &str, config: &TestConfig) -> ConfigResult<ResolvedConfig> {
    let expectation = match &config.expectation {
        None => None,
        Some((kind, message)) => {
            let pattern = match message {
                None => None,
                Some(message) => Some(MessagePattern::parse(message).map_err(|reason| {
                    ConfigError::InvalidPattern {
                        class: class.to_string(),
                        method: method.to_string(),
                        pattern: message.clone(),
                        reason,
                    }
                })?),
            };
            Some(Expectation::new(*kind, pattern))
        }
    };
    Ok(ResolvedConfig {
        ignored: config.ignored.clone(),
        expectation,
        time_limit: config.time_limit,
    })
}

fn resolve_values<T>(class: &TestClass<T>, method: &str, spec: &ValuesSpec) -> ConfigResult<ResolvedValues<T>> {
    let (reference, args) = match spec {
        ValuesSpec::List(items) => return Ok(ResolvedValues::Rows(rows_from_list(items.clone()))),
        ValuesSpec::Map(map) => return Ok(ResolvedValues::Rows(rows_from_map(map))),
        ValuesSpec::Source { reference, args } => (reference, args.clone()),
    };

    let unknown = || ConfigError::UnknownValuesSource {
        class: class.name.clone(),
        method: method.to_string(),
        reference: reference.clone(),
    };

    match SourceRef::parse(reference) {
        SourceRef::Instance(name) => class
            .instance_providers
            .get(&name)
            .map(|provider| ResolvedValues::Instance {
                provider: provider.clone(),
                args,
            })
            .ok_or_else(unknown),
        SourceRef::SelfStatic(name) => class
            .static_providers
            .get(&name)
            .map(|provider| ResolvedValues::Static {
                provider: provider.clone(),
                args,
            })
            .ok_or_else(unknown),
        SourceRef::Class { class: owner, method: name } => {
            let provider = if owner == class.name {
                class.static_providers.get(&name).cloned()
            } else {
                class.registry.as_ref().and_then(|registry| registry.get(&owner, &name))
            };
            provider
                .map(|provider| ResolvedValues::Static { provider, args })
                .ok_or_else(unknown)
        }
    }
}
