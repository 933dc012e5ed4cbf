use std::cell::RefCell;
use std::rc::Rc;

use verity_core::Exception;

use super::definition::{TestCase, TestClass};
use super::suite::{Instance, Suite, before_class_failure};
use super::TestGroup;
use crate::error::ConfigResult;
use crate::guard::guarded;
use crate::test::TestUnit;

type InstanceHook<T> = Box<dyn Fn(&mut T) -> Result<(), Exception>>;

/// Runs every test method of a class on one shared instance.
///
/// Besides the class hooks, `before` and `after` run lifecycle hooks on the shared instance:
/// `before_all` hooks after the class's `before_class` hooks, `after_all` hooks before its `after_class` hooks.
pub struct InstanceGroup<T> {
    suite: Suite<T>,
    instance: Rc<RefCell<T>>,
    before_all: Vec<(String, InstanceHook<T>)>,
    after_all: Vec<(String, InstanceHook<T>)>,
}

impl<T: TestCase> InstanceGroup<T> {
    /// Build the group and its shared instance.
    pub fn new(class: TestClass<T>) -> ConfigResult<Self> {
        let suite = Suite::resolve(class)?;
        let instance = suite.instantiate();
        Ok(Self {
            suite,
            instance,
            before_all: Vec::new(),
            after_all: Vec::new(),
        })
    }

    pub fn before_all<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut T) -> Result<(), Exception> + 'static,
    {
        self.before_all.push((name.into(), Box::new(hook)));
        self
    }

    pub fn after_all<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut T) -> Result<(), Exception> + 'static,
    {
        self.after_all.push((name.into(), Box::new(hook)));
        self
    }

    /// The shared instance.
    pub fn instance(&self) -> &Rc<RefCell<T>> {
        &self.instance
    }
}

impl<T: TestCase> TestGroup for InstanceGroup<T> {
    fn reflect(&self) -> &str {
        &self.suite.name
    }

    fn num_tests(&self) -> usize {
        self.suite.methods.len()
    }

    fn tests(&self) -> Box<dyn Iterator<Item = TestUnit> + '_> {
        Box::new(
            self.suite
                .methods
                .iter()
                .map(|method| self.suite.unit(method, Instance::shared(self.instance.clone()))),
        )
    }

    fn before(&self) -> Result<(), Exception> {
        self.suite.before(|| {
            for (name, hook) in &self.before_all {
                guarded(|| hook(&mut *self.instance.borrow_mut())).map_err(|e| before_class_failure(name, e))?;
            }
            Ok(())
        })
    }

    fn after(&self) -> Result<(), Exception> {
        self.suite.after(|| {
            let mut thrown: Option<Exception> = None;
            for (_, hook) in &self.after_all {
                if let Err(e) = guarded(|| hook(&mut *self.instance.borrow_mut())) {
                    thrown = Some(e.caused_by(thrown.take()));
                }
            }
            thrown.map_or(Ok(()), Err)
        })
    }
}
