use verity_core::Exception;

use super::definition::{TestCase, TestClass};
use super::suite::Suite;
use super::TestGroup;
use crate::error::{ConfigError, ConfigResult};
use crate::test::TestUnit;

/// Runs a single named test method of a class. Class hooks still run around it.
pub struct MethodGroup<T> {
    suite: Suite<T>,
    index: usize,
}

impl<T: TestCase> MethodGroup<T> {
    pub fn new(class: TestClass<T>, method: &str) -> ConfigResult<Self> {
        let suite = Suite::resolve(class)?;
        let Some(index) = suite.methods.iter().position(|m| m.id().method() == method) else {
            return Err(ConfigError::UnknownMethod {
                class: suite.name,
                method: method.to_string(),
            });
        };
        Ok(Self { suite, index })
    }
}

impl<T: TestCase> TestGroup for MethodGroup<T> {
    fn reflect(&self) -> &str {
        &self.suite.name
    }

    fn num_tests(&self) -> usize {
        1
    }

    fn tests(&self) -> Box<dyn Iterator<Item = TestUnit> + '_> {
        let method = &self.suite.methods[self.index];
        Box::new(std::iter::once(self.suite.unit(method, self.suite.lazy_instance())))
    }

    fn before(&self) -> Result<(), Exception> {
        self.suite.before(|| Ok(()))
    }

    fn after(&self) -> Result<(), Exception> {
        self.suite.after(|| Ok(()))
    }
}
