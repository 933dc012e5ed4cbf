use verity_core::Exception;

use super::definition::{TestCase, TestClass};
use super::suite::Suite;
use super::TestGroup;
use crate::error::ConfigResult;
use crate::test::TestUnit;

/// Runs every test method of a class on a fresh instance.
///
/// Variations of one method share that method's instance.
pub struct ClassGroup<T> {
    suite: Suite<T>,
}

impl<T: TestCase> ClassGroup<T> {
    pub fn new(class: TestClass<T>) -> ConfigResult<Self> {
        Ok(Self {
            suite: Suite::resolve(class)?,
        })
    }
}

impl<T: TestCase> TestGroup for ClassGroup<T> {
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
                .map(|method| self.suite.unit(method, self.suite.lazy_instance())),
        )
    }

    fn before(&self) -> Result<(), Exception> {
        self.suite.before(|| Ok(()))
    }

    fn after(&self) -> Result<(), Exception> {
        self.suite.after(|| Ok(()))
    }
}
