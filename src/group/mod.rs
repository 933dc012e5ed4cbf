//! Test groups
//!
//! A [`TestGroup`] is a lifecycle-scoped collection of test units sharing class-level setup and teardown.
//! The runner only sees this trait; three variants build it from a [`TestClass`] definition:
//!
//! - [`ClassGroup`]: every test method gets a fresh instance;
//! - [`InstanceGroup`]: all methods share one instance, with extra lifecycle hooks on it;
//! - [`MethodGroup`]: a single named method of a class.
//!
//! Construction validates the definition and fails with a [`ConfigError`](crate::error::ConfigError);
//! a constructed group never fails because of its configuration at run time.

mod class;
mod definition;
mod instance;
mod method;
mod suite;

pub use class::ClassGroup;
pub use definition::{ProviderRegistry, TestCase, TestClass, TestMethod};
pub use instance::InstanceGroup;
pub use method::MethodGroup;
pub use suite::RESERVED_NAMES;

use verity_core::Exception;

use crate::test::TestUnit;

/// A runnable collection of test units.
pub trait TestGroup {
    /// Name of the group, usually the test class name.
    fn reflect(&self) -> &str;

    /// Number of units `tests()` yields.
    fn num_tests(&self) -> usize;

    /// A fresh sequence of units. Every call re-creates units and re-derives their variations.
    fn tests(&self) -> Box<dyn Iterator<Item = TestUnit> + '_>;

    /// Runs once before any unit. A failure skips every unit; `after` is then not called.
    fn before(&self) -> Result<(), Exception> {
        Ok(())
    }

    /// Runs once after all units, whatever their outcomes.
    fn after(&self) -> Result<(), Exception> {
        Ok(())
    }
}

impl<G: TestGroup + ?Sized> TestGroup for Box<G> {
    fn reflect(&self) -> &str {
        (**self).reflect()
    }

    fn num_tests(&self) -> usize {
        (**self).num_tests()
    }

    fn tests(&self) -> Box<dyn Iterator<Item = TestUnit> + '_> {
        (**self).tests()
    }

    fn before(&self) -> Result<(), Exception> {
        (**self).before()
    }

    fn after(&self) -> Result<(), Exception> {
        (**self).after()
    }
}
