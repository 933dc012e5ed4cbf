//! Configuration errors raised while constructing test groups.
//!
//! These are static validation failures: they surface when a group is built, never while it runs.
//! Each variant carries a `miette` diagnostic code and help text so the CLI can render it with context.

use miette::Diagnostic;
use thiserror::Error;

/// A test class that cannot be turned into a runnable group.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("{class}::{method} collides with a reserved lifecycle method name")]
    #[diagnostic(
        code(verity::config::reserved_name),
        help("`set_up`, `tear_down` and `name` are lifecycle hooks; rename the test method")
    )]
    ReservedName { class: String, method: String },

    #[error("{class} declares test method `{method}` more than once")]
    #[diagnostic(code(verity::config::duplicate_method))]
    DuplicateMethod { class: String, method: String },

    #[error("{class} has no test method named `{method}`")]
    #[diagnostic(code(verity::config::unknown_method))]
    UnknownMethod { class: String, method: String },

    #[error("invalid expected-message pattern `{pattern}` on {class}::{method}: {reason}")]
    #[diagnostic(
        code(verity::config::invalid_pattern),
        help("patterns starting with `/` are regular expressions written as `/pattern/flags`")
    )]
    InvalidPattern {
        class: String,
        method: String,
        pattern: String,
        reason: String,
    },

    #[error("values source `{reference}` on {class}::{method} cannot be resolved")]
    #[diagnostic(
        code(verity::config::unknown_values_source),
        help("register the provider on the class, or for `Class::method` in a shared ProviderRegistry")
    )]
    UnknownValuesSource {
        class: String,
        method: String,
        reference: String,
    },

    #[error("unsupported values specification: {0}")]
    #[diagnostic(code(verity::config::invalid_values))]
    InvalidValues(String),
}

/// Result type for group construction.
pub type ConfigResult<T> = Result<T, ConfigError>;
