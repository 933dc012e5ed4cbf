//! CLI entry point for verity test binaries
//!
//! A test binary registers its groups and hands them to [`run`]:
//!
//! ```rust,no_run
//! use verity::group::{ClassGroup, TestCase, TestClass, TestGroup, TestMethod};
//!
//! struct Smoke;
//! impl TestCase for Smoke {}
//!
//! fn main() {
//!     verity::cli::run([ClassGroup::new(
//!         TestClass::new("Smoke", || Smoke).test(TestMethod::new("runs", |_: &mut Smoke, _| Ok(()))),
//!     )
//!     .map(|group| Box::new(group) as Box<dyn TestGroup>)]);
//! }
//! ```
//!
//! ## Flags
//!
//! - `-v` - One line per test
//! - `-x` / `--exitfirst` - Stop after the first failure or error
//! - `-k EXPR` - Only run tests whose name contains `EXPR`
//! - `--no-color` - Plain output
//!
//! ## Design
//!
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod console;

use std::fmt;
use std::io;
use std::process;
use std::rc::Rc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::RunConfig;
use crate::diagnostics::WarningCapture;
use crate::error::{ConfigError, ConfigResult};
use crate::group::TestGroup;
use crate::metrics::{ElapsedTime, SuccessRate};
use crate::result::TestResult;
use crate::runner::Runner;
use console::ConsoleListener;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// A test group could not be constructed.
    pub const CONFIG: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        CliError::new(format!("{:?}", miette::Report::new(error)), ExitCode::CONFIG)
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run the test groups registered in this binary
#[derive(Parser, Debug)]
#[command(name = "verity")]
#[command(version = VERSION)]
#[command(about = "Run the test groups registered in this binary", long_about = None)]
pub struct Cli {
    /// Verbose output (one line per test)
    #[arg(short, long)]
    pub verbose: bool,

    /// Stop on first failure
    #[arg(short = 'x', long = "exitfirst")]
    pub exit_first: bool,

    /// Only run tests matching this keyword
    #[arg(short = 'k', value_name = "EXPR")]
    pub keyword: Option<String>,

    /// Disable ANSI colours
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        let config = RunConfig::new()
            .with_verbose(self.verbose)
            .with_color(!self.no_color)
            .with_stop_on_failure(self.exit_first);
        match &self.keyword {
            Some(keyword) => config.with_filter(keyword.clone()),
            None => config,
        }
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Install the tracing subscriber: formatted logs on stderr (`RUST_LOG`, default `info`) plus
/// [`WarningCapture`], which turns warnings logged by test code into test diagnostics.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).with_filter(filter))
        .with(WarningCapture)
        .try_init();
}

/// Main entry point of a test binary.
///
/// This is the only place where `process::exit` is called. Panics contained by the engine are not
/// printed; they appear in the report instead.
pub fn run<I>(groups: I)
where
    I: IntoIterator<Item = ConfigResult<Box<dyn TestGroup>>>,
{
    let cli = Cli::parse();
    init_tracing();
    crate::guard::silence_contained_panics();

    match execute(&cli, groups) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Build the groups, run them through a console listener and map the result to an exit code.
pub fn execute<I>(cli: &Cli, groups: I) -> CliResult<ExitCode>
where
    I: IntoIterator<Item = ConfigResult<Box<dyn TestGroup>>>,
{
    let groups = groups.into_iter().collect::<ConfigResult<Vec<_>>>()?;
    let config = cli.run_config();

    let collected = groups
        .iter()
        .flat_map(|group| group.tests())
        .filter(|unit| config.selects(&unit.id().to_string()))
        .count();
    if collected == 0 {
        eprintln!("No tests collected");
        return Ok(ExitCode::SUCCESS); // "no tests collected" is not a failure
    }

    let mut runner = Runner::new()
        .with_config(config.clone())
        .with_listener(ConsoleListener::stderr(&config));
    runner.add_metric("elapsed", Rc::new(ElapsedTime));
    runner.add_metric("success rate", Rc::new(SuccessRate));

    let groups: Vec<&dyn TestGroup> = groups.iter().map(|group| &**group).collect();
    let result = runner.all(&groups);
    exit_code(&result)
}

/// Failures and errors fail the run; warnings and skips do not.
pub fn exit_code(result: &TestResult) -> CliResult<ExitCode> {
    let failed = result
        .failed()
        .filter(|outcome| !outcome.kind().is_warning())
        .count();
    if failed > 0 {
        // Tests failed - return error with empty message (summary already printed)
        Err(CliError::failure(""))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
