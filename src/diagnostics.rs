//! Diagnostics registry: non-fatal warnings attributable to the running test.
//!
//! The runner clears the registry before each variation, reads it after the body has run and clears it
//! again once the outcome is recorded. A variation that raised diagnostics but otherwise succeeded is
//! classified as a warning.
//!
//! The registry is injected into the runner as an `Rc<dyn Diagnostics>`. The default, [`ThreadDiagnostics`],
//! is backed by a thread-local buffer fed from two places:
//!
//! - [`raise`], for code that wants to report a diagnostic directly;
//! - [`WarningCapture`], a `tracing_subscriber` layer that records `WARN` and `ERROR` events emitted while a
//!   test runs.

use std::cell::RefCell;
use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Sink of diagnostics raised during a test.
pub trait Diagnostics {
    fn clear(&self);

    /// Everything raised since the last `clear`, in order.
    fn raised(&self) -> Vec<String>;

    fn drain(&self) -> Vec<String> {
        let raised = self.raised();
        self.clear();
        raised
    }
}

thread_local! {
    static RAISED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Report a diagnostic for the test running on this thread.
pub fn raise(message: impl Into<String>) {
    let message = message.into();
    RAISED.with(|raised| raised.borrow_mut().push(message));
}

/// Thread-local registry shared by [`raise`] and [`WarningCapture`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDiagnostics;

impl Diagnostics for ThreadDiagnostics {
    fn clear(&self) {
        RAISED.with(|raised| raised.borrow_mut().clear());
    }

    fn raised(&self) -> Vec<String> {
        RAISED.with(|raised| raised.borrow().clone())
    }
}

/// Records `WARN` and `ERROR` events as diagnostics of the running test.
///
/// Events from the framework's own targets are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarningCapture;

const OWN_CRATES: &[&str] = &["verity", "verity_core"];

fn is_own_target(target: &str) -> bool {
    let krate = target.split("::").next().unwrap_or(target);
    OWN_CRATES.contains(&krate)
}

impl<S: Subscriber> Layer<S> for WarningCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > Level::WARN || is_own_target(metadata.target()) {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        raise(format!("{} {}: {}", metadata.level(), metadata.target(), visitor.message));
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_raise_and_drain() {
        let diagnostics = ThreadDiagnostics;
        diagnostics.clear();
        raise("deprecated call");
        raise("slow path");
        assert_eq!(diagnostics.drain(), vec!["deprecated call", "slow path"]);
        assert!(diagnostics.raised().is_empty());
    }

    #[test]
    fn test_capture_records_warnings_only() {
        let diagnostics = ThreadDiagnostics;
        diagnostics.clear();
        let subscriber = tracing_subscriber::registry().with(WarningCapture);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "calc", "not recorded");
            tracing::warn!(target: "calc", "division by zero");
            tracing::error!(target: "calc", value = 3, "overflow");
            tracing::warn!(target: "verity::runner", "internal");
        });
        assert_eq!(
            diagnostics.drain(),
            vec!["WARN calc: division by zero", "ERROR calc: overflow"]
        );
    }

    #[test]
    fn test_only_engine_crates_are_ignored() {
        let diagnostics = ThreadDiagnostics;
        diagnostics.clear();
        let subscriber = tracing_subscriber::registry().with(WarningCapture);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "verity", "engine");
            tracing::warn!(target: "verity_core::assert", "core");
            tracing::warn!(target: "verity_demo", "user crate");
            tracing::warn!(target: "verity_demo::ledger", "user module");
        });
        assert_eq!(
            diagnostics.drain(),
            vec!["WARN verity_demo: user crate", "WARN verity_demo::ledger: user module"]
        );
    }
}
