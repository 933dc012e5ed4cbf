//! Console listener (pytest-style output)
//!
//! Terse mode prints one letter per test (`.FEWSN`), verbose mode one line per test. Both end with a
//! FAILURES section listing failures, errors and warnings with their cause chains, and a summary line.

use std::io::{self, Write};

use crate::config::RunConfig;
use crate::listener::Listener;
use crate::outcome::{Event, Outcome, OutcomeKind};
use crate::result::TestResult;
use crate::test::TestId;

const BOLD: &str = "\x1b[1m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Writes run progress and a final report to `out`.
pub struct ConsoleListener<W: Write> {
    out: W,
    verbose: bool,
    color: bool,
}

impl ConsoleListener<io::Stderr> {
    pub fn stderr(config: &RunConfig) -> Self {
        Self::new(io::stderr(), config)
    }
}

impl<W: Write> ConsoleListener<W> {
    pub fn new(out: W, config: &RunConfig) -> Self {
        Self {
            out,
            verbose: config.verbose,
            color: config.color,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{style}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    // Console output is best effort; a closed stream must not abort the run.
    fn emit(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn outcome(&mut self, outcome: &Outcome) {
        let kind = outcome.kind();
        let style = match kind.event() {
            Event::Succeeded => GREEN,
            Event::Failed | Event::Error => RED,
            Event::Warning | Event::Skipped | Event::NotRun => YELLOW,
        };

        let text = if self.verbose {
            let status = self.paint(style, status_label(kind));
            match kind {
                OutcomeKind::NotRun(reason) => format!("{status} ({reason})\n"),
                OutcomeKind::Skipped(reason) => format!("{status} ({reason})\n"),
                _ => format!("{status} ({}ms)\n", outcome.elapsed().as_millis()),
            }
        } else {
            self.paint(style, &kind.code().to_string())
        };
        self.emit(&text);
    }

    fn report_failures(&mut self, result: &TestResult) {
        let failures: Vec<&Outcome> = result.failed().collect();
        if failures.is_empty() {
            return;
        }

        let mut text = format!("\n{}\n", self.paint(BOLD_RED, "=================== FAILURES ==================="));
        for outcome in failures {
            text.push_str(&format!("\n{}\n\n", self.paint(BOLD, &format!("___________ {} ___________", outcome.test()))));
            match outcome.kind() {
                OutcomeKind::Warning(messages) => {
                    for message in messages {
                        text.push_str(&format!("    warning: {message}\n"));
                    }
                }
                kind => {
                    if let Some(reason) = kind.reason() {
                        text.push_str(&format!("    {}: {}\n", reason.kind().name(), reason.message()));
                        for cause in reason.chain().skip(1) {
                            text.push_str(&format!("    caused by {}: {}\n", cause.kind().name(), cause.message()));
                        }
                    }
                }
            }
        }
        self.emit(&text);
    }

    fn summary(&self, result: &TestResult) -> String {
        let (mut failed, mut errors, mut warnings) = (0, 0, 0);
        for outcome in result.failed() {
            match outcome.kind().event() {
                Event::Error => errors += 1,
                Event::Warning => warnings += 1,
                _ => failed += 1,
            }
        }
        let (mut skipped, mut not_run) = (0, 0);
        for outcome in result.skipped() {
            match outcome.kind() {
                OutcomeKind::NotRun(_) => not_run += 1,
                _ => skipped += 1,
            }
        }

        let parts: Vec<String> = [
            (result.success_count(), "passed"),
            (failed, "failed"),
            (errors, "errors"),
            (warnings, "warnings"),
            (skipped, "skipped"),
            (not_run, "not run"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{count} {label}"))
        .collect();

        let style = if failed + errors > 0 { BOLD_RED } else { BOLD_GREEN };
        self.paint(
            style,
            &format!(
                "=================== {} in {:.2}s ===================",
                parts.join(", "),
                result.elapsed().as_secs_f64()
            ),
        )
    }
}

fn status_label(kind: &OutcomeKind) -> &'static str {
    match kind {
        OutcomeKind::Succeeded => "PASSED",
        OutcomeKind::ExpectationMet => "PASSED",
        OutcomeKind::Failed(_) => "FAILED",
        OutcomeKind::Errored(_) => "ERROR",
        OutcomeKind::Warning(_) => "WARNING",
        OutcomeKind::Skipped(_) => "SKIPPED",
        OutcomeKind::NotRun(_) => "NOT RUN",
    }
}

impl<W: Write> Listener for ConsoleListener<W> {
    fn test_run_started(&mut self, num_tests: usize) {
        let header = self.paint(BOLD, "=================== test session starts ===================");
        self.emit(&format!("{header}\ncollected {num_tests} item(s)\n\n"));
    }

    fn test_run_finished(&mut self, result: &TestResult) {
        if !self.verbose && !result.is_empty() {
            self.emit("\n");
        }
        self.report_failures(result);
        let mut text = String::from("\n");
        for (name, value) in result.formatted_metrics() {
            text.push_str(&format!("{name}: {value}\n"));
        }
        text.push_str(&self.summary(result));
        text.push('\n');
        self.emit(&text);
    }

    fn test_started(&mut self, test: &TestId) {
        if self.verbose {
            self.emit(&format!("{test} ... "));
        }
    }

    fn test_succeeded(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }

    fn test_failed(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }

    fn test_error(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }

    fn test_warning(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }

    fn test_skipped(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }

    fn test_not_run(&mut self, outcome: &Outcome) {
        self.outcome(outcome);
    }
}
