//! Expected-exception contracts.
//!
//! An [`Expectation`] names the exception type a test must raise and, optionally, a message pattern.
//! Message patterns are compiled once, when the owning group is constructed.
//!
//! ## Notes
//! - A configured message starting with `/` is a delimited regular expression: `/pattern/flags` with flags
//!   `i` (case-insensitive), `m` (multi-line), `s` (dot matches newline) and `x` (ignore whitespace).
//! - Any other message is a literal substring of the raised message. The empty literal matches everything.
//! - No message at all is a wildcard.

use std::fmt;

use regex::{Regex, RegexBuilder};
use verity_core::{Exception, ExceptionType};

/// A compiled expected-message pattern.
#[derive(Debug, Clone)]
pub enum MessagePattern {
    Literal(String),
    Regex { source: String, regex: Regex },
}

impl MessagePattern {
    /// Parse a configured message. Errors carry a human-readable reason.
    pub fn parse(pattern: &str) -> Result<Self, String> {
        let Some(body) = pattern.strip_prefix('/') else {
            return Ok(MessagePattern::Literal(pattern.to_string()));
        };
        let Some(end) = body.rfind('/') else {
            return Err("missing closing `/` delimiter".to_string());
        };

        let mut builder = RegexBuilder::new(&body[..end]);
        for flag in body[end + 1..].chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                other => return Err(format!("unsupported flag `{other}`")),
            };
        }

        let regex = builder.build().map_err(|e| e.to_string())?;
        Ok(MessagePattern::Regex {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, message: &str) -> bool {
        match self {
            MessagePattern::Literal(literal) => message.contains(literal.as_str()),
            MessagePattern::Regex { regex, .. } => regex.is_match(message),
        }
    }
}

impl fmt::Display for MessagePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessagePattern::Literal(literal) => f.write_str(literal),
            MessagePattern::Regex { source, .. } => f.write_str(source),
        }
    }
}

/// Resolved expected-exception contract.
#[derive(Debug, Clone)]
pub struct Expectation {
    kind: &'static ExceptionType,
    message: Option<MessagePattern>,
}

impl Expectation {
    pub fn new(kind: &'static ExceptionType, message: Option<MessagePattern>) -> Self {
        Self { kind, message }
    }

    pub fn kind(&self) -> &'static ExceptionType {
        self.kind
    }

    pub fn message(&self) -> Option<&MessagePattern> {
        self.message.as_ref()
    }

    /// Whether `raised` is of the expected type (subtypes match).
    pub fn matches_type(&self, raised: &Exception) -> bool {
        raised.is_instance_of(self.kind)
    }

    /// Whether `raised`'s message satisfies the pattern; always true without one.
    pub fn matches_message(&self, raised: &Exception) -> bool {
        self.message.as_ref().is_none_or(|pattern| pattern.is_match(raised.message()))
    }
}
