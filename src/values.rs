//! Data-driven variations ("values" providers)
//!
//! A test method may be expanded into several variations, one per row of arguments. Rows come from:
//!
//! - a literal list: each element is one row;
//! - a key→value mapping: each pair becomes the two-argument row `(key, value)`, in insertion order;
//! - a named source: `"method"` (provider on the test instance), `"self::method"` (static provider on the
//!   same class) or `"Class::method"` (static provider registered for another class), optionally with
//!   extra `args`. The returned sequence is treated like a literal list.
//!
//! An array element is a multi-parameter row; any other element is a single-parameter row.

use serde_json::{Map, Value};

use crate::error::ConfigError;

/// One variation's arguments.
pub type Row = Vec<Value>;

/// Unresolved values specification, as attached to a test method.
#[derive(Debug, Clone, PartialEq)]
pub enum ValuesSpec {
    List(Vec<Value>),
    Map(Map<String, Value>),
    Source { reference: String, args: Vec<Value> },
}

impl ValuesSpec {
    /// A literal list of rows.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        ValuesSpec::List(items.into_iter().map(Into::into).collect())
    }

    /// A key→value mapping; rows are `(key, value)` pairs in insertion order.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        ValuesSpec::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// A named provider without extra arguments.
    pub fn source(reference: impl Into<String>) -> Self {
        ValuesSpec::Source {
            reference: reference.into(),
            args: Vec::new(),
        }
    }

    /// A named provider invoked with `args`.
    pub fn source_with_args<I, V>(reference: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        ValuesSpec::Source {
            reference: reference.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<Value> for ValuesSpec {
    type Error = ConfigError;

    /// Interpret an annotation-style value: array → list, string → named source,
    /// object with a `source` key → named source with optional `args`, any other object → mapping.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(items) => Ok(ValuesSpec::List(items)),
            Value::String(reference) => Ok(ValuesSpec::source(reference)),
            Value::Object(mut object) => match object.remove("source") {
                Some(Value::String(reference)) => {
                    let args = match object.remove("args") {
                        None => Vec::new(),
                        Some(Value::Array(args)) => args,
                        Some(other) => {
                            return Err(ConfigError::InvalidValues(format!(
                                "`args` must be an array, got {other}"
                            )));
                        }
                    };
                    Ok(ValuesSpec::Source { reference, args })
                }
                Some(other) => Err(ConfigError::InvalidValues(format!(
                    "`source` must be a string, got {other}"
                ))),
                None => Ok(ValuesSpec::Map(object)),
            },
            other => Err(ConfigError::InvalidValues(format!(
                "expected an array, a mapping or a source name, got {other}"
            ))),
        }
    }
}

/// Where a named values source lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// `"method"`: provider on the test instance.
    Instance(String),
    /// `"self::method"`: static provider on the declaring class.
    SelfStatic(String),
    /// `"Class::method"`: static provider registered for another class.
    Class { class: String, method: String },
}

impl SourceRef {
    pub fn parse(reference: &str) -> Self {
        if let Some(method) = reference.strip_prefix("self::") {
            SourceRef::SelfStatic(method.to_string())
        } else if let Some((class, method)) = reference.split_once("::") {
            SourceRef::Class {
                class: class.to_string(),
                method: method.to_string(),
            }
        } else {
            SourceRef::Instance(reference.to_string())
        }
    }
}

/// Turn a provider's sequence into rows: arrays spread, scalars wrap.
pub fn rows_from_list(items: Vec<Value>) -> Vec<Row> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Array(args) => args,
            scalar => vec![scalar],
        })
        .collect()
}

/// Turn a mapping into `(key, value)` rows.
pub fn rows_from_map(map: &Map<String, Value>) -> Vec<Row> {
    map.iter()
        .map(|(key, value)| vec![Value::String(key.clone()), value.clone()])
        .collect()
}

/// Render arguments for display names and identity hashes.
pub fn render_args(args: &[Value]) -> String {
    args.iter().map(Value::to_string).collect::<Vec<_>>().join(", ")
}
