//! Per-invocation execution context.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Parsed option values keyed by option key (`--dry-run` becomes `dry-run`).
pub type Options = BTreeMap<String, Value>;

/// Ephemeral record passed by reference to every hook of a single invocation.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Canonical name of the command being run.
    pub name: String,
    /// Parsed option values.
    pub options: Options,
    /// Positional arguments, in order.
    pub args: Vec<String>,
    /// When the invocation started.
    pub start_time: DateTime<Utc>,
}

impl ExecutionContext {
    /// Create a fresh context stamped with the current time.
    pub fn new(name: impl Into<String>, options: Options, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            options,
            args,
            start_time: Utc::now(),
        }
    }

    /// Look up an option as a string, if it was given as one.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    /// Whether a boolean flag was set.
    pub fn flag(&self, key: &str) -> bool {
        self.options
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Wall-clock time since the invocation started.
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.start_time
    }
}
