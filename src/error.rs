//! Error types for cliflow
//!
//! This module defines all error types used throughout the framework.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use std::fmt;

use thiserror::Error;

/// What kind of unit a registration conflict is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Command,
    Plugin,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Command => write!(f, "Command"),
            UnitKind::Plugin => write!(f, "Plugin"),
        }
    }
}

/// The primary error type for cliflow operations.
#[derive(Error, Debug)]
pub enum CliflowError {
    /// A command or plugin with the same name is already registered and the
    /// new registration did not ask to override it.
    #[error("{kind} '{name}' already exists.")]
    DuplicateRegistration { kind: UnitKind, name: String },

    /// A command or plugin definition failed its conformance check
    /// (missing name, empty body, unsafe shell template, etc.)
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// Missing required option or custom validator rejection.
    ///
    /// The message is reported verbatim so validator output reaches the user
    /// unchanged.
    #[error("{0}")]
    Validation(String),

    /// Failure raised by a command body.
    #[error("Execution failed: {0}")]
    Execution(String),

    /// Failure raised by a before/after hook.
    #[error("Hook failed: {0}")]
    Hook(String),

    /// Command manifest could not be loaded during discovery.
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Configuration-related errors (invalid config file, bad env override, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The command line could not be parsed (unknown command, bad flag, etc.)
    #[error("{0}")]
    Usage(String),

    /// Command or plugin not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliflowError {
    /// Build a registration conflict for a command.
    pub fn duplicate_command(name: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            kind: UnitKind::Command,
            name: name.into(),
        }
    }

    /// Build a registration conflict for a plugin.
    pub fn duplicate_plugin(name: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            kind: UnitKind::Plugin,
            name: name.into(),
        }
    }
}

/// A specialized `Result` type for cliflow operations.
pub type Result<T> = std::result::Result<T, CliflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_command_display() {
        let err = CliflowError::duplicate_command("greet");
        assert_eq!(err.to_string(), "Command 'greet' already exists.");
    }

    #[test]
    fn test_duplicate_plugin_display() {
        let err = CliflowError::duplicate_plugin("logger");
        assert_eq!(err.to_string(), "Plugin 'logger' already exists.");
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = CliflowError::Validation("Mode must be development or production".into());
        assert_eq!(err.to_string(), "Mode must be development or production");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CliflowError = io_err.into();
        assert!(matches!(err, CliflowError::Io(_)));
    }

    #[test]
    fn test_error_variants() {
        // Ensure all variants can be created
        let _ = CliflowError::InvalidDefinition("test".into());
        let _ = CliflowError::Execution("test".into());
        let _ = CliflowError::Hook("test".into());
        let _ = CliflowError::Discovery("test".into());
        let _ = CliflowError::Config("test".into());
        let _ = CliflowError::NotFound("test".into());
        let _ = CliflowError::Usage("test".into());
    }
}
