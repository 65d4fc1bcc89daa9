//! Option flag parsing and option validation.

use serde_json::Value;

use crate::error::{CliflowError, Result};
use crate::lifecycle::{Options, POSITIONAL_ARGS};

use super::types::{CommandArgs, OptionSpec};

/// Option keys the parser reserves for itself on every sub-command.
const RESERVED_KEYS: &[&str] = &["help", POSITIONAL_ARGS];

/// Short flag the parser reserves for `--help`.
const RESERVED_SHORT: char = 'h';

/// Value placeholder found in a flag string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Text between the brackets.
    pub name: &'a str,
    /// `[value]` rather than `<value>`.
    pub optional: bool,
}

/// The `--long` part of a flag string, or the last segment if none.
fn long_segment(flags: &str) -> &str {
    let segments: Vec<&str> = flags.split(',').map(str::trim).collect();
    segments
        .iter()
        .copied()
        .find(|s| s.starts_with("--"))
        .or_else(|| segments.last().copied())
        .unwrap_or("")
}

/// Derive the parsed-options key from a flag string by stripping leading
/// dashes and any trailing placeholder tokens.
pub fn option_key(flags: &str) -> String {
    long_segment(flags)
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_start_matches('-')
        .to_string()
}

/// The value placeholder of a flag string, if it takes a value.
pub fn placeholder(flags: &str) -> Option<Placeholder<'_>> {
    flags.split_whitespace().find_map(|token| {
        if let Some(inner) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            Some(Placeholder {
                name: inner,
                optional: false,
            })
        } else {
            token
                .strip_prefix('[')
                .and_then(|t| t.strip_suffix(']'))
                .map(|inner| Placeholder {
                    name: inner,
                    optional: true,
                })
        }
    })
}

/// Short form written inline in a flag string (`-m, --mode`).
pub fn short_flag(flags: &str) -> Option<char> {
    flags.split(',').map(str::trim).find_map(|segment| {
        let token = segment.split_whitespace().next()?;
        if token.starts_with("--") {
            return None;
        }
        let mut chars = token.strip_prefix('-')?.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        }
    })
}

/// Check that a command's option specs can all be bound side by side.
///
/// Every option needs a key; keys and short flags must be unique within the
/// command and must not clash with `--help`/`-h` or the positional
/// arguments slot.
pub fn check_option_specs(command: &str, specs: &[OptionSpec]) -> Result<()> {
    let mut keys: Vec<String> = Vec::new();
    let mut shorts: Vec<char> = Vec::new();

    for spec in specs {
        let key = spec.key();
        if key.is_empty() {
            return Err(CliflowError::InvalidDefinition(format!(
                "Command '{}' has an option with invalid flags '{}'",
                command, spec.flags
            )));
        }
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(CliflowError::InvalidDefinition(format!(
                "Command '{}' declares reserved option '--{}'",
                command, key
            )));
        }
        if keys.contains(&key) {
            return Err(CliflowError::InvalidDefinition(format!(
                "Command '{}' declares option '--{}' twice",
                command, key
            )));
        }

        if let Some(short) = spec.short() {
            if !short.is_ascii_alphanumeric() {
                return Err(CliflowError::InvalidDefinition(format!(
                    "Command '{}' gives '--{}' an invalid short flag '{}'",
                    command, key, short
                )));
            }
            if short == RESERVED_SHORT {
                return Err(CliflowError::InvalidDefinition(format!(
                    "Command '{}' gives '--{}' the short flag '-{}', which is reserved for --help",
                    command, key, short
                )));
            }
            if shorts.contains(&short) {
                return Err(CliflowError::InvalidDefinition(format!(
                    "Command '{}' uses short flag '-{}' more than once",
                    command, short
                )));
            }
            shorts.push(short);
        }

        keys.push(key);
    }

    Ok(())
}

/// Check parsed options against a command's schema.
///
/// Required options are checked first, in declaration order; the first one
/// missing fails with a message naming its flag. Only when all are present
/// does the custom validator run, and its message is returned verbatim.
pub fn validate_options(args: &CommandArgs, options: &Options) -> Result<()> {
    for spec in args.options.iter().filter(|s| s.required) {
        let key = spec.key();
        let present = matches!(options.get(&key), Some(v) if !v.is_null());
        if !present {
            return Err(CliflowError::Validation(format!(
                "Missing required option: --{}",
                key
            )));
        }
    }

    if let Some(validate) = &args.validate {
        if let Some(message) = validate(options) {
            return Err(CliflowError::Validation(message));
        }
    }

    Ok(())
}

/// Render an option value the way it was given on the command line.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
