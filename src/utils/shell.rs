//! Shell template handling for manifest-defined commands and plugins.
//!
//! Templates use `{{key}}` placeholders. Option values, positional arguments
//! and the command name are interpolated single-quoted, and templates may
//! not contain shell chaining operators, so a manifest can only ever run the
//! one program it names.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::commands::options::value_to_string;
use crate::error::{CliflowError, Result};
use crate::lifecycle::ExecutionContext;

/// Check a template for dangerous shell operators.
///
/// Rejects templates containing `&&`, `||`, `;`, `|`, or backticks.
pub fn validate_template(template: &str, owner: &str) -> Result<()> {
    let dangerous_patterns: &[(&str, &str)] = &[
        ("&&", "command chaining (&&)"),
        ("||", "conditional chaining (||)"),
        (";", "command separator (;)"),
        ("`", "backtick execution"),
        ("$(", "command substitution ($())"),
    ];

    for (pattern, description) in dangerous_patterns {
        if template.contains(pattern) {
            return Err(CliflowError::InvalidDefinition(format!(
                "'{}' contains dangerous pattern: {}",
                owner, description
            )));
        }
    }

    // `||` is caught above, so any `|` left is a pipe
    if template.contains('|') {
        return Err(CliflowError::InvalidDefinition(format!(
            "'{}' contains dangerous pattern: pipe operator (|)",
            owner
        )));
    }

    Ok(())
}

/// Quote a value for POSIX `sh`.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Interpolate `{{key}}` placeholders from the execution context.
///
/// - `{{command}}`: the command name
/// - `{{args}}`: every positional argument, each quoted
/// - `{{<option>}}`: the option value, quoted
///
/// Unknown placeholders render as an empty quoted string.
pub fn render_template(template: &str, ctx: &ExecutionContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..start]);

        let key = rest[start + 2..start + 2 + len].trim();
        let rendered = match key {
            "command" => shell_quote(&ctx.name),
            "args" => ctx
                .args
                .iter()
                .map(|a| shell_quote(a))
                .collect::<Vec<_>>()
                .join(" "),
            _ => shell_quote(
                &ctx.options
                    .get(key)
                    .map(value_to_string)
                    .unwrap_or_default(),
            ),
        };
        out.push_str(&rendered);
        rest = &rest[start + 2 + len + 2..];
    }

    out.push_str(rest);
    out
}

/// Run a rendered script with `sh -c`, failing on a non-zero exit status.
pub fn run_script(
    script: &str,
    working_dir: Option<&Path>,
    env: &HashMap<String, String>,
) -> Result<()> {
    debug!(script = %script, "Running shell script");

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(script).envs(env);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let status = cmd.status()?;
    if !status.success() {
        return Err(CliflowError::Execution(match status.code() {
            Some(code) => format!("'{}' exited with status {}", script, code),
            None => format!("'{}' was terminated by a signal", script),
        }));
    }

    Ok(())
}
