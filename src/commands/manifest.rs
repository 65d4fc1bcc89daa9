//! Commands defined by `*.command.json` manifests.
//!
//! A manifest declares the command's metadata and a shell template to run.
//!
//! # Example manifest
//!
//! ```json
//! {
//!   "name": "deploy",
//!   "description": "Deploy the current build",
//!   "aliases": ["d"],
//!   "group": "ops",
//!   "options": [
//!     { "flags": "--mode <mode>", "abbr": "m", "default": "development" },
//!     { "flags": "--target <target>", "required": true }
//!   ],
//!   "choices": { "mode": ["development", "production"] },
//!   "examples": ["cliflow deploy --target web --mode production"],
//!   "plugins": ["logger", "timer"],
//!   "run": "./scripts/deploy.sh {{target}} {{mode}}"
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CliflowError, Result};
use crate::lifecycle::{ExecutionContext, Options};
use crate::utils::shell;

use super::options::{self, value_to_string};
use super::types::{Command, CommandArgs, CommandDescriptor, OptionSpec, Validator};

/// Parsed `*.command.json` manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandManifest {
    /// Command name. Defaults to the file name without its suffix.
    #[serde(default)]
    pub name: Option<String>,

    /// Replace an already-registered command with the same name.
    #[serde(default)]
    pub force: bool,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub options: Vec<OptionSpec>,

    #[serde(default)]
    pub examples: Vec<String>,

    /// Plugins to run around this command.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Shell template run as the command body.
    pub run: String,

    /// Allowed values per option key. Becomes the command's validator.
    #[serde(default)]
    pub choices: BTreeMap<String, Vec<String>>,

    /// Absorb execution failures instead of propagating them.
    #[serde(default)]
    pub ignore_errors: bool,

    /// Working directory, relative to the manifest's directory.
    #[serde(default)]
    pub working_dir: Option<String>,

    /// Extra environment variables for the script.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Check that a name is usable as a command or plugin name.
pub(crate) fn validate_name(name: &str, kind: &str) -> Result<()> {
    let name_re = Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_:\-]{0,63}$")
        .map_err(|e| CliflowError::InvalidDefinition(e.to_string()))?;
    if !name_re.is_match(name) {
        return Err(CliflowError::InvalidDefinition(format!(
            "Invalid {} name '{}': must be 1-64 alphanumeric characters, hyphens, underscores or colons, starting with alphanumeric",
            kind, name
        )));
    }
    Ok(())
}

/// Validate a command manifest after its name has been resolved.
///
/// Checks:
/// - name pattern
/// - non-empty, safe `run` template
/// - option specs can be bound (see [`options::check_option_specs`])
/// - every `choices` key refers to a declared option
pub fn validate_command_manifest(name: &str, manifest: &CommandManifest) -> Result<()> {
    validate_name(name, "command")?;

    if manifest.run.trim().is_empty() {
        return Err(CliflowError::InvalidDefinition(format!(
            "Command '{}' has an empty run template",
            name
        )));
    }
    shell::validate_template(&manifest.run, name)?;

    options::check_option_specs(name, &manifest.options)?;
    let keys: Vec<String> = manifest.options.iter().map(OptionSpec::key).collect();

    for key in manifest.choices.keys() {
        if !keys.contains(key) {
            return Err(CliflowError::InvalidDefinition(format!(
                "Command '{}' has choices for undeclared option '--{}'",
                name, key
            )));
        }
    }

    Ok(())
}

/// Build a validator rejecting option values outside the allowed choices.
fn choices_validator(choices: BTreeMap<String, Vec<String>>) -> Validator {
    Arc::new(move |options: &Options| {
        for (key, allowed) in &choices {
            let Some(value) = options.get(key) else {
                continue;
            };
            let value = value_to_string(value);
            if !allowed.contains(&value) {
                return Some(format!(
                    "Invalid value '{}' for --{}: expected one of {}",
                    value,
                    key,
                    allowed.join(", ")
                ));
            }
        }
        None
    })
}

/// Turn a manifest into a command descriptor.
///
/// `fallback_name` is used when the manifest does not name itself; `base_dir`
/// anchors a relative `working_dir` (and is the default working directory).
pub fn command_descriptor(
    manifest: CommandManifest,
    fallback_name: &str,
    base_dir: &Path,
) -> Result<CommandDescriptor> {
    let name = manifest
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| fallback_name.to_string());
    validate_command_manifest(&name, &manifest)?;

    let mut args = CommandArgs {
        description: manifest.description.clone(),
        aliases: manifest.aliases.clone(),
        group: manifest.group.clone(),
        options: manifest.options.clone(),
        examples: manifest.examples.clone(),
        validate: None,
    };
    if !manifest.choices.is_empty() {
        args.validate = Some(choices_validator(manifest.choices.clone()));
    }

    let working_dir = match &manifest.working_dir {
        Some(dir) => base_dir.join(dir),
        None => base_dir.to_path_buf(),
    };
    let force = manifest.force;
    let plugins = manifest.plugins.clone();
    let manifest = Arc::new(manifest);

    Ok(CommandDescriptor::new(name, move || ShellCommand {
        manifest: manifest.clone(),
        working_dir: working_dir.clone(),
    })
    .with_args(args)
    .with_plugins(plugins)
    .with_force(force))
}

/// Parse and validate a command manifest file's contents.
pub fn parse_command_manifest(
    content: &str,
    fallback_name: &str,
    base_dir: &Path,
) -> Result<CommandDescriptor> {
    let manifest: CommandManifest = serde_json::from_str(content)?;
    command_descriptor(manifest, fallback_name, base_dir)
}

/// Command whose body is a manifest's shell template.
pub struct ShellCommand {
    manifest: Arc<CommandManifest>,
    working_dir: PathBuf,
}

impl Command for ShellCommand {
    fn execute(&mut self, ctx: &ExecutionContext) -> Result<()> {
        let script = shell::render_template(&self.manifest.run, ctx);
        shell::run_script(&script, Some(&self.working_dir), &self.manifest.env)
    }

    fn on_error(&mut self, error: &CliflowError, ctx: &ExecutionContext) -> bool {
        if self.manifest.ignore_errors {
            warn!(command = %ctx.name, error = %error, "Ignoring command failure");
            return true;
        }
        false
    }
}
