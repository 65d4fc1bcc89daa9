//! Plugins defined by `*.plugin.json` manifests.
//!
//! # Example manifest
//!
//! ```json
//! {
//!   "name": "audit",
//!   "priority": 20,
//!   "before": "./scripts/audit-start.sh {{command}}",
//!   "after": "./scripts/audit-end.sh {{command}}"
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::commands::manifest::validate_name;
use crate::error::{CliflowError, Result};
use crate::lifecycle::ExecutionContext;
use crate::utils::shell;

use super::types::{Plugin, PluginDescriptor, DEFAULT_PRIORITY};

/// Parsed `*.plugin.json` manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin name. Defaults to the file name without its suffix.
    #[serde(default)]
    pub name: Option<String>,

    /// Lower values run earlier.
    #[serde(default = "default_priority")]
    pub priority: i64,

    /// Replace an already-installed plugin with the same name.
    #[serde(default)]
    pub force: bool,

    /// Shell template run before the command.
    #[serde(default)]
    pub before: Option<String>,

    /// Shell template run after the command.
    #[serde(default)]
    pub after: Option<String>,

    /// Extra environment variables for the hook scripts.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            name: None,
            priority: DEFAULT_PRIORITY,
            force: false,
            before: None,
            after: None,
            env: HashMap::new(),
        }
    }
}

/// Validate a plugin manifest after its name has been resolved.
///
/// A plugin must define at least one non-empty hook, and every hook template
/// must be free of shell chaining operators.
pub fn validate_plugin_manifest(name: &str, manifest: &PluginManifest) -> Result<()> {
    validate_name(name, "plugin")?;

    let hooks: Vec<&String> = [&manifest.before, &manifest.after]
        .into_iter()
        .flatten()
        .filter(|h| !h.trim().is_empty())
        .collect();

    if hooks.is_empty() {
        return Err(CliflowError::InvalidDefinition(format!(
            "Plugin '{}' must define a before or after hook",
            name
        )));
    }

    for hook in hooks {
        shell::validate_template(hook, name)?;
    }

    Ok(())
}

/// Turn a manifest into a plugin descriptor.
pub fn plugin_descriptor(
    manifest: PluginManifest,
    fallback_name: &str,
    base_dir: &Path,
) -> Result<PluginDescriptor> {
    let name = manifest
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| fallback_name.to_string());
    validate_plugin_manifest(&name, &manifest)?;

    let priority = manifest.priority;
    let force = manifest.force;
    let manifest = Arc::new(manifest);
    let working_dir = base_dir.to_path_buf();

    Ok(PluginDescriptor::new(name, move || ShellPlugin {
        manifest: manifest.clone(),
        working_dir: working_dir.clone(),
    })
    .with_priority(priority)
    .with_force(force))
}

/// Parse and validate a plugin manifest file's contents.
pub fn parse_plugin_manifest(
    content: &str,
    fallback_name: &str,
    base_dir: &Path,
) -> Result<PluginDescriptor> {
    let manifest: PluginManifest = serde_json::from_str(content)?;
    plugin_descriptor(manifest, fallback_name, base_dir)
}

/// Plugin whose hooks are a manifest's shell templates.
pub struct ShellPlugin {
    manifest: Arc<PluginManifest>,
    working_dir: PathBuf,
}

impl ShellPlugin {
    fn run_hook(&self, template: Option<&String>, ctx: &ExecutionContext) -> Result<()> {
        let Some(template) = template.filter(|t| !t.trim().is_empty()) else {
            return Ok(());
        };
        let script = shell::render_template(template, ctx);
        shell::run_script(&script, Some(&self.working_dir), &self.manifest.env)
            .map_err(|e| CliflowError::Hook(e.to_string()))
    }
}

impl Plugin for ShellPlugin {
    fn before_execute(&self, ctx: &ExecutionContext) -> Result<()> {
        self.run_hook(self.manifest.before.as_ref(), ctx)
    }

    fn after_execute(&self, ctx: &ExecutionContext) -> Result<()> {
        self.run_hook(self.manifest.after.as_ref(), ctx)
    }
}
