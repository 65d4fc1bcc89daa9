//! Command and plugin registry for cliflow
//!
//! This module provides the `Registry` struct holding every installed plugin
//! and every registered command descriptor. It enforces name uniqueness for
//! both (unless a registration explicitly asks to override) and keeps the
//! plugin list sorted by priority so that resolving a command's plugins
//! never needs a second sort.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::commands::options::check_option_specs;
use crate::commands::CommandDescriptor;
use crate::error::{CliflowError, Result};
use crate::plugins::{PluginDescriptor, PluginEntry};

/// Store of installed plugins and registered commands.
///
/// The registry maintains two collections:
/// - Plugin entries, sorted ascending by priority (stable: ties keep
///   insertion order)
/// - Command descriptors, keyed by name
///
/// Registration is single-writer: `&mut self` is required for every change.
///
/// # Example
///
/// ```rust
/// use cliflow::{CommandDescriptor, ExecutionContext, Plugin, PluginDescriptor, Registry};
///
/// struct Quiet;
/// impl Plugin for Quiet {}
///
/// struct Hello;
/// impl cliflow::Command for Hello {
///     fn execute(&mut self, _ctx: &ExecutionContext) -> cliflow::Result<()> {
///         Ok(())
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry
///     .install(PluginDescriptor::new("quiet", || Quiet))
///     .unwrap()
///     .use_command(CommandDescriptor::new("hello", || Hello))
///     .unwrap();
///
/// assert_eq!(registry.plugin_count(), 1);
/// assert_eq!(registry.command_count(), 1);
/// assert!(registry.use_command(CommandDescriptor::new("hello", || Hello)).is_err());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    /// Installed plugins, ascending by priority.
    plugins: Vec<PluginEntry>,

    /// Map from command name to its descriptor.
    commands: HashMap<String, CommandDescriptor>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a plugin.
    ///
    /// Instantiates the plugin once and re-sorts the plugin list by priority.
    ///
    /// # Errors
    /// `CliflowError::DuplicateRegistration` if a plugin with the same name is
    /// installed and the descriptor does not set `force`. With `force`, the
    /// previous entry is replaced.
    pub fn install(&mut self, descriptor: PluginDescriptor) -> Result<&mut Self> {
        if descriptor.name.trim().is_empty() {
            return Err(CliflowError::InvalidDefinition(
                "Plugin name must not be empty".to_string(),
            ));
        }

        if let Some(index) = self.plugins.iter().position(|p| p.name == descriptor.name) {
            if !descriptor.force {
                return Err(CliflowError::duplicate_plugin(&descriptor.name));
            }
            let replaced = self.plugins.remove(index);
            info!(plugin = %replaced.name, "Overriding installed plugin");
        }

        let instance = descriptor.instantiate();
        info!(
            plugin = %descriptor.name,
            priority = descriptor.priority,
            "Installed plugin"
        );

        self.plugins.push(PluginEntry {
            name: descriptor.name.clone(),
            priority: descriptor.priority,
            descriptor,
            instance,
        });
        // sort_by_key is stable, which keeps insertion order among equal priorities
        self.plugins.sort_by_key(|p| p.priority);

        Ok(self)
    }

    /// Register a command descriptor.
    ///
    /// Only the descriptor is stored; no instance is created until the
    /// command is bound.
    ///
    /// # Errors
    /// - `CliflowError::DuplicateRegistration` if a command with the same name
    ///   exists and the descriptor does not set `force`
    /// - `CliflowError::InvalidDefinition` if its options cannot be bound
    ///   together, or if its name or an alias is already used by another
    ///   command
    pub fn use_command(&mut self, descriptor: CommandDescriptor) -> Result<&mut Self> {
        if descriptor.name.trim().is_empty() {
            return Err(CliflowError::InvalidDefinition(
                "Command name must not be empty".to_string(),
            ));
        }

        let replacing = self.commands.contains_key(&descriptor.name);
        if replacing && !descriptor.force {
            return Err(CliflowError::duplicate_command(&descriptor.name));
        }
        check_option_specs(&descriptor.name, &descriptor.args.options)?;
        self.check_aliases(&descriptor)?;

        if replacing {
            info!(command = %descriptor.name, "Overriding registered command");
        }

        info!(
            command = %descriptor.name,
            plugins = descriptor.plugins.len(),
            "Registered command"
        );
        self.commands.insert(descriptor.name.clone(), descriptor);

        Ok(self)
    }

    /// Make sure every name a descriptor answers to is free.
    ///
    /// The command being replaced (same name) does not count as a clash.
    fn check_aliases(&self, descriptor: &CommandDescriptor) -> Result<()> {
        let mut own: Vec<&str> = vec![descriptor.name.as_str()];
        for alias in &descriptor.args.aliases {
            if alias.trim().is_empty() || own.contains(&alias.as_str()) {
                return Err(CliflowError::InvalidDefinition(format!(
                    "Command '{}' has an empty or repeated alias '{}'",
                    descriptor.name, alias
                )));
            }
            own.push(alias);
        }

        for other in self.commands.values() {
            if other.name == descriptor.name {
                continue;
            }
            let taken = std::iter::once(&other.name).chain(&other.args.aliases);
            for used in taken {
                if own.contains(&used.as_str()) {
                    return Err(CliflowError::InvalidDefinition(format!(
                        "Command '{}' answers to '{}', which command '{}' already uses",
                        descriptor.name, used, other.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Remove every plugin and command.
    pub fn reset(&mut self) {
        self.plugins.clear();
        self.commands.clear();
        debug!("Registry reset");
    }

    /// Installed plugins, ascending by priority.
    pub fn plugins(&self) -> &[PluginEntry] {
        &self.plugins
    }

    /// Get an installed plugin by name.
    pub fn plugin(&self, name: &str) -> Option<&PluginEntry> {
        self.plugins.iter().find(|p| p.name == name)
    }

    /// Get a command descriptor by name.
    pub fn command(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    /// All registered command descriptors, in no particular order.
    pub fn commands(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.values()
    }

    /// Registered command names, sorted.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Select the installed plugins named in `declared`, in priority order.
    ///
    /// Declaration order is irrelevant. Names with no installed plugin are
    /// ignored.
    pub fn resolve_plugins(&self, declared: &[String]) -> Vec<&PluginEntry> {
        for name in declared {
            if self.plugin(name).is_none() {
                debug!(plugin = %name, "Declared plugin is not installed");
            }
        }

        self.plugins
            .iter()
            .filter(|p| declared.iter().any(|d| d == &p.name))
            .collect()
    }
}
