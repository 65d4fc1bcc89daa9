//! Plugin system for cliflow
//!
//! Plugins are named, prioritized hook bundles that run around every command
//! declaring them. A plugin is instantiated once, at install time, and the
//! same instance is shared by every command that uses it.
//!
//! # Architecture
//!
//! - **types**: `Plugin` trait, `PluginDescriptor`, `PluginEntry`
//! - **builtin**: the `logger` and `timer` plugins
//! - **manifest**: `*.plugin.json` parsing and the shell-backed plugin
//!
//! # Ordering
//!
//! ```text
//! logger(50).before → timer(100).before → command.before
//!   → command.execute →
//! command.after → logger(50).after → timer(100).after
//! ```
//!
//! Plugin hooks always run in ascending priority, on both sides of the
//! command.

pub mod builtin;
pub mod manifest;
pub mod types;

pub use builtin::builtin_plugins;
pub use manifest::{parse_plugin_manifest, PluginManifest};
pub use types::{Plugin, PluginDescriptor, PluginEntry, DEFAULT_PRIORITY};
