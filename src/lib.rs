//! cliflow - Convention-driven command-line framework
//!
//! Commands and prioritized plugins are registered (in code or discovered
//! from `*.command.json` / `*.plugin.json` manifests), bound lazily to clap
//! sub-commands, and run through a fixed lifecycle of hooks.

pub mod commands;
pub mod config;
pub mod discovery;
pub mod error;
pub mod help;
pub mod lifecycle;
pub mod plugins;
pub mod program;
pub mod registry;
pub mod utils;

pub use commands::{Command, CommandArgs, CommandDescriptor, OptionSpec};
pub use config::Config;
pub use discovery::{DiscoveryConfig, DiscoveryReport};
pub use error::{CliflowError, Result};
pub use lifecycle::{ExecutionContext, Options};
pub use plugins::{Plugin, PluginDescriptor};
pub use program::Program;
pub use registry::Registry;
