//! Command model for cliflow
//!
//! Commands are registered as descriptors and bound lazily by the lifecycle.
//! They can be written in Rust by implementing [`Command`], or declared in
//! `*.command.json` manifests that wrap a shell template.
//!
//! # Architecture
//!
//! - **types**: `Command` trait, `CommandDescriptor`, `CommandArgs`, `OptionSpec`
//! - **options**: flag parsing and option validation
//! - **manifest**: manifest parsing, validation, and the shell-backed command

pub mod manifest;
pub mod options;
pub mod types;

pub use manifest::{parse_command_manifest, CommandManifest};
pub use types::{
    Command, CommandArgs, CommandDescriptor, OptionSpec, Validator, DEFAULT_GROUP,
};
