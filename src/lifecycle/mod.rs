//! Command lifecycle orchestration
//!
//! Turns registered command descriptors into live, invokable units and runs
//! the fixed hook sequence on every invocation.
//!
//! # Architecture
//!
//! - **context**: the per-invocation `ExecutionContext`
//! - **bind**: lazy, once-per-descriptor binding to a clap sub-command
//! - **invoke**: plugin/command hooks, validation, execution, error routing

mod bind;
mod context;
mod invoke;

pub use bind::{bind, build_subcommand, BoundCommand, POSITIONAL_ARGS};
pub use context::{ExecutionContext, Options};
pub use invoke::invoke;
