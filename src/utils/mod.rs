//! Shared helpers.

pub mod shell;
