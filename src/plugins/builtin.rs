//! Built-in plugins.

use tracing::{debug, info};

use crate::error::Result;
use crate::lifecycle::ExecutionContext;

use super::types::{Plugin, PluginDescriptor};

/// Logs the start and end of every command that uses it.
pub struct LoggerPlugin;

impl Plugin for LoggerPlugin {
    fn before_execute(&self, ctx: &ExecutionContext) -> Result<()> {
        info!(command = %ctx.name, args = ?ctx.args, "Command started");
        Ok(())
    }

    fn after_execute(&self, ctx: &ExecutionContext) -> Result<()> {
        info!(command = %ctx.name, "Command finished");
        Ok(())
    }
}

/// Reports how long each command took.
pub struct TimerPlugin;

impl Plugin for TimerPlugin {
    fn before_execute(&self, ctx: &ExecutionContext) -> Result<()> {
        debug!(command = %ctx.name, start = %ctx.start_time, "Timer started");
        Ok(())
    }

    fn after_execute(&self, ctx: &ExecutionContext) -> Result<()> {
        info!(
            command = %ctx.name,
            elapsed_ms = ctx.elapsed().num_milliseconds(),
            "Command timing"
        );
        Ok(())
    }
}

/// Descriptors for every built-in plugin: `logger` (priority 50) and
/// `timer` (priority 100).
pub fn builtin_plugins() -> Vec<PluginDescriptor> {
    vec![
        PluginDescriptor::new("logger", || LoggerPlugin).with_priority(50),
        PluginDescriptor::new("timer", || TimerPlugin).with_priority(100),
    ]
}
