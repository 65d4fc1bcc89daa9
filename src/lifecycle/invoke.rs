//! Per-invocation hook sequence.

use tracing::{debug, info, warn};

use crate::commands::options::validate_options;
use crate::error::Result;
use crate::registry::Registry;

use super::bind::BoundCommand;
use super::context::{ExecutionContext, Options};

/// Run a bound command through the full lifecycle.
///
/// Order of calls:
/// 1. plugin `before_execute`, ascending priority
/// 2. command `before_execute`
/// 3. option validation
/// 4. command `execute`
/// 5. command `after_execute`
/// 6. plugin `after_execute`, ascending priority
///
/// A failure in 3 or 4 skips 5 and 6 and goes to the command's `on_error`.
/// If that returns `true` the error is absorbed, otherwise it is returned
/// unchanged. Plugins never see errors.
///
/// Plugins are resolved from `registry` at call time, so anything installed
/// before this call is visible.
pub fn invoke(
    bound: &mut BoundCommand,
    registry: &Registry,
    options: Options,
    args: Vec<String>,
) -> Result<()> {
    let ctx = ExecutionContext::new(bound.name(), options, args);
    let plugins = registry.resolve_plugins(&bound.descriptor.plugins);

    debug!(
        command = %ctx.name,
        plugins = ?plugins.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        "Invoking command"
    );

    for plugin in &plugins {
        plugin.instance.before_execute(&ctx)?;
    }
    bound.instance.before_execute(&ctx)?;

    let outcome = validate_options(&bound.descriptor.args, &ctx.options)
        .and_then(|()| bound.instance.execute(&ctx));

    match outcome {
        Ok(()) => {
            bound.instance.after_execute(&ctx)?;
            for plugin in &plugins {
                plugin.instance.after_execute(&ctx)?;
            }
            Ok(())
        }
        Err(error) => {
            if bound.instance.on_error(&error, &ctx) {
                info!(command = %ctx.name, error = %error, "Error handled by command");
                Ok(())
            } else {
                warn!(command = %ctx.name, error = %error, "Command failed");
                Err(error)
            }
        }
    }
}
