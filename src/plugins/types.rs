//! Plugin types for cliflow
//!
//! A plugin is a named, prioritized bundle of hooks run around every command
//! that declares it. This module defines the hook trait, the descriptor that
//! gets registered, and the installed entry the registry keeps.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::lifecycle::ExecutionContext;

/// Priority used when a plugin does not declare one.
pub const DEFAULT_PRIORITY: i64 = 100;

/// Hooks a plugin may run around a command.
///
/// Both hooks default to no-ops. Instances are shared by every command that
/// references the plugin, so hooks take `&self`; plugins that keep state
/// across invocations need interior mutability.
pub trait Plugin: Send + Sync {
    /// Runs before the command's own `before_execute`.
    fn before_execute(&self, _ctx: &ExecutionContext) -> Result<()> {
        Ok(())
    }

    /// Runs after the command's own `after_execute`.
    fn after_execute(&self, _ctx: &ExecutionContext) -> Result<()> {
        Ok(())
    }
}

type PluginFactory = Arc<dyn Fn() -> Arc<dyn Plugin> + Send + Sync>;

/// Registration-time description of a plugin.
///
/// The factory is called exactly once, when the plugin is installed.
#[derive(Clone)]
pub struct PluginDescriptor {
    /// Unique plugin name.
    pub name: String,

    /// Lower values run earlier. Defaults to [`DEFAULT_PRIORITY`].
    pub priority: i64,

    /// Replace an already-installed plugin with the same name.
    pub force: bool,

    factory: PluginFactory,
}

impl PluginDescriptor {
    /// Create a descriptor with the default priority.
    pub fn new<P, F>(name: impl Into<String>, factory: F) -> Self
    where
        P: Plugin + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority: DEFAULT_PRIORITY,
            force: false,
            factory: Arc::new(move || Arc::new(factory()) as Arc<dyn Plugin>),
        }
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set the override flag.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub(crate) fn instantiate(&self) -> Arc<dyn Plugin> {
        (self.factory)()
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("force", &self.force)
            .finish()
    }
}

/// An installed plugin: its descriptor plus the single live instance.
#[derive(Clone)]
pub struct PluginEntry {
    pub name: String,
    pub priority: i64,
    pub descriptor: PluginDescriptor,
    pub instance: Arc<dyn Plugin>,
}

impl fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Noop;
    impl Plugin for Noop {}

    #[test]
    fn test_descriptor_defaults() {
        let descriptor = PluginDescriptor::new("noop", || Noop);
        assert_eq!(descriptor.name, "noop");
        assert_eq!(descriptor.priority, DEFAULT_PRIORITY);
        assert!(!descriptor.force);
    }

    #[test]
    fn test_descriptor_builders() {
        let descriptor = PluginDescriptor::new("noop", || Noop)
            .with_priority(5)
            .with_force(true);
        assert_eq!(descriptor.priority, 5);
        assert!(descriptor.force);
    }

    #[test]
    fn test_instantiate_calls_factory_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let descriptor = PluginDescriptor::new("counted", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Noop
        });

        let _ = descriptor.instantiate();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let _ = descriptor.instantiate();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_default_hooks_are_noops() {
        let plugin = Noop;
        let ctx = ExecutionContext::new("x", Default::default(), vec![]);
        assert!(plugin.before_execute(&ctx).is_ok());
        assert!(plugin.after_execute(&ctx).is_ok());
    }
}
