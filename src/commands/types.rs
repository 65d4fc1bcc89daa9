//! Command types for cliflow
//!
//! A command is registered as a [`CommandDescriptor`] (metadata plus a
//! factory) and only turned into a live [`Command`] instance when the
//! program binds it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CliflowError, Result};
use crate::lifecycle::{ExecutionContext, Options};

use super::options;

/// Group a command belongs to when it does not declare one.
pub const DEFAULT_GROUP: &str = "default";

/// Custom validation rule: returns an error message to reject the options.
pub type Validator = Arc<dyn Fn(&Options) -> Option<String> + Send + Sync>;

/// Execution logic and optional hooks of a command.
///
/// Only `execute` is required; the hooks default to no-ops and `on_error`
/// defaults to leaving the error unhandled.
pub trait Command: Send {
    /// Runs after every plugin `before_execute`.
    fn before_execute(&mut self, _ctx: &ExecutionContext) -> Result<()> {
        Ok(())
    }

    /// The command body.
    fn execute(&mut self, ctx: &ExecutionContext) -> Result<()>;

    /// Runs before every plugin `after_execute`.
    fn after_execute(&mut self, _ctx: &ExecutionContext) -> Result<()> {
        Ok(())
    }

    /// Called when validation or `execute` fails. Return `true` to absorb
    /// the error, `false` to let it propagate unchanged.
    fn on_error(&mut self, _error: &CliflowError, _ctx: &ExecutionContext) -> bool {
        false
    }
}

/// One option accepted by a command.
///
/// `flags` uses the usual syntax: `--name`, `--name <value>` (value
/// required) or `--name [value]` (value optional). A leading `-n, ` short
/// form is accepted too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Flag syntax, e.g. `--mode <mode>`.
    pub flags: String,

    /// Optional single-character abbreviation.
    #[serde(default)]
    pub abbr: Option<char>,

    /// Help text.
    #[serde(default)]
    pub description: String,

    /// Default value for value-taking options.
    #[serde(default)]
    pub default: Option<String>,

    /// Whether the option must be present.
    #[serde(default)]
    pub required: bool,
}

impl OptionSpec {
    /// Create an optional option from its flag syntax.
    pub fn new(flags: impl Into<String>) -> Self {
        Self {
            flags: flags.into(),
            ..Default::default()
        }
    }

    pub fn abbr(mut self, abbr: char) -> Self {
        self.abbr = Some(abbr);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Lookup key in the parsed options (`--dry-run <x>` → `dry-run`).
    pub fn key(&self) -> String {
        options::option_key(&self.flags)
    }

    /// Whether the option takes a value.
    pub fn takes_value(&self) -> bool {
        options::placeholder(&self.flags).is_some()
    }

    /// Short flag: the explicit abbreviation, else one parsed from `flags`.
    pub fn short(&self) -> Option<char> {
        self.abbr.or_else(|| options::short_flag(&self.flags))
    }
}

/// Metadata bundle of a command.
#[derive(Clone, Default)]
pub struct CommandArgs {
    pub description: String,
    pub aliases: Vec<String>,
    pub group: Option<String>,
    pub options: Vec<OptionSpec>,
    pub examples: Vec<String>,
    pub validate: Option<Validator>,
}

impl CommandArgs {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn validate<F>(mut self, validate: F) -> Self
    where
        F: Fn(&Options) -> Option<String> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(validate));
        self
    }

    /// Declared group, or [`DEFAULT_GROUP`].
    pub fn group_name(&self) -> &str {
        self.group.as_deref().unwrap_or(DEFAULT_GROUP)
    }
}

impl fmt::Debug for CommandArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandArgs")
            .field("description", &self.description)
            .field("aliases", &self.aliases)
            .field("group", &self.group)
            .field("options", &self.options)
            .field("examples", &self.examples)
            .field("validate", &self.validate.is_some())
            .finish()
    }
}

type CommandFactory = Arc<dyn Fn() -> Box<dyn Command> + Send + Sync>;

/// Registration-time description of a command.
///
/// Holds everything needed to bind the command later; no instance exists
/// until [`crate::lifecycle::bind`] calls the factory.
#[derive(Clone)]
pub struct CommandDescriptor {
    /// Unique command name.
    pub name: String,

    /// Replace an already-registered command with the same name.
    pub force: bool,

    pub args: CommandArgs,

    /// Plugins to run around this command. Execution order comes from the
    /// plugins' priorities, not from this list.
    pub plugins: Vec<String>,

    factory: CommandFactory,
}

impl CommandDescriptor {
    pub fn new<C, F>(name: impl Into<String>, factory: F) -> Self
    where
        C: Command + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            force: false,
            args: CommandArgs::default(),
            plugins: Vec::new(),
            factory: Arc::new(move || Box::new(factory()) as Box<dyn Command>),
        }
    }

    pub fn with_args(mut self, args: CommandArgs) -> Self {
        self.args = args;
        self
    }

    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub(crate) fn instantiate(&self) -> Box<dyn Command> {
        (self.factory)()
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("force", &self.force)
            .field("args", &self.args)
            .field("plugins", &self.plugins)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;
    impl Command for Noop {
        fn execute(&mut self, _ctx: &ExecutionContext) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_option_spec_key_and_value() {
        let spec = OptionSpec::new("--mode <mode>").abbr('m');
        assert_eq!(spec.key(), "mode");
        assert!(spec.takes_value());
        assert_eq!(spec.short(), Some('m'));

        let flag = OptionSpec::new("-v, --verbose");
        assert_eq!(flag.key(), "verbose");
        assert!(!flag.takes_value());
        assert_eq!(flag.short(), Some('v'));
    }

    #[test]
    fn test_option_spec_deserialization_defaults() {
        let spec: OptionSpec = serde_json::from_str(r#"{"flags": "--force"}"#).unwrap();
        assert_eq!(spec.flags, "--force");
        assert!(spec.abbr.is_none());
        assert!(spec.default.is_none());
        assert!(!spec.required);
    }

    #[test]
    fn test_command_args_group_defaults() {
        let args = CommandArgs::new("Build things");
        assert_eq!(args.group_name(), DEFAULT_GROUP);

        let args = args.group("build");
        assert_eq!(args.group_name(), "build");
    }

    #[test]
    fn test_command_args_builders() {
        let args = CommandArgs::new("Deploy")
            .alias("d")
            .alias("ship")
            .option(OptionSpec::new("--env <env>").required())
            .example("cliflow deploy --env prod")
            .validate(|_| None);

        assert_eq!(args.aliases, vec!["d", "ship"]);
        assert_eq!(args.options.len(), 1);
        assert!(args.options[0].required);
        assert_eq!(args.examples.len(), 1);
        assert!(args.validate.is_some());
    }

    #[test]
    fn test_descriptor_builders() {
        let descriptor = CommandDescriptor::new("build", || Noop)
            .with_plugins(["timer", "logger"])
            .with_force(true);

        assert_eq!(descriptor.name, "build");
        assert!(descriptor.force);
        assert_eq!(descriptor.plugins, vec!["timer", "logger"]);
    }

    #[test]
    fn test_default_on_error_does_not_handle() {
        let mut cmd = Noop;
        let ctx = ExecutionContext::new("noop", Options::new(), vec![]);
        let err = CliflowError::Execution("boom".into());
        assert!(!cmd.on_error(&err, &ctx));
    }
}
