//! Lazy binding of command descriptors to clap sub-commands.

use std::fmt;

use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use serde_json::Value;
use tracing::debug;

use crate::commands::{options, Command, CommandArgs, CommandDescriptor};

use super::context::Options;

/// Argument id collecting positional arguments of every sub-command.
pub const POSITIONAL_ARGS: &str = "positional_args";

/// A command materialized for dispatch: its descriptor, the live instance,
/// the clap sub-command it answers to, and its help group.
///
/// Created once per descriptor by [`bind`] and reused for every invocation
/// afterwards.
pub struct BoundCommand {
    pub(crate) descriptor: CommandDescriptor,
    pub(crate) instance: Box<dyn Command>,
    subcommand: ClapCommand,
    group: String,
}

impl BoundCommand {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    /// Help group recorded at bind time.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The clap sub-command this command was bound to.
    pub fn subcommand(&self) -> &ClapCommand {
        &self.subcommand
    }

    /// Read the parsed option values for this command out of clap's matches.
    ///
    /// Boolean flags appear only when set; value options appear when given or
    /// when they have a default.
    pub fn parsed_options(&self, matches: &ArgMatches) -> Options {
        let mut parsed = Options::new();
        for spec in &self.descriptor.args.options {
            let key = spec.key();
            if spec.takes_value() {
                if let Some(value) = matches.get_one::<String>(&key) {
                    parsed.insert(key, Value::String(value.clone()));
                }
            } else if matches.get_flag(&key) {
                parsed.insert(key, Value::Bool(true));
            }
        }
        parsed
    }

    /// Positional arguments given after the sub-command name.
    pub fn positional_args(&self, matches: &ArgMatches) -> Vec<String> {
        matches
            .get_many::<String>(POSITIONAL_ARGS)
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    }
}

impl fmt::Debug for BoundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundCommand")
            .field("name", &self.descriptor.name)
            .field("group", &self.group)
            .finish()
    }
}

/// Bind a descriptor: build its clap sub-command, instantiate the command and
/// record its group.
pub fn bind(descriptor: &CommandDescriptor) -> BoundCommand {
    let subcommand = build_subcommand(&descriptor.name, &descriptor.args);
    let instance = descriptor.instantiate();
    let group = descriptor.args.group_name().to_string();

    debug!(command = %descriptor.name, group = %group, "Bound command");

    BoundCommand {
        descriptor: descriptor.clone(),
        instance,
        subcommand,
        group,
    }
}

/// Build the clap sub-command for a command's metadata.
///
/// Required options are not enforced by clap: the lifecycle validates them so
/// that a missing option reaches the command's `on_error` hook.
pub fn build_subcommand(name: &str, args: &CommandArgs) -> ClapCommand {
    let mut cmd = ClapCommand::new(name.to_string()).about(args.description.clone());

    for alias in &args.aliases {
        cmd = cmd.visible_alias(alias.clone());
    }

    for spec in &args.options {
        let key = spec.key();
        let mut help = spec.description.clone();
        if spec.required {
            help = if help.is_empty() {
                "(required)".to_string()
            } else {
                format!("{} (required)", help)
            };
        }

        let mut arg = Arg::new(key.clone()).long(key).help(help);
        if let Some(short) = spec.short() {
            arg = arg.short(short);
        }

        match options::placeholder(&spec.flags) {
            Some(placeholder) => {
                arg = arg
                    .action(ArgAction::Set)
                    .value_name(placeholder.name.to_string());
                if placeholder.optional {
                    arg = arg.num_args(0..=1).default_missing_value("true");
                }
                if let Some(default) = &spec.default {
                    arg = arg.default_value(default.clone());
                }
            }
            None => {
                arg = arg.action(ArgAction::SetTrue);
            }
        }

        cmd = cmd.arg(arg);
    }

    cmd = cmd.arg(
        Arg::new(POSITIONAL_ARGS)
            .num_args(0..)
            .value_name("ARGS")
            .help("Positional arguments"),
    );

    if !args.examples.is_empty() {
        cmd = cmd.after_help(examples_text(&args.examples));
    }

    cmd
}

fn examples_text(examples: &[String]) -> String {
    let mut text = String::from("Examples:\n");
    for example in examples {
        text.push_str("  ");
        text.push_str(example);
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::OptionSpec;
    use crate::error::Result;
    use crate::lifecycle::ExecutionContext;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Noop;
    impl Command for Noop {
        fn execute(&mut self, _ctx: &ExecutionContext) -> Result<()> {
            Ok(())
        }
    }

    fn deploy_descriptor() -> CommandDescriptor {
        CommandDescriptor::new("deploy", || Noop).with_args(
            CommandArgs::new("Deploy the app")
                .alias("d")
                .group("ops")
                .option(
                    OptionSpec::new("--mode <mode>")
                        .abbr('m')
                        .default_value("development"),
                )
                .option(OptionSpec::new("--target <target>").required())
                .option(OptionSpec::new("--dry-run"))
                .example("cliflow deploy --target web"),
        )
    }

    fn parse(bound: &BoundCommand, argv: &[&str]) -> ArgMatches {
        let root = ClapCommand::new("test").subcommand(bound.subcommand().clone());
        let matches = root.try_get_matches_from(argv).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        sub.clone()
    }

    #[test]
    fn test_bind_records_group_and_instantiates_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let descriptor = CommandDescriptor::new("count", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Noop
        });

        let bound = bind(&descriptor);
        assert_eq!(bound.name(), "count");
        assert_eq!(bound.group(), "default");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subcommand_metadata() {
        let bound = bind(&deploy_descriptor());
        let sub = bound.subcommand();

        assert_eq!(sub.get_name(), "deploy");
        assert_eq!(bound.group(), "ops");
        assert!(sub.get_all_aliases().any(|a| a == "d"));
        assert!(sub.get_arguments().any(|a| a.get_id() == "mode"));
        assert!(sub.get_arguments().any(|a| a.get_id() == "dry-run"));
    }

    #[test]
    fn test_parsed_options_with_defaults_and_flags() {
        let bound = bind(&deploy_descriptor());
        let matches = parse(
            &bound,
            &["test", "deploy", "--target", "web", "--dry-run", "extra"],
        );

        let options = bound.parsed_options(&matches);
        assert_eq!(options.get("mode"), Some(&Value::String("development".into())));
        assert_eq!(options.get("target"), Some(&Value::String("web".into())));
        assert_eq!(options.get("dry-run"), Some(&Value::Bool(true)));
        assert_eq!(bound.positional_args(&matches), vec!["extra"]);
    }

    #[test]
    fn test_missing_required_option_is_not_a_parse_error() {
        let bound = bind(&deploy_descriptor());
        let matches = parse(&bound, &["test", "deploy"]);

        let options = bound.parsed_options(&matches);
        assert!(!options.contains_key("target"));
        assert!(!options.contains_key("dry-run"));
    }

    #[test]
    fn test_short_abbreviation_and_alias() {
        let bound = bind(&deploy_descriptor());
        let matches = parse(&bound, &["test", "d", "-m", "production"]);

        let options = bound.parsed_options(&matches);
        assert_eq!(options.get("mode"), Some(&Value::String("production".into())));
    }

    #[test]
    fn test_examples_text() {
        let text = examples_text(&["a --b".to_string(), "c".to_string()]);
        assert_eq!(text, "Examples:\n  a --b\n  c\n");
    }
}
