//! The CLI program: owns the registry, binds commands to clap and dispatches.

use std::collections::HashMap;
use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::Command as ClapCommand;
use tracing::debug;

use crate::commands::CommandDescriptor;
use crate::discovery::{discover, DiscoveryConfig, DiscoveryReport};
use crate::error::{CliflowError, Result};
use crate::help::{render_help, HelpEntry};
use crate::lifecycle::{bind, invoke, BoundCommand};
use crate::plugins::{builtin_plugins, PluginDescriptor};
use crate::registry::Registry;

/// A command-line program built from registered commands and plugins.
///
/// Commands are bound lazily: the first [`Program::run`] after a command is
/// registered builds its clap sub-command and instance, and later runs reuse
/// them.
///
/// # Example
///
/// ```
/// use cliflow::{Command, CommandDescriptor, ExecutionContext, Program, Result};
///
/// struct Hello;
///
/// impl Command for Hello {
///     fn execute(&mut self, ctx: &ExecutionContext) -> Result<()> {
///         println!("hello {}", ctx.args.join(" "));
///         Ok(())
///     }
/// }
///
/// let mut program = Program::new("demo", "1.0.0");
/// program.use_command(CommandDescriptor::new("hello", || Hello)).unwrap();
/// program.run(["demo", "hello", "world"]).unwrap();
/// ```
#[derive(Debug)]
pub struct Program {
    name: String,
    version: String,
    about: String,
    registry: Registry,
    bound: HashMap<String, BoundCommand>,
}

impl Program {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            about: String::new(),
            registry: Registry::new(),
            bound: HashMap::new(),
        }
    }

    /// Set the one-line description shown at the top of the help.
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = about.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Install a plugin into the program's registry.
    pub fn install(&mut self, descriptor: PluginDescriptor) -> Result<&mut Self> {
        self.registry.install(descriptor)?;
        Ok(self)
    }

    /// Register a command. A forced re-registration drops the previous
    /// binding so the replacement is bound on the next run.
    pub fn use_command(&mut self, descriptor: CommandDescriptor) -> Result<&mut Self> {
        let name = descriptor.name.clone();
        self.registry.use_command(descriptor)?;
        self.bound.remove(&name);
        Ok(self)
    }

    /// Install the `logger` and `timer` plugins.
    pub fn install_builtin_plugins(&mut self) -> Result<&mut Self> {
        for descriptor in builtin_plugins() {
            self.registry.install(descriptor)?;
        }
        Ok(self)
    }

    /// Discover manifests and register them.
    pub async fn discover(&mut self, config: &DiscoveryConfig) -> Result<DiscoveryReport> {
        let report = discover(&mut self.registry, config).await?;
        for name in &report.commands {
            self.bound.remove(name);
        }
        Ok(report)
    }

    /// Bind every registered command that is not bound yet.
    pub fn bind_all(&mut self) {
        for descriptor in self.registry.commands() {
            if !self.bound.contains_key(&descriptor.name) {
                self.bound
                    .insert(descriptor.name.clone(), bind(descriptor));
            }
        }
    }

    /// The bound command for `name`, if it has been bound.
    pub fn bound(&self, name: &str) -> Option<&BoundCommand> {
        self.bound.get(name)
    }

    /// Build the clap root command from the bound commands.
    fn root_command(&self) -> ClapCommand {
        let mut names: Vec<&String> = self.bound.keys().collect();
        names.sort();

        let mut root = ClapCommand::new(self.name.clone())
            .version(self.version.clone())
            .disable_help_subcommand(true)
            .override_help(self.render_help());
        if !self.about.is_empty() {
            root = root.about(self.about.clone());
        }
        for name in names {
            if let Some(bound) = self.bound.get(name) {
                root = root.subcommand(bound.subcommand().clone());
            }
        }
        root
    }

    /// Parse `argv` (program name first) and run the selected command.
    ///
    /// `--help` and `--version` print and return `Ok`. With no command given
    /// the help is printed.
    ///
    /// # Errors
    /// - `CliflowError::Usage` if the command line does not parse
    /// - whatever the command lifecycle returns, unchanged
    pub fn run<I, T>(&mut self, argv: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.bind_all();

        let matches = match self.root_command().try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    e.print()?;
                    return Ok(());
                }
                _ => return Err(CliflowError::Usage(e.to_string())),
            },
        };

        let Some((name, sub_matches)) = matches.subcommand() else {
            print!("{}", self.render_help());
            return Ok(());
        };

        let bound = self
            .bound
            .get_mut(name)
            .ok_or_else(|| CliflowError::NotFound(format!("Command '{}'", name)))?;
        let options = bound.parsed_options(sub_matches);
        let args = bound.positional_args(sub_matches);

        debug!(command = %name, "Dispatching");
        invoke(bound, &self.registry, options, args)
    }

    /// Grouped help text for every registered command.
    pub fn render_help(&self) -> String {
        let entries: Vec<HelpEntry<'_>> = self
            .registry
            .commands()
            .map(|descriptor| HelpEntry {
                name: &descriptor.name,
                description: &descriptor.args.description,
                aliases: &descriptor.args.aliases,
                group: descriptor.args.group_name(),
            })
            .collect();
        render_help(&self.name, &self.version, &self.about, &entries)
    }

    /// Drop every plugin, command and binding.
    pub fn reset(&mut self) {
        self.bound.clear();
        self.registry.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Command, CommandArgs, OptionSpec};
    use crate::lifecycle::ExecutionContext;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct Capture {
        seen: Arc<Mutex<Vec<ExecutionContext>>>,
    }

    impl Command for Capture {
        fn execute(&mut self, ctx: &ExecutionContext) -> Result<()> {
            self.seen.lock().unwrap().push(ctx.clone());
            Ok(())
        }
    }

    fn capture(
        name: &str,
        args: CommandArgs,
    ) -> (CommandDescriptor, Arc<Mutex<Vec<ExecutionContext>>>) {
        let seen: Arc<Mutex<Vec<ExecutionContext>>> = Default::default();
        let shared = seen.clone();
        let descriptor = CommandDescriptor::new(name, move || Capture {
            seen: shared.clone(),
        })
        .with_args(args);
        (descriptor, seen)
    }

    #[test]
    fn test_run_dispatches_options_and_args() {
        let (descriptor, seen) = capture(
            "greet",
            CommandArgs::new("Say hello")
                .alias("hi")
                .option(OptionSpec::new("-n, --name <name>"))
                .option(OptionSpec::new("--loud")),
        );
        let mut program = Program::new("demo", "0.1.0");
        program.use_command(descriptor).unwrap();

        program
            .run(["demo", "hi", "-n", "Ada", "--loud", "x", "y"])
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name, "greet");
        assert_eq!(seen[0].option_str("name"), Some("Ada"));
        assert!(seen[0].flag("loud"));
        assert_eq!(seen[0].args, vec!["x", "y"]);
    }

    #[test]
    fn test_commands_are_bound_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let seen: Arc<Mutex<Vec<ExecutionContext>>> = Default::default();
        let shared = seen.clone();

        let mut program = Program::new("demo", "0.1.0");
        program
            .use_command(CommandDescriptor::new("once", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Capture {
                    seen: shared.clone(),
                }
            }))
            .unwrap();

        program.run(["demo", "once"]).unwrap();
        program.run(["demo", "once"]).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_forced_replacement_is_rebound() {
        let (first, first_seen) = capture("build", CommandArgs::new("First"));
        let (second, second_seen) = capture("build", CommandArgs::new("Second"));

        let mut program = Program::new("demo", "0.1.0");
        program.use_command(first).unwrap();
        program.run(["demo", "build"]).unwrap();

        program.use_command(second.with_force(true)).unwrap();
        program.run(["demo", "build"]).unwrap();

        assert_eq!(first_seen.lock().unwrap().len(), 1);
        assert_eq!(second_seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_command_is_usage_error() {
        let mut program = Program::new("demo", "0.1.0");
        let err = program.run(["demo", "nope"]).unwrap_err();
        assert!(matches!(err, CliflowError::Usage(_)));
    }

    #[test]
    fn test_help_and_version_succeed() {
        let mut program = Program::new("demo", "0.1.0");
        assert!(program.run(["demo", "--version"]).is_ok());
        assert!(program.run(["demo", "--help"]).is_ok());
        assert!(program.run(["demo"]).is_ok());
    }

    #[test]
    fn test_render_help_lists_groups() {
        let (deploy, _) = capture("deploy", CommandArgs::new("Deploy").group("ops"));
        let (greet, _) = capture("greet", CommandArgs::new("Greet").alias("hi"));

        let mut program = Program::new("demo", "0.1.0").with_about("Demo tool");
        program.use_command(deploy).unwrap().use_command(greet).unwrap();

        let help = program.render_help();
        assert!(help.contains("Demo tool"));
        assert!(help.find("ops:").unwrap() < help.find("Other commands:").unwrap());
        assert!(help.contains("greet   Greet (hi)"));
    }

    #[test]
    fn test_install_builtin_plugins() {
        let mut program = Program::new("demo", "0.1.0");
        program.install_builtin_plugins().unwrap();
        let names: Vec<&str> = program
            .registry()
            .plugins()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["logger", "timer"]);
        assert!(program.install_builtin_plugins().is_err());
    }

    #[test]
    fn test_reset_clears_everything() {
        let (descriptor, _) = capture("greet", CommandArgs::new("Greet"));
        let mut program = Program::new("demo", "0.1.0");
        program.install_builtin_plugins().unwrap();
        program.use_command(descriptor).unwrap();
        program.bind_all();
        assert!(program.bound("greet").is_some());

        program.reset();
        assert!(program.bound("greet").is_none());
        assert_eq!(program.registry().command_count(), 0);
        assert_eq!(program.registry().plugin_count(), 0);
    }

    #[test]
    fn test_help_clashing_options_rejected_at_registration() {
        let mut program = Program::new("demo", "0.1.0");

        let (host, _) = capture(
            "serve",
            CommandArgs::new("Serve").option(OptionSpec::new("--host <host>").abbr('h')),
        );
        assert!(matches!(
            program.use_command(host),
            Err(CliflowError::InvalidDefinition(_))
        ));

        let (help, _) = capture("serve", CommandArgs::new("Serve").option(OptionSpec::new("--help")));
        assert!(program.use_command(help).is_err());

        let (ports, _) = capture(
            "serve",
            CommandArgs::new("Serve")
                .option(OptionSpec::new("--port <port>").abbr('p'))
                .option(OptionSpec::new("--path <path>").abbr('p')),
        );
        assert!(program.use_command(ports).is_err());

        // Nothing was registered, so running is a plain usage error
        let err = program.run(["demo", "serve", "-h", "x"]).unwrap_err();
        assert!(matches!(err, CliflowError::Usage(_)));
    }

    #[test]
    fn test_alias_clash_rejected_and_run_still_works() {
        let (a, a_seen) = capture("a", CommandArgs::new("A"));
        let (b, _) = capture("b", CommandArgs::new("B").alias("a"));

        let mut program = Program::new("demo", "0.1.0");
        program.use_command(a).unwrap();
        assert!(program.use_command(b).is_err());

        program.run(["demo", "a"]).unwrap();
        assert_eq!(a_seen.lock().unwrap().len(), 1);
    }
}
