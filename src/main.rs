use anyhow::Context;
use cliflow::config::LogFormat;
use cliflow::{Config, Program};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading CLIFLOW_* overrides
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config);

    let mut program = Program::new("cliflow", env!("CARGO_PKG_VERSION"))
        .with_about("Convention-driven command runner");

    if config.builtin_plugins {
        program
            .install_builtin_plugins()
            .context("Failed to install built-in plugins")?;
    }

    program
        .discover(&config.discovery())
        .await
        .with_context(|| format!("Failed to discover commands in {}", config.root.display()))?;

    program.run(std::env::args_os())?;

    Ok(())
}
