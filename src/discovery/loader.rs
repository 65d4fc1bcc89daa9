//! Manifest discovery and registration.
//!
//! Walks the project tree, reads every command and plugin manifest
//! concurrently, then registers them one at a time. Plugin manifests that
//! fail to load are logged and skipped; a command manifest that fails to load
//! aborts discovery.

use std::io;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{info, warn};

use crate::commands::parse_command_manifest;
use crate::error::{CliflowError, Result};
use crate::plugins::parse_plugin_manifest;
use crate::registry::Registry;

use super::walker::walk;

/// Where and how to look for manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub root: PathBuf,
    pub ignore: Vec<String>,
    pub command_suffix: String,
    pub plugin_suffix: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        crate::config::Config::default().discovery()
    }
}

/// Kind of manifest a file holds, decided by its suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Command,
    Plugin,
}

/// A file matched by suffix during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub kind: ManifestKind,
    /// File name without the suffix; the default unit name.
    pub stem: String,
}

/// What discovery registered.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Installed plugin names, in registration order.
    pub plugins: Vec<String>,
    /// Registered command names, in registration order.
    pub commands: Vec<String>,
    /// Plugin manifests that failed to load.
    pub skipped: Vec<PathBuf>,
}

/// Classify a file by suffix. Files matching neither suffix are ignored.
pub fn classify(path: &Path, config: &DiscoveryConfig) -> Option<Candidate> {
    let file_name = path.file_name()?.to_str()?;

    let (kind, suffix) = if file_name.ends_with(&config.command_suffix) {
        (ManifestKind::Command, &config.command_suffix)
    } else if file_name.ends_with(&config.plugin_suffix) {
        (ManifestKind::Plugin, &config.plugin_suffix)
    } else {
        return None;
    };

    let stem = &file_name[..file_name.len() - suffix.len()];
    if stem.is_empty() {
        return None;
    }

    Some(Candidate {
        path: path.to_path_buf(),
        kind,
        stem: stem.to_string(),
    })
}

/// Walk the tree and collect manifest candidates in walk order.
pub fn find_manifests(config: &DiscoveryConfig) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    walk(&config.root, &config.ignore, |path| {
        if let Some(candidate) = classify(path, config) {
            candidates.push(candidate);
        }
        Ok(())
    })?;
    Ok(candidates)
}

fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn read_result<'a>(candidate: &Candidate, content: &'a io::Result<String>) -> Result<&'a str> {
    content.as_deref().map_err(|e| {
        CliflowError::Discovery(format!(
            "Failed to read {}: {}",
            candidate.path.display(),
            e
        ))
    })
}

/// Discover manifests under `config.root` and register them into `registry`.
///
/// All reads are issued concurrently and awaited before any registration, so
/// the registry only ever sees a single writer. Plugins are installed before
/// commands are registered, each in walk order.
///
/// # Errors
/// - `CliflowError::Discovery` if a command manifest cannot be read, parsed
///   or validated
/// - `CliflowError::DuplicateRegistration` if a discovered command name
///   clashes without `force` (a clashing plugin is skipped like any other
///   plugin that fails to load)
pub async fn discover(
    registry: &mut Registry,
    config: &DiscoveryConfig,
) -> Result<DiscoveryReport> {
    let candidates = find_manifests(config)?;
    let contents = join_all(candidates.iter().map(|c| tokio::fs::read_to_string(&c.path))).await;

    let mut report = DiscoveryReport::default();
    let loaded: Vec<(&Candidate, &io::Result<String>)> =
        candidates.iter().zip(contents.iter()).collect();

    for (candidate, content) in loaded.iter().filter(|(c, _)| c.kind == ManifestKind::Plugin) {
        let installed = read_result(candidate, content)
            .and_then(|content| {
                parse_plugin_manifest(content, &candidate.stem, base_dir(&candidate.path))
            })
            .and_then(|descriptor| {
                let name = descriptor.name.clone();
                registry.install(descriptor)?;
                Ok(name)
            });

        match installed {
            Ok(name) => report.plugins.push(name),
            Err(e) => {
                warn!(
                    path = %candidate.path.display(),
                    error = %e,
                    "Failed to load plugin, skipping"
                );
                report.skipped.push(candidate.path.clone());
            }
        }
    }

    for (candidate, content) in loaded.iter().filter(|(c, _)| c.kind == ManifestKind::Command) {
        let descriptor = read_result(candidate, content)
            .and_then(|content| {
                parse_command_manifest(content, &candidate.stem, base_dir(&candidate.path))
            })
            .map_err(|e| {
                CliflowError::Discovery(format!(
                    "Failed to load command {}: {}",
                    candidate.path.display(),
                    e
                ))
            })?;

        let name = descriptor.name.clone();
        registry.use_command(descriptor)?;
        report.commands.push(name);
    }

    info!(
        root = %config.root.display(),
        plugins = report.plugins.len(),
        commands = report.commands.len(),
        skipped = report.skipped.len(),
        "Discovery complete"
    );

    Ok(report)
}
