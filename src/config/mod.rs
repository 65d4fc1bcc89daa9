//! Configuration for cliflow
//!
//! Settings come from `~/.cliflow/config.json` (if present) and are then
//! overridden by `CLIFLOW_*` environment variables.
//!
//! ```json
//! {
//!   "root": "./tools",
//!   "ignore": ["target", ".git", "node_modules", "fixtures"],
//!   "builtin_plugins": true,
//!   "log_level": "info",
//!   "log_format": "json"
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::discovery::DiscoveryConfig;
use crate::error::{CliflowError, Result};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for command and plugin manifests.
    pub root: PathBuf,
    /// Directory names skipped while scanning.
    pub ignore: Vec<String>,
    /// File suffix of command manifests.
    pub command_suffix: String,
    /// File suffix of plugin manifests.
    pub plugin_suffix: String,
    /// Install the `logger` and `timer` plugins.
    pub builtin_plugins: bool,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            ignore: vec![
                "target".to_string(),
                ".git".to_string(),
                "node_modules".to_string(),
            ],
            command_suffix: ".command.json".to_string(),
            plugin_suffix: ".plugin.json".to_string(),
            builtin_plugins: true,
            log_level: "warn".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Configuration directory (`~/.cliflow`).
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cliflow")
    }

    /// Configuration file path (`~/.cliflow/config.json`).
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load the default config file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::path())?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load a config file, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CliflowError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            CliflowError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Apply `CLIFLOW_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("CLIFLOW_ROOT") {
            self.root = PathBuf::from(root);
        }
        if let Some(ignore) = lookup("CLIFLOW_IGNORE") {
            self.ignore = ignore
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(value) = lookup("CLIFLOW_BUILTIN_PLUGINS") {
            self.builtin_plugins = parse_bool("CLIFLOW_BUILTIN_PLUGINS", &value)?;
        }
        if let Some(level) = lookup("CLIFLOW_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(format) = lookup("CLIFLOW_LOG_FORMAT") {
            self.log_format = match format.to_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => {
                    return Err(CliflowError::Config(format!(
                        "CLIFLOW_LOG_FORMAT must be 'text' or 'json', got '{}'",
                        other
                    )))
                }
            };
        }
        Ok(())
    }

    /// Discovery settings derived from this config.
    pub fn discovery(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            root: self.root.clone(),
            ignore: self.ignore.clone(),
            command_suffix: self.command_suffix.clone(),
            plugin_suffix: self.plugin_suffix.clone(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CliflowError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.ignore, vec!["target", ".git", "node_modules"]);
        assert_eq!(config.command_suffix, ".command.json");
        assert_eq!(config.plugin_suffix, ".plugin.json");
        assert!(config.builtin_plugins);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: Config = serde_json::from_str(r#"{"root": "tools"}"#).unwrap();
        assert_eq!(config.root, PathBuf::from("tools"));
        assert_eq!(config.command_suffix, ".command.json");
        assert!(config.builtin_plugins);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/cliflow.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"builtin_plugins": false, "log_format": "json"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.builtin_plugins);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_load_from_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ broken").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, CliflowError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("CLIFLOW_ROOT", "/srv/tools"),
                ("CLIFLOW_IGNORE", "dist, vendor,,"),
                ("CLIFLOW_BUILTIN_PLUGINS", "off"),
                ("CLIFLOW_LOG_LEVEL", "debug"),
                ("CLIFLOW_LOG_FORMAT", "JSON"),
            ]))
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/srv/tools"));
        assert_eq!(config.ignore, vec!["dist", "vendor"]);
        assert!(!config.builtin_plugins);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_env_overrides() {
        let mut config = Config::default();
        assert!(config
            .apply_overrides(lookup_from(&[("CLIFLOW_BUILTIN_PLUGINS", "maybe")]))
            .is_err());
        assert!(config
            .apply_overrides(lookup_from(&[("CLIFLOW_LOG_FORMAT", "xml")]))
            .is_err());
    }

    #[test]
    fn test_discovery_config() {
        let config = Config::default();
        let discovery = config.discovery();
        assert_eq!(discovery.root, config.root);
        assert_eq!(discovery.ignore, config.ignore);
    }
}
