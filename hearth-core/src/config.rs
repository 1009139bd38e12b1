//! Hub configuration - the shared configuration collaborator
//!
//! One TOML file (default `<config dir>/hearth.toml`) holds every
//! section. Components read their own section by name; plugins reach
//! the same store through the [`ConfigStore`] capability handle.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use hearth_plugin_api::{ConfigStore, PluginError};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("Config parse error: {0}")]
    Parse(String),
}

/// The `[plugins]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsSection {
    /// Root directory scanned for plugin subdirectories.
    pub dir: PathBuf,
    /// Runtime behavior of the plugin host.
    pub runtime: RuntimeSection,
}

impl Default for PluginsSection {
    fn default() -> Self {
        Self {
            dir: hearth_paths::config_dir().join("plugins"),
            runtime: RuntimeSection::default(),
        }
    }
}

/// The `[plugins.runtime]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    /// Period of the plugin update task, in milliseconds.
    pub update_interval_ms: u64,
    /// Whether the update task runs automatically or only on request.
    pub update_mode: UpdateMode,
    /// Command invoked as `<command> <name> <version>` to fetch a
    /// declared dependency. Empty means installs are skipped.
    pub install_command: Option<String>,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            update_interval_ms: 60_000,
            update_mode: UpdateMode::Manual,
            install_command: None,
        }
    }
}

/// Update task trigger mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Spawn the periodic update task at startup.
    Auto,
    /// Updates are triggered manually only.
    #[default]
    Manual,
}

/// Parsed hub configuration.
#[derive(Debug, Clone, Default)]
pub struct HubConfig {
    root: toml::Table,
}

impl HubConfig {
    /// Load the main configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let root: toml::Table =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(Self { root })
    }

    /// Load the config file at `path`, or fall back to defaults when it
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound { path }) => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Raw access to a section by name.
    pub fn section_value(&self, name: &str) -> Option<toml::Value> {
        self.root.get(name).cloned()
    }

    /// Typed access to a section; absent sections yield the default.
    pub fn section<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        self.section_value(name)
            .and_then(|v| v.try_into().ok())
            .unwrap_or_default()
    }

    /// The `[plugins]` section.
    pub fn plugins(&self) -> PluginsSection {
        self.section("plugins")
    }

    /// Parse an arbitrary TOML file (manifests, plugin config files).
    pub fn load_file(path: &Path) -> Result<toml::Value, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let value: toml::Value =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(value)
    }
}

impl ConfigStore for HubConfig {
    fn section(&self, name: &str) -> Option<toml::Value> {
        self.section_value(name)
    }

    fn load(&self, path: &Path) -> Result<toml::Value, PluginError> {
        Self::load_file(path).map_err(|e| PluginError::Config(e.to_string()))
    }
}
