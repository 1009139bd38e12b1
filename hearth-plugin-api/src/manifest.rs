//! Plugin manifest - the declarative descriptor each plugin ships

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::PluginError;

/// File name the host looks for when discovering plugins.
pub const MANIFEST_FILE: &str = "plugin.toml";

/// Parsed `plugin.toml` for one plugin.
///
/// A plugin directory is discoverable as soon as it contains this file.
/// Everything the host consumes is here; the `descriptor` table is an
/// opaque pass-through for collaborators outside the lifecycle core
/// (e.g. a web router keyed by a path field).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Relative path to the plugin's shared library. When absent the
    /// loader probes `<id>.so` / `lib<id>.so` in the plugin directory.
    #[serde(default)]
    pub entry: Option<String>,

    /// Declared dependencies, name -> version spec. Resolution is
    /// single-level and best-effort; see the dependency resolver.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    /// Free-form block handed to the plugin and to external
    /// collaborators unchanged.
    #[serde(default = "empty_table")]
    pub descriptor: toml::Value,
}

fn empty_table() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            entry: None,
            dependencies: BTreeMap::new(),
            descriptor: empty_table(),
        }
    }
}

impl PluginManifest {
    /// Load and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self, PluginError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| PluginError::Config(e.to_string()))
    }
}
