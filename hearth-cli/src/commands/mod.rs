//! CLI subcommand implementations

pub mod plugin;
pub mod serve;

use anyhow::Result;
use hearth_core::HubConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default configuration file, `~/.config/hearth/hearth.toml`.
pub fn default_config_path() -> PathBuf {
    hearth_paths::config_dir().join("hearth.toml")
}

/// Load the hub configuration, falling back to defaults when the file
/// does not exist.
pub(crate) fn load_config(path: &Path) -> Result<Arc<HubConfig>> {
    Ok(Arc::new(HubConfig::load_or_default(path)?))
}
