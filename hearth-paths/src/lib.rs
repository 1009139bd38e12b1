//! XDG Base Directory paths for hearth.
//!
//! CLI tools should use XDG paths for cross-platform consistency,
//! not platform-native paths. This matches tools like gh, docker, kubectl.

use std::path::PathBuf;

/// Get the hearth config directory.
///
/// Returns `$XDG_CONFIG_HOME/hearth` if set, otherwise `~/.config/hearth`.
/// This is where the hub config file and the plugin root live.
///
/// # Examples
///
/// ```
/// use hearth_paths::config_dir;
///
/// let config = config_dir();
/// let plugin_dir = config.join("plugins");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("hearth")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/hearth")
    } else {
        PathBuf::from(".config/hearth")
    }
}

/// Get the hearth data directory.
///
/// Returns `$XDG_DATA_HOME/hearth` if set, otherwise `~/.local/share/hearth`.
/// This is where plugins store persistent data.
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("hearth")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share/hearth")
    } else {
        PathBuf::from(".local/share/hearth")
    }
}
