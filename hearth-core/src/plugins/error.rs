//! Plugin host error types

use std::path::PathBuf;
use thiserror::Error;

use hearth_plugin_api::PluginError;

/// Errors that can occur in the plugin host
#[derive(Error, Debug)]
pub enum PluginHostError {
    /// Manifest missing or unparseable
    #[error("Manifest error for plugin '{id}': {message}")]
    Manifest { id: String, message: String },

    /// Plugin library not found in directory
    #[error("Plugin library not found in {dir}")]
    LibraryNotFound { dir: PathBuf },

    /// Failed to load dynamic library
    #[error("Failed to load plugin library: {0}")]
    LibraryLoad(#[from] libloading::Error),

    /// API version mismatch between hearth and plugin
    #[error("API version mismatch: hearth expects {expected}, plugin has {found}")]
    ApiVersionMismatch { expected: u32, found: u32 },

    /// No compiled-in constructor for a plugin id
    #[error("No registered constructor for plugin '{id}'")]
    NoConstructor { id: String },

    /// Plugin init hook failed
    #[error("Plugin init failed: {0}")]
    Init(PluginError),

    /// Plugin unload hook failed
    #[error("Plugin unload failed: {0}")]
    Unload(PluginError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
