//! PluginContext - a plugin's interface to host capabilities

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::PluginError;

/// A zero-argument periodic hook body.
pub type ActivityFn = Box<dyn FnMut() + Send>;

/// Narrow read-only view of the host, handed to plugins instead of the
/// facade itself so a plugin can query sibling plugins without aliasing
/// the host's mutable state.
pub trait HostView: Send + Sync {
    /// Ids of plugins currently in the `loaded` state, in registry order.
    fn loaded_plugins(&self) -> Vec<String>;

    /// Whether a specific plugin is currently loaded.
    fn is_loaded(&self, id: &str) -> bool {
        self.loaded_plugins().iter().any(|p| p == id)
    }
}

/// The shared configuration collaborator, as seen by plugins.
pub trait ConfigStore: Send + Sync {
    /// Returns a parsed config section by name.
    fn section(&self, name: &str) -> Option<toml::Value>;

    /// Parses an arbitrary config file (e.g. another manifest).
    fn load(&self, path: &Path) -> Result<toml::Value, PluginError>;
}

/// Activity (un)registration surface of the shared scheduler. The
/// context binds `owner` to its own plugin id before delegating, so a
/// plugin cannot register on behalf of a different owner.
pub trait ActivityRegistrar: Send + Sync {
    /// Appends a periodic hook for `owner`. The interval must be
    /// positive; the callback is never invoked during registration.
    fn register(
        &self,
        owner: &str,
        created_by: &str,
        interval: Duration,
        callback: ActivityFn,
    ) -> Result<(), PluginError>;

    /// Removes all of `owner`'s activities whose `created_by` matches.
    fn unregister(&self, owner: &str, created_by: &str);
}

/// Plugin's interface to host capabilities.
///
/// Built by the host after the entry module is activated and before
/// `on_init` runs. Plugins receive it by mutable reference and cannot
/// rebind any of the handles.
pub struct PluginContext {
    plugin_id: String,
    plugin_dir: PathBuf,
    data_dir: PathBuf,
    descriptor: toml::Value,
    host: Arc<dyn HostView>,
    config: Arc<dyn ConfigStore>,
    registrar: Arc<dyn ActivityRegistrar>,
}

impl PluginContext {
    /// Create a context for one plugin instance. Called by the host
    /// during capability injection.
    pub fn new(
        plugin_id: String,
        plugin_dir: PathBuf,
        data_dir: PathBuf,
        descriptor: toml::Value,
        host: Arc<dyn HostView>,
        config: Arc<dyn ConfigStore>,
        registrar: Arc<dyn ActivityRegistrar>,
    ) -> Self {
        Self {
            plugin_id,
            plugin_dir,
            data_dir,
            descriptor,
            host,
            config,
            registrar,
        }
    }

    // ─── Identity & Descriptor ───────────────────────────────────────

    /// This plugin's own id.
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// This plugin's install directory (manifest and entry module).
    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// This plugin's directory for persistent data, under the hub's
    /// data root. Not created automatically.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The manifest's free-form `descriptor` block.
    pub fn descriptor(&self) -> &toml::Value {
        &self.descriptor
    }

    // ─── Host & Config Access ────────────────────────────────────────

    /// Read-only view of the host for querying other loaded plugins.
    pub fn host(&self) -> &dyn HostView {
        self.host.as_ref()
    }

    /// The shared configuration collaborator.
    pub fn config(&self) -> &dyn ConfigStore {
        self.config.as_ref()
    }

    /// Owned host view, for moving into activity callbacks.
    pub fn host_handle(&self) -> Arc<dyn HostView> {
        self.host.clone()
    }

    /// Owned config handle, for moving into activity callbacks.
    pub fn config_handle(&self) -> Arc<dyn ConfigStore> {
        self.config.clone()
    }

    /// Typed access to a shared config section.
    ///
    /// # Example
    /// ```ignore
    /// let section: Option<MySection> = ctx.config_section("my-plugin");
    /// ```
    pub fn config_section<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.config.section(name).and_then(|v| v.try_into().ok())
    }

    // ─── Activity Registration ───────────────────────────────────────

    /// Register a periodic hook driven by the shared scheduler.
    ///
    /// `owner` is always this plugin's id. `created_by` defaults to the
    /// owner and may name another plugin when registering a hook
    /// dispatched on its behalf.
    pub fn register_activity(
        &mut self,
        callback: ActivityFn,
        interval: Duration,
        created_by: Option<&str>,
    ) -> Result<(), PluginError> {
        let created_by = created_by.unwrap_or(&self.plugin_id);
        self.registrar
            .register(&self.plugin_id, created_by, interval, callback)
    }

    /// Remove this plugin's activities whose `created_by` matches.
    pub fn unregister_activity(&mut self, created_by: &str) {
        self.registrar.unregister(&self.plugin_id, created_by);
    }

    // ─── Logging ─────────────────────────────────────────────────────

    /// Log an info message (automatically prefixed with plugin id)
    pub fn log_info(&self, message: &str) {
        tracing::info!(plugin = %self.plugin_id, "{}", message);
    }

    /// Log a warning message
    pub fn log_warn(&self, message: &str) {
        tracing::warn!(plugin = %self.plugin_id, "{}", message);
    }

    /// Log an error message
    pub fn log_error(&self, message: &str) {
        tracing::error!(plugin = %self.plugin_id, "{}", message);
    }

    /// Log a debug message
    pub fn log_debug(&self, message: &str) {
        tracing::debug!(plugin = %self.plugin_id, "{}", message);
    }
}
