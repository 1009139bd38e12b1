//! hearth-plugin-api - Plugin API for the hearth hub
//!
//! This crate provides the traits and types needed to write plugins for
//! hearth. Plugins are native Rust dynamic libraries living in their own
//! directory under the hub's plugin root, next to a `plugin.toml`
//! manifest. The host injects a [`PluginContext`] carrying the capability
//! handles (identity, descriptor, data directory, host view, config,
//! logging, activity registration) before calling the init hook.
//!
//! # Example
//!
//! ```ignore
//! use hearth_plugin_api::{export_plugin, Plugin, PluginContext, PluginError};
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! pub struct MyPlugin;
//!
//! impl Plugin for MyPlugin {
//!     fn on_init(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
//!         ctx.log_info("Plugin loaded!");
//!         ctx.register_activity(
//!             Box::new(|| tracing::info!("periodic hook")),
//!             Duration::from_secs(5),
//!             None,
//!         )
//!     }
//!
//!     fn on_unload(&mut self) -> Result<(), PluginError> {
//!         Ok(())
//!     }
//! }
//!
//! export_plugin!(MyPlugin);
//! ```

pub mod context;
pub mod error;
pub mod manifest;

pub use context::{ActivityFn, ActivityRegistrar, ConfigStore, HostView, PluginContext};
pub use error::PluginError;
pub use manifest::{PluginManifest, MANIFEST_FILE};

/// Current plugin API version. Plugins must match this exactly.
/// Checked by the host when loading a plugin library.
pub const API_VERSION: u32 = 1;

/// The core plugin trait - implement this to create a hearth plugin.
///
/// Both hooks are required: `on_init` runs once after capability
/// injection (a returned error aborts the load), `on_unload` runs once
/// during unload.
pub trait Plugin: Send + Sync {
    /// Called when the plugin is loaded. Use this to initialize state
    /// and register activities through the context.
    fn on_init(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError>;

    /// Called when the plugin is unloaded. Use this to clean up
    /// resources. Previously registered activities stay in the
    /// scheduler but never fire while the plugin is not loaded.
    fn on_unload(&mut self) -> Result<(), PluginError>;
}

/// Export a plugin type for dynamic loading.
///
/// This macro generates the C ABI entry points hearth uses to load
/// and unload plugins dynamically.
///
/// # Usage
///
/// ```ignore
/// hearth_plugin_api::export_plugin!(MyPlugin);
/// ```
///
/// # Generated Functions
///
/// - `_hearth_plugin_create()`: Creates a new plugin instance
/// - `_hearth_plugin_api_version()`: Returns the API version
/// - `_hearth_plugin_destroy()`: Destroys a plugin instance
#[macro_export]
macro_rules! export_plugin {
    ($plugin_type:ty) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn _hearth_plugin_create() -> *mut dyn $crate::Plugin {
            let plugin: Box<dyn $crate::Plugin> = Box::new(<$plugin_type>::default());
            Box::into_raw(plugin)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _hearth_plugin_api_version() -> u32 {
            $crate::API_VERSION
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _hearth_plugin_destroy(ptr: *mut dyn $crate::Plugin) {
            if !ptr.is_null() {
                unsafe {
                    drop(Box::from_raw(ptr));
                }
            }
        }
    };
}
