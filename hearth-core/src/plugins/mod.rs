//! Plugin system for hearth
//!
//! This module provides the infrastructure for running plugins:
//!
//! - [`PluginHost`]: discovers plugin directories and drives each plugin
//!   through its lifecycle state machine
//! - [`DependencyResolver`]: single-level, best-effort dependency install
//!   before a plugin's entry module is activated
//! - [`ActivityScheduler`]: shared recurring-callback scheduler driven by
//!   a 1-second tick task
//! - [`PluginHostError`]: error types for plugin operations
//!
//! # Plugin Discovery
//!
//! Plugins live in subdirectories of the configured plugin root
//! (default `~/.config/hearth/plugins/`). A directory is a plugin when
//! it contains a `plugin.toml` manifest; the directory name is the
//! plugin id.
//!
//! # Plugin Structure
//!
//! Each plugin directory should contain:
//! - `plugin.toml` - the manifest (entry, dependencies, descriptor)
//! - `<name>.so` (or `.dylib`/`.dll`) - the entry module, unless the
//!   manifest names one explicitly
//!
//! # Example
//!
//! ```ignore
//! use hearth_core::config::HubConfig;
//! use hearth_core::plugins::PluginHost;
//! use std::sync::Arc;
//!
//! let config = Arc::new(HubConfig::load_or_default(&config_path)?);
//! let mut host = PluginHost::with_defaults(config);
//!
//! // Discover and load everything under the plugin root
//! host.discover()?;
//!
//! // Drive recurring activities until shutdown
//! let timer = host.spawn_activity_timer();
//!
//! // Manage plugins
//! host.unload_plugin("heartbeat")?;
//! host.load_plugin("heartbeat")?;
//! ```

mod error;
mod host;
mod loader;
mod resolver;
mod scheduler;

pub use error::PluginHostError;
pub use host::{HostHandle, PluginHost, PluginInfo, PluginStatus, UpdateTask};
pub use loader::{ActivatedPlugin, DylibLoader, PluginConstructor, PluginLoader, StaticRegistry};
pub use resolver::{DependencyInstaller, DependencyResolver, FetchCommandInstaller, InstallError};
pub use scheduler::{ActivityScheduler, ActivityTimer, SchedulerHandle, TICK_PERIOD};
