//! hearth-core: Core library for the hearth plugin hub
//!
//! This crate provides the foundational components for hearth:
//!
//! - **Plugin lifecycle** - [`PluginHost`] for discovering, loading and
//!   unloading plugins through an explicit status state machine
//! - **Activity scheduling** - [`plugins::ActivityScheduler`] and its
//!   shared tick task for recurring plugin callbacks
//! - **Configuration** - [`HubConfig`] for the hub's TOML configuration,
//!   shared with plugins section by section
//!
//! # Quick Start
//!
//! ```no_run
//! use hearth_core::config::HubConfig;
//! use hearth_core::plugins::PluginHost;
//! use std::sync::Arc;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let path = hearth_paths::config_dir().join("hearth.toml");
//!     let config = Arc::new(HubConfig::load_or_default(&path)?);
//!     let mut host = PluginHost::with_defaults(config);
//!
//!     host.discover()?;
//!     for id in host.loaded_plugins() {
//!         println!("loaded: {id}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod plugins;

// Re-export key types for convenience
pub use config::{ConfigError, HubConfig, PluginsSection, RuntimeSection, UpdateMode};
pub use plugins::{PluginHost, PluginHostError, PluginStatus};
