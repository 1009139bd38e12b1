//! Heartbeat Plugin - A simple example plugin for hearth
//!
//! This plugin demonstrates:
//! - Basic plugin structure with the `export_plugin!` macro
//! - Implementing the `Plugin` trait (`on_init`, `on_unload`)
//! - Registering a recurring activity with the shared scheduler
//! - Reading settings from the manifest's descriptor block
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! ## Installing
//!
//! ```bash
//! mkdir -p ~/.config/hearth/plugins/heartbeat
//! cp plugin.toml ~/.config/hearth/plugins/heartbeat/
//! cp target/release/libheartbeat.so ~/.config/hearth/plugins/heartbeat/heartbeat.so
//! hearth serve
//! ```

use hearth_plugin_api::{export_plugin, Plugin, PluginContext, PluginError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Beat interval used when the descriptor does not set `interval_ms`.
const DEFAULT_INTERVAL_MS: u64 = 5000;

/// A plugin that periodically logs a heartbeat with the number of
/// currently loaded plugins.
#[derive(Default)]
pub struct HeartbeatPlugin {
    /// Beats emitted since this instance was initialized
    beats: Arc<AtomicU64>,
}

impl Plugin for HeartbeatPlugin {
    fn on_init(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
        let interval_ms = ctx
            .descriptor()
            .get("interval_ms")
            .and_then(|v| v.as_integer())
            .map(|v| v.max(1) as u64)
            .unwrap_or(DEFAULT_INTERVAL_MS);

        let beats = self.beats.clone();
        let host = ctx.host_handle();
        let plugin_id = ctx.plugin_id().to_string();
        ctx.register_activity(
            Box::new(move || {
                let beat = beats.fetch_add(1, Ordering::SeqCst) + 1;
                let loaded = host.loaded_plugins().len();
                tracing::info!(plugin = %plugin_id, beat, loaded, "Heartbeat");
            }),
            Duration::from_millis(interval_ms),
            None,
        )?;

        ctx.log_info(&format!("Heartbeat plugin initialized ({interval_ms}ms)"));
        Ok(())
    }

    fn on_unload(&mut self) -> Result<(), PluginError> {
        tracing::info!(
            beats = self.beats.load(Ordering::SeqCst),
            "Heartbeat plugin unloading"
        );
        Ok(())
    }
}

// This macro generates the C ABI entry points for dynamic loading
export_plugin!(HeartbeatPlugin);
