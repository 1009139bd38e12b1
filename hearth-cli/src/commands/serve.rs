//! Hearth serve command
//!
//! Runs the hub in the foreground: discovers and loads plugins, starts
//! the shared activity timer (and the update task when configured),
//! then waits for Ctrl-C before unloading everything cleanly.

use anyhow::Result;
use clap::Args;
use hearth_core::PluginHost;
use std::path::Path;
use tracing::info;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Start without loading any plugins
    #[arg(long)]
    pub no_plugins: bool,
}

/// Run the serve command
pub async fn run(args: ServeArgs, config_path: &Path) -> Result<()> {
    let config = super::load_config(config_path)?;
    let mut host = PluginHost::with_defaults(config);

    if !args.no_plugins {
        host.discover()?;
        info!(loaded = host.loaded_plugins().len(), "Plugins loaded");
    }

    let timer = host.spawn_activity_timer();
    let update_task = host.spawn_update_task();

    info!("hearth running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    if let Some(task) = update_task {
        task.shutdown().await;
    }
    timer.shutdown().await;
    host.unload_all();

    Ok(())
}
