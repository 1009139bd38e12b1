//! Plugin management commands

use anyhow::Result;
use clap::{Args, Subcommand};
use hearth_core::{PluginHost, PluginStatus};
use std::path::Path;

/// Plugin management arguments
#[derive(Args)]
pub struct PluginArgs {
    #[command(subcommand)]
    pub command: PluginCommands,
}

/// Plugin subcommands
#[derive(Subcommand)]
pub enum PluginCommands {
    /// List discovered plugins and their status
    List,
    /// Show plugin details
    Info {
        /// Plugin name
        name: String,
    },
}

/// Run plugin command
pub fn run(args: PluginArgs, config_path: &Path) -> Result<()> {
    let config = super::load_config(config_path)?;
    let mut host = PluginHost::with_defaults(config);

    // Discover to see what is installed; per-plugin failures show up
    // in the listing as `failed`.
    host.discover()?;

    let result = match args.command {
        PluginCommands::List => list_plugins(&host),
        PluginCommands::Info { name } => show_plugin_info(&host, &name),
    };

    host.unload_all();
    result
}

fn list_plugins(host: &PluginHost) -> Result<()> {
    let plugins = host.plugins();

    if plugins.is_empty() {
        println!("No plugins installed");
        println!();
        println!("Plugin directory: ~/.config/hearth/plugins/");
        println!();
        println!("To install a plugin:");
        println!("  1. Create a plugin directory: mkdir -p ~/.config/hearth/plugins/my-plugin");
        println!("  2. Write its manifest: ~/.config/hearth/plugins/my-plugin/plugin.toml");
        println!(
            "  3. Copy the plugin library: cp libmy_plugin.so ~/.config/hearth/plugins/my-plugin/my-plugin.so"
        );
        return Ok(());
    }

    for p in plugins {
        let marker = match p.status {
            PluginStatus::Loaded => "✓",
            PluginStatus::Failed => "✗",
            _ => "○",
        };
        println!("{} {}    {}", marker, p.id, p.status);
    }

    Ok(())
}

fn show_plugin_info(host: &PluginHost, name: &str) -> Result<()> {
    let Some(info) = host.plugins().into_iter().find(|p| p.id == name) else {
        println!("Plugin '{name}' not found");
        return Ok(());
    };

    println!("Plugin: {}", info.id);
    println!("Status: {}", info.status);
    if let Some(entry) = &info.manifest.entry {
        println!("Entry: {entry}");
    }
    if !info.manifest.dependencies.is_empty() {
        println!("Dependencies:");
        for (dep, version) in &info.manifest.dependencies {
            println!("  {dep} = {version}");
        }
    }
    if let Some(table) = info.manifest.descriptor.as_table() {
        if !table.is_empty() {
            println!("Descriptor:");
            for (key, value) in table {
                println!("  {key} = {value}");
            }
        }
    }

    Ok(())
}
