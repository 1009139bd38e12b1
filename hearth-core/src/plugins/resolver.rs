//! Dependency resolver - single-level, best-effort
//!
//! A manifest's dependency map is resolved before the plugin's entry
//! module is activated. Anything already present as a registered plugin
//! id counts as satisfied; everything else goes to the install
//! collaborator. Install failures are logged and the load continues:
//! there is no version-conflict detection, no transitive resolution and
//! no rollback. That weak contract is intentional.

use std::collections::BTreeMap;
use std::process::Command;
use std::sync::Arc;
use thiserror::Error;

/// Errors from the install collaborator.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The fetch command ran but reported failure
    #[error("Install command failed: {0}")]
    Command(String),

    /// The fetch command could not be spawned
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// External package-fetch collaborator, invoked with `(name, version)`.
pub trait DependencyInstaller: Send + Sync {
    fn install(&self, name: &str, version: &str) -> Result<(), InstallError>;
}

/// Installer that shells out to a configured fetch command as
/// `<command> <name> <version>`. With no command configured, installs
/// are skipped with a warning.
pub struct FetchCommandInstaller {
    command: Option<String>,
}

impl FetchCommandInstaller {
    pub fn new(command: Option<String>) -> Self {
        let command = command.filter(|c| !c.is_empty());
        Self { command }
    }
}

impl DependencyInstaller for FetchCommandInstaller {
    fn install(&self, name: &str, version: &str) -> Result<(), InstallError> {
        let Some(command) = &self.command else {
            tracing::warn!(
                dependency = %name,
                version = %version,
                "No install command configured, skipping dependency install"
            );
            return Ok(());
        };

        let output = Command::new(command).arg(name).arg(version).output()?;
        if output.status.success() {
            tracing::info!(
                dependency = %name,
                version = %version,
                "Dependency installed"
            );
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(InstallError::Command(stderr))
        }
    }
}

/// Resolves a manifest's declared dependencies ahead of activation.
pub struct DependencyResolver {
    installer: Arc<dyn DependencyInstaller>,
}

impl DependencyResolver {
    pub fn new(installer: Arc<dyn DependencyInstaller>) -> Self {
        Self { installer }
    }

    /// Satisfy each declared dependency that is not already a known
    /// plugin id. Never fails the owning plugin's load: install errors
    /// are logged and resolution moves on.
    pub fn resolve(
        &self,
        plugin: &str,
        dependencies: &BTreeMap<String, String>,
        known_ids: &[String],
    ) {
        for (name, version) in dependencies {
            if known_ids.iter().any(|id| id == name) {
                continue;
            }

            tracing::info!(
                plugin = %plugin,
                dependency = %name,
                version = %version,
                "Resolving dependency"
            );
            if let Err(e) = self.installer.install(name, version) {
                tracing::error!(
                    plugin = %plugin,
                    dependency = %name,
                    error = %e,
                    "Dependency install failed, continuing load"
                );
            }
        }
    }
}
