//! Plugin activation - dynamic library loading and the compiled-in registry

use libloading::Library;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use hearth_plugin_api::{Plugin, PluginManifest, API_VERSION};

use super::error::PluginHostError;

/// An activated entry module: the plugin instance plus the library that
/// must stay alive for as long as the instance does.
pub struct ActivatedPlugin {
    pub instance: Box<dyn Plugin>,
    /// `None` for compiled-in plugins.
    pub library: Option<Library>,
}

/// Activates a plugin's entry module. The production mechanism is
/// shared-library loading ([`DylibLoader`]); embedders and tests can
/// link plugins statically through a [`StaticRegistry`] of constructors
/// keyed by plugin id.
pub trait PluginLoader: Send + Sync {
    fn activate(
        &self,
        id: &str,
        dir: &Path,
        manifest: &PluginManifest,
    ) -> Result<ActivatedPlugin, PluginHostError>;
}

/// Loads plugins as native dynamic libraries.
pub struct DylibLoader;

impl DylibLoader {
    /// Resolve the library path: the manifest's `entry` when present,
    /// otherwise probe for `<id>.<ext>` / `lib<id>.<ext>`.
    fn resolve_library(
        &self,
        id: &str,
        dir: &Path,
        manifest: &PluginManifest,
    ) -> Result<PathBuf, PluginHostError> {
        if let Some(entry) = &manifest.entry {
            let path = dir.join(entry);
            if path.exists() {
                return Ok(path);
            }
            return Err(PluginHostError::LibraryNotFound {
                dir: dir.to_path_buf(),
            });
        }

        let extensions = if cfg!(target_os = "macos") {
            vec!["dylib", "so"]
        } else if cfg!(target_os = "windows") {
            vec!["dll"]
        } else {
            vec!["so"]
        };

        for ext in extensions {
            let lib_path = dir.join(format!("{}.{}", id, ext));
            if lib_path.exists() {
                return Ok(lib_path);
            }

            let lib_path = dir.join(format!("lib{}.{}", id, ext));
            if lib_path.exists() {
                return Ok(lib_path);
            }
        }

        Err(PluginHostError::LibraryNotFound {
            dir: dir.to_path_buf(),
        })
    }
}

impl PluginLoader for DylibLoader {
    fn activate(
        &self,
        id: &str,
        dir: &Path,
        manifest: &PluginManifest,
    ) -> Result<ActivatedPlugin, PluginHostError> {
        let lib_path = self.resolve_library(id, dir, manifest)?;

        // SAFETY: loading a library the operator placed in the plugin
        // directory; it is expected to follow the Plugin ABI contract.
        let library = unsafe { Library::new(&lib_path)? };

        // SAFETY: calling a C function exported by export_plugin!.
        let api_version_fn: libloading::Symbol<extern "C" fn() -> u32> =
            unsafe { library.get(b"_hearth_plugin_api_version")? };

        let plugin_api_version = api_version_fn();
        if plugin_api_version != API_VERSION {
            return Err(PluginHostError::ApiVersionMismatch {
                expected: API_VERSION,
                found: plugin_api_version,
            });
        }

        // SAFETY: the create function returns a raw pointer produced by
        // Box::into_raw in export_plugin!, converted back here.
        let create_fn: libloading::Symbol<extern "C" fn() -> *mut dyn Plugin> =
            unsafe { library.get(b"_hearth_plugin_create")? };

        let instance = unsafe { Box::from_raw(create_fn()) };

        Ok(ActivatedPlugin {
            instance,
            library: Some(library),
        })
    }
}

/// Constructor used by [`StaticRegistry`].
pub type PluginConstructor = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Compiled-in registry of plugin constructors keyed by id. The
/// alternative to dynamic loading for statically linked plugins.
#[derive(Default)]
pub struct StaticRegistry {
    constructors: HashMap<String, PluginConstructor>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for a plugin id.
    pub fn register(&mut self, id: impl Into<String>, constructor: PluginConstructor) {
        self.constructors.insert(id.into(), constructor);
    }
}

impl PluginLoader for StaticRegistry {
    fn activate(
        &self,
        id: &str,
        _dir: &Path,
        _manifest: &PluginManifest,
    ) -> Result<ActivatedPlugin, PluginHostError> {
        let constructor =
            self.constructors
                .get(id)
                .ok_or_else(|| PluginHostError::NoConstructor {
                    id: id.to_string(),
                })?;

        Ok(ActivatedPlugin {
            instance: constructor(),
            library: None,
        })
    }
}
