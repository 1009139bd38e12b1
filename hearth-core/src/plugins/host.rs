//! PluginHost - discovery, the per-plugin state machine and capability injection

use libloading::Library;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use hearth_plugin_api::{HostView, Plugin, PluginContext, PluginManifest, MANIFEST_FILE};

use super::error::PluginHostError;
use super::loader::{DylibLoader, PluginLoader};
use super::resolver::{DependencyInstaller, DependencyResolver, FetchCommandInstaller};
use super::scheduler::{ActivityTimer, SchedulerHandle};
use crate::config::{HubConfig, RuntimeSection, UpdateMode};

/// Lifecycle status of one plugin record.
///
/// A successful load walks `Stopped -> Loading -> ResolvingDependencies
/// -> Init -> Loaded`; unload walks `Loaded -> Unloading -> Unloaded ->
/// Stopped`. A failed activation, init or unload hook parks the record
/// at `Failed` until the next explicit load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginStatus {
    Stopped,
    Loading,
    ResolvingDependencies,
    Init,
    Loaded,
    Unloading,
    Unloaded,
    Failed,
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PluginStatus::Stopped => "stopped",
            PluginStatus::Loading => "loading",
            PluginStatus::ResolvingDependencies => "resolving-dependencies",
            PluginStatus::Init => "init",
            PluginStatus::Loaded => "loaded",
            PluginStatus::Unloading => "unloading",
            PluginStatus::Unloaded => "unloaded",
            PluginStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Ordered status map shared between the host and the capability
/// handles. Insertion order is discovery order and never changes.
#[derive(Default)]
struct StatusBoard {
    order: Vec<String>,
    status: HashMap<String, PluginStatus>,
}

impl StatusBoard {
    fn insert(&mut self, id: &str) {
        if !self.status.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.status.insert(id.to_string(), PluginStatus::Stopped);
    }

    fn set(&mut self, id: &str, status: PluginStatus) {
        if let Some(s) = self.status.get_mut(id) {
            *s = status;
        }
    }

    fn get(&self, id: &str) -> Option<PluginStatus> {
        self.status.get(id).copied()
    }

    fn ids(&self) -> Vec<String> {
        self.order.clone()
    }

    fn loaded(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.status.get(*id) == Some(&PluginStatus::Loaded))
            .cloned()
            .collect()
    }
}

/// Cloneable read-only view of the host's status board. This is the
/// "host accessor" capability plugins receive, and the gate the
/// scheduler uses to keep activities of unloaded plugins inert.
#[derive(Clone)]
pub struct HostHandle {
    board: Arc<RwLock<StatusBoard>>,
}

impl HostHandle {
    /// Current status of a plugin, if known.
    pub fn status(&self, id: &str) -> Option<PluginStatus> {
        self.board.read().unwrap().get(id)
    }
}

impl HostView for HostHandle {
    fn loaded_plugins(&self) -> Vec<String> {
        self.board.read().unwrap().loaded()
    }

    fn is_loaded(&self, id: &str) -> bool {
        self.status(id) == Some(PluginStatus::Loaded)
    }
}

/// A loaded plugin instance plus the library backing it.
struct LoadedInstance {
    instance: Box<dyn Plugin>,
    /// Keep the library loaded for as long as the instance exists.
    /// `None` for compiled-in plugins.
    _library: Option<Library>,
}

/// One discovered plugin. Exclusively owned by the host; the instance
/// is present only while the status is `Loaded`.
struct PluginRecord {
    dir: PathBuf,
    manifest_path: PathBuf,
    manifest: PluginManifest,
    instance: Option<LoadedInstance>,
}

/// Snapshot of one plugin for callers outside the host.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub id: String,
    pub status: PluginStatus,
    pub manifest: PluginManifest,
}

/// The plugin lifecycle host.
///
/// Owns the descriptor records, the dependency resolver, the loader and
/// the activity scheduler, and drives each plugin through its state
/// machine. All lifecycle operations are synchronous `&mut self`
/// methods, so load/unload on the same record can never interleave; a
/// slow init hook delays the caller (and any tick waiting on the
/// scheduler), which is a documented limitation rather than a bug.
pub struct PluginHost {
    records: HashMap<String, PluginRecord>,
    board: Arc<RwLock<StatusBoard>>,
    plugin_dir: PathBuf,
    runtime: RuntimeSection,
    config: Arc<HubConfig>,
    scheduler: SchedulerHandle,
    resolver: DependencyResolver,
    loader: Box<dyn PluginLoader>,
}

impl PluginHost {
    /// Create a host with explicit loader and installer collaborators.
    pub fn new(
        config: Arc<HubConfig>,
        loader: Box<dyn PluginLoader>,
        installer: Arc<dyn DependencyInstaller>,
    ) -> Self {
        let plugins = config.plugins();
        let board = Arc::new(RwLock::new(StatusBoard::default()));

        let scheduler = SchedulerHandle::new();
        scheduler.set_gate(Arc::new(HostHandle {
            board: board.clone(),
        }));

        Self {
            records: HashMap::new(),
            board,
            plugin_dir: plugins.dir,
            runtime: plugins.runtime,
            config,
            scheduler,
            resolver: DependencyResolver::new(installer),
            loader,
        }
    }

    /// Create a host with the production collaborators: dynamic library
    /// loading and the configured fetch command for dependencies.
    pub fn with_defaults(config: Arc<HubConfig>) -> Self {
        let install_command = config.plugins().runtime.install_command.clone();
        Self::new(
            config,
            Box::new(DylibLoader),
            Arc::new(FetchCommandInstaller::new(install_command)),
        )
    }

    /// Read-only handle to the status board.
    pub fn handle(&self) -> HostHandle {
        HostHandle {
            board: self.board.clone(),
        }
    }

    /// The shared activity scheduler.
    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    /// Scan the plugin root for subdirectories carrying a manifest,
    /// register a record for each (sorted by name, which fixes the
    /// registry iteration order) and load them. Directories without a
    /// manifest are skipped; a plugin that fails to load is logged and
    /// does not stop the pass.
    pub fn discover(&mut self) -> Result<(), PluginHostError> {
        tracing::info!(dir = %self.plugin_dir.display(), "Discovering plugins");

        if !self.plugin_dir.exists() {
            tracing::debug!(dir = %self.plugin_dir.display(), "Plugin directory does not exist");
            return Ok(());
        }

        let mut candidates = Vec::new();
        for entry in std::fs::read_dir(&self.plugin_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let manifest_path = path.join(MANIFEST_FILE);
            if !manifest_path.exists() {
                continue;
            }
            let Some(id) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
                continue;
            };
            candidates.push((id, path, manifest_path));
        }
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        for (id, dir, manifest_path) in candidates {
            tracing::info!(plugin = %id, "Found plugin manifest");
            self.records.insert(
                id.clone(),
                PluginRecord {
                    dir,
                    manifest_path,
                    manifest: PluginManifest::default(),
                    instance: None,
                },
            );
            self.board.write().unwrap().insert(&id);

            if let Err(e) = self.load_plugin(&id) {
                tracing::error!(plugin = %id, error = %e, "Failed to load plugin");
            }
        }

        Ok(())
    }

    /// Drive one plugin through the load path. No-op for unknown ids.
    ///
    /// Calling this on a record that is not `Stopped` re-parses the
    /// manifest and re-runs the whole path - that is the supported hot
    /// reload, not a guarded error. On failure the record is parked at
    /// `Failed` and the error is returned; sibling plugins are
    /// unaffected.
    pub fn load_plugin(&mut self, id: &str) -> Result<(), PluginHostError> {
        if !self.records.contains_key(id) {
            return Ok(());
        }

        tracing::info!(plugin = %id, "Loading plugin");
        self.set_status(id, PluginStatus::Loading);

        let (dir, manifest_path) = {
            let record = &self.records[id];
            (record.dir.clone(), record.manifest_path.clone())
        };

        let manifest = match PluginManifest::load(&manifest_path) {
            Ok(manifest) => manifest,
            Err(e) => {
                self.set_status(id, PluginStatus::Failed);
                return Err(PluginHostError::Manifest {
                    id: id.to_string(),
                    message: e.to_string(),
                });
            }
        };
        if let Some(record) = self.records.get_mut(id) {
            record.manifest = manifest.clone();
        }

        self.set_status(id, PluginStatus::ResolvingDependencies);
        let known_ids = self.board.read().unwrap().ids();
        self.resolver.resolve(id, &manifest.dependencies, &known_ids);

        let activated = match self.loader.activate(id, &dir, &manifest) {
            Ok(activated) => activated,
            Err(e) => {
                self.set_status(id, PluginStatus::Failed);
                return Err(e);
            }
        };

        self.set_status(id, PluginStatus::Init);
        let data_dir = hearth_paths::data_dir().join("plugins").join(id);
        let mut context = PluginContext::new(
            id.to_string(),
            dir,
            data_dir,
            manifest.descriptor.clone(),
            Arc::new(self.handle()),
            self.config.clone(),
            Arc::new(self.scheduler.clone()),
        );

        let mut instance = activated.instance;
        if let Err(e) = instance.on_init(&mut context) {
            self.set_status(id, PluginStatus::Failed);
            return Err(PluginHostError::Init(e));
        }

        if let Some(record) = self.records.get_mut(id) {
            record.instance = Some(LoadedInstance {
                instance,
                _library: activated.library,
            });
        }
        self.set_status(id, PluginStatus::Loaded);
        tracing::info!(plugin = %id, "Plugin loaded");
        Ok(())
    }

    /// Unload one plugin. No-op for unknown ids or records without an
    /// instance. The plugin's activities stay registered in the
    /// scheduler but are inert while the plugin is not `Loaded`.
    pub fn unload_plugin(&mut self, id: &str) -> Result<(), PluginHostError> {
        let Some(mut loaded) = self.records.get_mut(id).and_then(|r| r.instance.take()) else {
            return Ok(());
        };

        tracing::info!(plugin = %id, "Unloading plugin");
        self.set_status(id, PluginStatus::Unloading);

        if let Err(e) = loaded.instance.on_unload() {
            if let Some(record) = self.records.get_mut(id) {
                record.instance = Some(loaded);
            }
            self.set_status(id, PluginStatus::Failed);
            return Err(PluginHostError::Unload(e));
        }

        // The record passes through `unloaded` and returns to `stopped`,
        // eligible for a future load.
        self.set_status(id, PluginStatus::Unloaded);
        self.set_status(id, PluginStatus::Stopped);
        tracing::info!(plugin = %id, "Plugin unloaded");
        Ok(())
    }

    /// Unload every loaded plugin, logging per-plugin failures.
    pub fn unload_all(&mut self) {
        for id in self.loaded_plugins() {
            if let Err(e) = self.unload_plugin(&id) {
                tracing::error!(plugin = %id, error = %e, "Error unloading plugin");
            }
        }
        tracing::info!("All plugins unloaded");
    }

    /// Ids of plugins currently `Loaded`, in discovery order.
    pub fn loaded_plugins(&self) -> Vec<String> {
        self.board.read().unwrap().loaded()
    }

    /// Current status of one plugin.
    pub fn status(&self, id: &str) -> Option<PluginStatus> {
        self.board.read().unwrap().get(id)
    }

    /// Suspend or resume all activities of one plugin without removing
    /// them. No-op if the owner is unknown to the registry or has never
    /// registered an activity.
    pub fn set_plugin_activity(&mut self, owner: &str, enabled: bool) {
        if self.records.contains_key(owner) {
            self.scheduler.set_enabled(owner, enabled);
        }
    }

    /// Number of discovered plugins.
    pub fn plugin_count(&self) -> usize {
        self.records.len()
    }

    /// Snapshot of every record, in discovery order.
    pub fn plugins(&self) -> Vec<PluginInfo> {
        let board = self.board.read().unwrap();
        board
            .ids()
            .into_iter()
            .filter_map(|id| {
                let status = board.get(&id)?;
                let manifest = self.records.get(&id)?.manifest.clone();
                Some(PluginInfo {
                    id,
                    status,
                    manifest,
                })
            })
            .collect()
    }

    /// Spawn the shared activity tick task.
    pub fn spawn_activity_timer(&self) -> ActivityTimer {
        self.scheduler.spawn_timer()
    }

    /// Spawn the periodic update task when `update_mode = "auto"`.
    /// The update body is an extension point and currently only logs.
    pub fn spawn_update_task(&self) -> Option<UpdateTask> {
        if self.runtime.update_mode != UpdateMode::Auto {
            return None;
        }

        let period = Duration::from_millis(self.runtime.update_interval_ms.max(1));
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // interval fires immediately on the first tick; skip it so
            // the first check happens one full period after startup.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        tracing::debug!("Plugin update check requested, updater not implemented");
                    }
                }
            }
        });

        Some(UpdateTask { cancel, task })
    }

    fn set_status(&self, id: &str, status: PluginStatus) {
        tracing::debug!(plugin = %id, status = %status, "Plugin status change");
        self.board.write().unwrap().set(id, status);
    }
}

/// Handle to the periodic update task.
pub struct UpdateTask {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl UpdateTask {
    /// Signal the task to stop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::loader::StaticRegistry;
    use crate::plugins::resolver::InstallError;
    use hearth_plugin_api::PluginError;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingInstaller {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl DependencyInstaller for RecordingInstaller {
        fn install(&self, name: &str, version: &str) -> Result<(), InstallError> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), version.to_string()));
            if self.fail {
                Err(InstallError::Command("mirror unreachable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    /// Configurable in-memory plugin for host tests.
    struct TestPlugin {
        id: String,
        events: Arc<Mutex<Vec<String>>>,
        activity: Option<(Duration, Arc<AtomicUsize>)>,
        fail_init: bool,
        fail_unload: bool,
    }

    impl Plugin for TestPlugin {
        fn on_init(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("init:{}", ctx.plugin_id()));
            if let Some((interval, counter)) = &self.activity {
                let counter = counter.clone();
                ctx.register_activity(
                    Box::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
                    *interval,
                    None,
                )?;
            }
            if self.fail_init {
                return Err(PluginError::custom("init failed"));
            }
            Ok(())
        }

        fn on_unload(&mut self) -> Result<(), PluginError> {
            self.events.lock().unwrap().push(format!("unload:{}", self.id));
            if self.fail_unload {
                return Err(PluginError::custom("unload failed"));
            }
            Ok(())
        }
    }

    struct TestSetup {
        root: TempDir,
        events: Arc<Mutex<Vec<String>>>,
        registry: StaticRegistry,
    }

    impl TestSetup {
        fn new() -> Self {
            Self {
                root: TempDir::new().unwrap(),
                events: Arc::new(Mutex::new(Vec::new())),
                registry: StaticRegistry::new(),
            }
        }

        fn add_plugin(&mut self, id: &str, manifest: &str) {
            self.add_plugin_with(id, manifest, None, false, false);
        }

        fn add_plugin_with(
            &mut self,
            id: &str,
            manifest: &str,
            activity: Option<(Duration, Arc<AtomicUsize>)>,
            fail_init: bool,
            fail_unload: bool,
        ) {
            write_manifest(self.root.path(), id, manifest);
            let events = self.events.clone();
            let id_owned = id.to_string();
            self.registry.register(
                id,
                Box::new(move || {
                    Box::new(TestPlugin {
                        id: id_owned.clone(),
                        events: events.clone(),
                        activity: activity.clone(),
                        fail_init,
                        fail_unload,
                    })
                }),
            );
        }

        fn host(self) -> (PluginHost, Arc<Mutex<Vec<String>>>, TempDir) {
            self.host_with_installer(Arc::new(RecordingInstaller::default()))
        }

        fn host_with_installer(
            self,
            installer: Arc<dyn DependencyInstaller>,
        ) -> (PluginHost, Arc<Mutex<Vec<String>>>, TempDir) {
            let config = config_for(self.root.path());
            let host = PluginHost::new(config, Box::new(self.registry), installer);
            (host, self.events, self.root)
        }
    }

    fn config_for(dir: &Path) -> Arc<HubConfig> {
        Arc::new(
            HubConfig::parse(&format!("[plugins]\ndir = \"{}\"\n", dir.display())).unwrap(),
        )
    }

    fn write_manifest(root: &Path, id: &str, content: &str) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE), content).unwrap();
    }

    #[test]
    fn test_discover_loads_plugin_with_empty_manifest() {
        let mut setup = TestSetup::new();
        setup.add_plugin("alpha", "");
        let (mut host, events, _root) = setup.host();

        host.discover().unwrap();

        assert_eq!(host.status("alpha"), Some(PluginStatus::Loaded));
        assert_eq!(host.loaded_plugins(), vec!["alpha".to_string()]);
        assert_eq!(events.lock().unwrap().as_slice(), &["init:alpha".to_string()]);
    }

    #[test]
    fn test_discover_skips_directory_without_manifest() {
        let setup = TestSetup::new();
        std::fs::create_dir_all(setup.root.path().join("not-a-plugin")).unwrap();
        let (mut host, _, _root) = setup.host();

        host.discover().unwrap();

        assert_eq!(host.plugin_count(), 0);
        assert_eq!(host.status("not-a-plugin"), None);
    }

    #[test]
    fn test_discover_missing_root_is_ok() {
        let config = config_for(Path::new("/nonexistent/plugin/root"));
        let mut host = PluginHost::new(
            config,
            Box::new(StaticRegistry::new()),
            Arc::new(RecordingInstaller::default()),
        );
        host.discover().unwrap();
        assert_eq!(host.plugin_count(), 0);
    }

    #[test]
    fn test_registry_order_is_sorted_and_stable() {
        let mut setup = TestSetup::new();
        setup.add_plugin("c", "");
        setup.add_plugin("a", "");
        setup.add_plugin("b", "");
        let (mut host, _, _root) = setup.host();

        host.discover().unwrap();

        let expected: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(host.loaded_plugins(), expected);
        // Idempotent between state-mutating calls.
        assert_eq!(host.loaded_plugins(), expected);
    }

    #[test]
    fn test_dependency_install_invoked_once_with_exact_args() {
        let mut setup = TestSetup::new();
        setup.add_plugin(
            "beta",
            "[dependencies]\n\"shared-lib\" = \"1.2.0\"\n",
        );
        let installer = Arc::new(RecordingInstaller::default());
        let (mut host, _, _root) = setup.host_with_installer(installer.clone());

        host.discover().unwrap();

        let calls = installer.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[("shared-lib".to_string(), "1.2.0".to_string())]
        );
    }

    #[test]
    fn test_dependency_on_registered_plugin_is_not_installed() {
        let mut setup = TestSetup::new();
        setup.add_plugin("alpha", "");
        // "alpha" sorts before "beta", so it is registered by the time
        // beta's dependencies are resolved.
        setup.add_plugin("beta", "[dependencies]\nalpha = \"0.1.0\"\n");
        let installer = Arc::new(RecordingInstaller::default());
        let (mut host, _, _root) = setup.host_with_installer(installer.clone());

        host.discover().unwrap();

        assert!(installer.calls.lock().unwrap().is_empty());
        assert_eq!(host.loaded_plugins().len(), 2);
    }

    #[test]
    fn test_install_failure_does_not_abort_load() {
        let mut setup = TestSetup::new();
        setup.add_plugin("beta", "[dependencies]\n\"shared-lib\" = \"1.2.0\"\n");
        let installer = Arc::new(RecordingInstaller {
            fail: true,
            ..Default::default()
        });
        let (mut host, _, _root) = setup.host_with_installer(installer);

        host.discover().unwrap();

        assert_eq!(host.status("beta"), Some(PluginStatus::Loaded));
    }

    #[test]
    fn test_init_failure_parks_record_at_failed() {
        let mut setup = TestSetup::new();
        setup.add_plugin_with("alpha", "", None, true, false);
        let (mut host, _, _root) = setup.host();

        // discover logs the failure and continues
        host.discover().unwrap();
        assert_eq!(host.status("alpha"), Some(PluginStatus::Failed));
        assert!(host.loaded_plugins().is_empty());

        // an explicit load surfaces the error to the caller
        let result = host.load_plugin("alpha");
        assert!(matches!(result, Err(PluginHostError::Init(_))));
    }

    #[test]
    fn test_failed_plugin_does_not_stop_siblings() {
        let mut setup = TestSetup::new();
        setup.add_plugin_with("alpha", "", None, true, false);
        setup.add_plugin("beta", "");
        let (mut host, _, _root) = setup.host();

        host.discover().unwrap();

        assert_eq!(host.status("alpha"), Some(PluginStatus::Failed));
        assert_eq!(host.loaded_plugins(), vec!["beta".to_string()]);
    }

    #[test]
    fn test_activation_failure_parks_record_at_failed() {
        let setup = TestSetup::new();
        // Manifest exists but no constructor is registered.
        write_manifest(setup.root.path(), "ghost", "");
        let (mut host, _, _root) = setup.host();

        host.discover().unwrap();
        assert_eq!(host.status("ghost"), Some(PluginStatus::Failed));

        let result = host.load_plugin("ghost");
        assert!(matches!(result, Err(PluginHostError::NoConstructor { .. })));
    }

    #[test]
    fn test_load_unknown_id_is_noop() {
        let (mut host, _, _root) = TestSetup::new().host();
        assert!(host.load_plugin("ghost").is_ok());
        assert!(host.unload_plugin("ghost").is_ok());
    }

    #[test]
    fn test_unload_returns_record_to_stopped() {
        let mut setup = TestSetup::new();
        setup.add_plugin("alpha", "");
        let (mut host, events, _root) = setup.host();

        host.discover().unwrap();
        host.unload_plugin("alpha").unwrap();

        assert_eq!(host.status("alpha"), Some(PluginStatus::Stopped));
        assert!(host.loaded_plugins().is_empty());
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &["init:alpha".to_string(), "unload:alpha".to_string()]
        );
    }

    #[test]
    fn test_unload_failure_parks_record_at_failed() {
        let mut setup = TestSetup::new();
        setup.add_plugin_with("alpha", "", None, false, true);
        let (mut host, _, _root) = setup.host();

        host.discover().unwrap();
        let result = host.unload_plugin("alpha");

        assert!(matches!(result, Err(PluginHostError::Unload(_))));
        assert_eq!(host.status("alpha"), Some(PluginStatus::Failed));
    }

    #[test]
    fn test_reload_reruns_whole_path() {
        let mut setup = TestSetup::new();
        setup.add_plugin("alpha", "");
        let (mut host, events, _root) = setup.host();

        host.discover().unwrap();
        host.load_plugin("alpha").unwrap();

        assert_eq!(host.status("alpha"), Some(PluginStatus::Loaded));
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &["init:alpha".to_string(), "init:alpha".to_string()]
        );
    }

    #[test]
    fn test_unload_leaves_activities_registered_but_inert() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut setup = TestSetup::new();
        setup.add_plugin_with(
            "alpha",
            "",
            Some((Duration::from_millis(10), counter.clone())),
            false,
            false,
        );
        let (mut host, _, _root) = setup.host();

        host.discover().unwrap();
        let t = Instant::now() + Duration::from_millis(20);
        host.scheduler().run_due(t);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        host.unload_plugin("alpha").unwrap();
        host.scheduler().run_due(t + Duration::from_millis(20));

        // Still registered, never invoked again.
        assert_eq!(host.scheduler().activity_count("alpha"), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_plugin_activity_suspends_and_resumes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut setup = TestSetup::new();
        setup.add_plugin_with(
            "alpha",
            "",
            Some((Duration::from_millis(10), counter.clone())),
            false,
            false,
        );
        let (mut host, _, _root) = setup.host();
        host.discover().unwrap();

        host.set_plugin_activity("alpha", false);
        host.scheduler().run_due(Instant::now() + Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        host.set_plugin_activity("alpha", true);
        host.scheduler().run_due(Instant::now() + Duration::from_millis(40));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // Unknown owner is a no-op, not a panic.
        host.set_plugin_activity("ghost", false);
    }

    #[test]
    fn test_status_is_init_during_init_hook() {
        struct StatusProbe {
            slot: Arc<Mutex<Option<HostHandle>>>,
            observed: Arc<Mutex<Option<PluginStatus>>>,
        }

        impl Plugin for StatusProbe {
            fn on_init(&mut self, _ctx: &mut PluginContext) -> Result<(), PluginError> {
                if let Some(handle) = self.slot.lock().unwrap().as_ref() {
                    *self.observed.lock().unwrap() = handle.status("alpha");
                }
                Ok(())
            }

            fn on_unload(&mut self) -> Result<(), PluginError> {
                Ok(())
            }
        }

        let root = TempDir::new().unwrap();
        write_manifest(root.path(), "alpha", "");

        let slot: Arc<Mutex<Option<HostHandle>>> = Arc::new(Mutex::new(None));
        let observed: Arc<Mutex<Option<PluginStatus>>> = Arc::new(Mutex::new(None));

        let mut registry = StaticRegistry::new();
        let slot_clone = slot.clone();
        let observed_clone = observed.clone();
        registry.register(
            "alpha",
            Box::new(move || {
                Box::new(StatusProbe {
                    slot: slot_clone.clone(),
                    observed: observed_clone.clone(),
                })
            }),
        );

        let mut host = PluginHost::new(
            config_for(root.path()),
            Box::new(registry),
            Arc::new(RecordingInstaller::default()),
        );
        *slot.lock().unwrap() = Some(host.handle());

        host.discover().unwrap();

        // The init hook runs while the record is in `init`, and the
        // record only reaches `loaded` afterwards.
        assert_eq!(*observed.lock().unwrap(), Some(PluginStatus::Init));
        assert_eq!(host.status("alpha"), Some(PluginStatus::Loaded));
    }

    #[test]
    fn test_context_data_dir_is_per_plugin() {
        struct DataDirRecorder {
            seen: Arc<Mutex<Option<PathBuf>>>,
        }

        impl Plugin for DataDirRecorder {
            fn on_init(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
                *self.seen.lock().unwrap() = Some(ctx.data_dir().to_path_buf());
                Ok(())
            }

            fn on_unload(&mut self) -> Result<(), PluginError> {
                Ok(())
            }
        }

        let root = TempDir::new().unwrap();
        write_manifest(root.path(), "alpha", "");

        let seen: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let mut registry = StaticRegistry::new();
        registry.register(
            "alpha",
            Box::new(move || {
                Box::new(DataDirRecorder {
                    seen: seen_clone.clone(),
                })
            }),
        );

        let mut host = PluginHost::new(
            config_for(root.path()),
            Box::new(registry),
            Arc::new(RecordingInstaller::default()),
        );
        host.discover().unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.as_ref().unwrap().ends_with("hearth/plugins/alpha"));
    }

    #[test]
    fn test_plugins_snapshot_exposes_descriptor() {
        let mut setup = TestSetup::new();
        setup.add_plugin("alpha", "[descriptor]\nweb_path = \"/alpha\"\n");
        let (mut host, _, _root) = setup.host();

        host.discover().unwrap();

        let plugins = host.plugins();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].id, "alpha");
        assert_eq!(plugins[0].status, PluginStatus::Loaded);
        assert_eq!(
            plugins[0]
                .manifest
                .descriptor
                .get("web_path")
                .and_then(|v| v.as_str()),
            Some("/alpha")
        );
    }

    #[test]
    fn test_unload_all() {
        let mut setup = TestSetup::new();
        setup.add_plugin("alpha", "");
        setup.add_plugin("beta", "");
        let (mut host, _, _root) = setup.host();

        host.discover().unwrap();
        assert_eq!(host.loaded_plugins().len(), 2);

        host.unload_all();
        assert!(host.loaded_plugins().is_empty());
        assert_eq!(host.status("alpha"), Some(PluginStatus::Stopped));
        assert_eq!(host.status("beta"), Some(PluginStatus::Stopped));
    }

    #[tokio::test]
    async fn test_update_task_gated_by_mode() {
        let root = TempDir::new().unwrap();
        let auto = Arc::new(
            HubConfig::parse(&format!(
                "[plugins]\ndir = \"{}\"\n[plugins.runtime]\nupdate_mode = \"auto\"\nupdate_interval_ms = 50\n",
                root.path().display()
            ))
            .unwrap(),
        );
        let host = PluginHost::new(
            auto,
            Box::new(StaticRegistry::new()),
            Arc::new(RecordingInstaller::default()),
        );
        let task = host.spawn_update_task();
        assert!(task.is_some());
        if let Some(task) = task {
            // stop() signals, shutdown() waits for the task to finish.
            task.stop();
            task.shutdown().await;
        }

        let manual = config_for(root.path());
        let host = PluginHost::new(
            manual,
            Box::new(StaticRegistry::new()),
            Arc::new(RecordingInstaller::default()),
        );
        assert!(host.spawn_update_task().is_none());
    }

    #[test]
    fn test_status_display_is_kebab_case() {
        assert_eq!(PluginStatus::ResolvingDependencies.to_string(), "resolving-dependencies");
        assert_eq!(PluginStatus::Stopped.to_string(), "stopped");
        assert_eq!(PluginStatus::Loaded.to_string(), "loaded");
    }
}
