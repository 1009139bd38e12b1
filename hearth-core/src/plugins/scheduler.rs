//! Activity scheduler - one shared recurring timer for all plugin hooks
//!
//! Every plugin-registered activity lives here, grouped by the owning
//! plugin. A single tokio task ticks once per second and runs one
//! evaluation pass ([`ActivityScheduler::run_due`]) per tick. Ticks are
//! serialized through the scheduler mutex rather than skipped: if a
//! pass overruns the tick period the next evaluation waits for it.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use hearth_plugin_api::{ActivityFn, ActivityRegistrar, HostView, PluginError};

/// Period of the shared tick timer.
pub const TICK_PERIOD: Duration = Duration::from_millis(1000);

/// One periodic hook.
struct Activity {
    /// Plugin that registered the hook (defaults to the owner).
    created_by: String,
    callback: ActivityFn,
    interval: Duration,
    /// Last invocation, or registration time if never run.
    last_run: Instant,
}

/// Per-plugin activity container. Created lazily on first registration
/// and never deleted, only emptied by filtering on unregister.
struct ActivityGroup {
    enabled: bool,
    activities: Vec<Activity>,
}

/// The shared scheduler state. Owns every [`ActivityGroup`], indexed by
/// the plugin id whose enable flag gates execution.
pub struct ActivityScheduler {
    groups: HashMap<String, ActivityGroup>,
    /// When set, activities of plugins that are not currently loaded
    /// are skipped (left registered, never invoked).
    gate: Option<Arc<dyn HostView>>,
}

impl ActivityScheduler {
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
            gate: None,
        }
    }

    /// Install the host view used to skip activities of unloaded
    /// plugins. Without a gate every owner is considered active.
    pub fn set_gate(&mut self, gate: Arc<dyn HostView>) {
        self.gate = Some(gate);
    }

    /// Append an activity for `owner`. The interval must be positive;
    /// the callback is not invoked here.
    pub fn register(
        &mut self,
        owner: &str,
        created_by: &str,
        interval: Duration,
        callback: ActivityFn,
    ) -> Result<(), PluginError> {
        self.register_at(owner, created_by, interval, callback, Instant::now())
    }

    fn register_at(
        &mut self,
        owner: &str,
        created_by: &str,
        interval: Duration,
        callback: ActivityFn,
        now: Instant,
    ) -> Result<(), PluginError> {
        if interval.is_zero() {
            return Err(PluginError::InvalidInterval(interval));
        }

        let group = self
            .groups
            .entry(owner.to_string())
            .or_insert_with(|| ActivityGroup {
                enabled: true,
                activities: Vec::new(),
            });

        group.activities.push(Activity {
            created_by: created_by.to_string(),
            callback,
            interval,
            last_run: now,
        });

        tracing::debug!(
            plugin = %owner,
            created_by = %created_by,
            interval_ms = interval.as_millis() as u64,
            "Activity registered"
        );
        Ok(())
    }

    /// Remove all of `owner`'s activities whose `created_by` matches.
    /// No-op if the owner has no group.
    pub fn unregister(&mut self, owner: &str, created_by: &str) {
        if let Some(group) = self.groups.get_mut(owner) {
            group.activities.retain(|a| a.created_by != created_by);
        }
    }

    /// Toggle the enable flag of `owner`'s group. No-op (returns false)
    /// if the owner has no group.
    pub fn set_enabled(&mut self, owner: &str, enabled: bool) -> bool {
        match self.groups.get_mut(owner) {
            Some(group) => {
                group.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Number of activities currently registered under `owner`.
    pub fn activity_count(&self, owner: &str) -> usize {
        self.groups.get(owner).map_or(0, |g| g.activities.len())
    }

    /// One tick evaluation: invoke every due activity of every enabled
    /// group, at most once per activity regardless of how many interval
    /// boundaries elapsed. Returns the number of invocations.
    ///
    /// Each callback is isolated: a panic is logged and the pass moves
    /// on to the sibling activities.
    pub fn run_due(&mut self, now: Instant) -> usize {
        let mut fired = 0;

        for (owner, group) in &mut self.groups {
            if !group.enabled {
                continue;
            }
            if let Some(gate) = &self.gate {
                if !gate.is_loaded(owner) {
                    continue;
                }
            }

            for activity in &mut group.activities {
                if now.duration_since(activity.last_run) >= activity.interval {
                    let result =
                        std::panic::catch_unwind(AssertUnwindSafe(|| (activity.callback)()));
                    if result.is_err() {
                        tracing::error!(
                            plugin = %owner,
                            created_by = %activity.created_by,
                            "Activity callback panicked"
                        );
                    }
                    activity.last_run = now;
                    fired += 1;
                }
            }
        }

        fired
    }
}

impl Default for ActivityScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle to the shared scheduler. This is what the host owns
/// and what reaches plugins as their [`ActivityRegistrar`] capability.
///
/// Every method takes the scheduler lock, and [`run_due`] invokes the
/// activity callbacks while holding it. A handle clone moved into a
/// callback therefore must not call `register`, `unregister` or
/// `run_due` from inside the callback body; the [`PluginContext`]
/// surface never hands the registrar to callbacks for this reason.
///
/// [`run_due`]: SchedulerHandle::run_due
/// [`PluginContext`]: hearth_plugin_api::PluginContext
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Arc<Mutex<ActivityScheduler>>,
}

impl SchedulerHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ActivityScheduler::new())),
        }
    }

    /// Install the loaded-plugin gate on the underlying scheduler.
    pub fn set_gate(&self, gate: Arc<dyn HostView>) {
        self.inner.lock().unwrap().set_gate(gate);
    }

    /// See [`ActivityScheduler::set_enabled`].
    pub fn set_enabled(&self, owner: &str, enabled: bool) -> bool {
        self.inner.lock().unwrap().set_enabled(owner, enabled)
    }

    /// See [`ActivityScheduler::activity_count`].
    pub fn activity_count(&self, owner: &str) -> usize {
        self.inner.lock().unwrap().activity_count(owner)
    }

    /// Run one tick evaluation now. The timer task calls this; tests
    /// may call it directly with simulated instants.
    pub fn run_due(&self, now: Instant) -> usize {
        self.inner.lock().unwrap().run_due(now)
    }

    /// Spawn the shared tick task. Returns a handle owning the task and
    /// its stop token.
    pub fn spawn_timer(&self) -> ActivityTimer {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_PERIOD);
            // Serialize overlapping ticks instead of bursting to catch up.
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        handle.run_due(Instant::now());
                    }
                }
            }
            tracing::debug!("Activity timer stopped");
        });

        ActivityTimer { cancel, task }
    }
}

impl Default for SchedulerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityRegistrar for SchedulerHandle {
    fn register(
        &self,
        owner: &str,
        created_by: &str,
        interval: Duration,
        callback: ActivityFn,
    ) -> Result<(), PluginError> {
        self.inner
            .lock()
            .unwrap()
            .register(owner, created_by, interval, callback)
    }

    fn unregister(&self, owner: &str, created_by: &str) {
        self.inner.lock().unwrap().unregister(owner, created_by);
    }
}

/// Handle to the running tick task with an explicit stop handle.
pub struct ActivityTimer {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl ActivityTimer {
    /// Signal the tick task to stop after the current evaluation.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop the tick task and wait for it to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}
