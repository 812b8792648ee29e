//! Pin State Machine.
//!
//! [`PinController`] owns the pin session (`target`, `pinned`, status line)
//! together with the enforcement [`Ticker`], the [`TargetRegistry`] and the
//! [`PersistenceBridge`]. Every mutation happens through `&mut self` on the
//! host event-loop thread; observers learn about changes through
//! [`PinEvent`]s.
//!
//! Two invariants hold at every observation point:
//! - `pinned` implies a target is selected;
//! - the enforcement ticker runs exactly while pinned.

use std::{sync::Arc, time::Instant};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::{
    app::{AppHandle, AppSource},
    clock::Clock,
    config::Config,
    error::PinError,
    fallback::{Fallback, FallbackOutcome, ThrottledFallback},
    prefs::{PersistenceBridge, PrefStore, Preferences},
    registry::{TargetEntry, TargetRegistry, filter_by_name},
    shortcut::{ShortcutAction, route_shortcut},
    ticker::Ticker,
    window::{Pid, WindowAccess, Warning, locate_window, set_frontmost},
};

/// Fixed status lines.
pub mod status {
    /// No target selected.
    pub const IDLE: &str = "Select an app to begin";
    /// Pin succeeded or a clean enforcement tick.
    pub const PINNED: &str = "Status: Pinned";
    /// Unpin succeeded.
    pub const UNPINNED: &str = "Status: Unpinned";
    /// The target process went away.
    pub const TERMINATED: &str = "Selected app terminated.";
    /// Restoration found the app but not its window.
    pub const PERSISTED_WINDOW: &str = "Error: Cannot access window of persisted app";
    /// Restoration found the app but lacks permission.
    pub const PERSISTED_PERMISSION: &str =
        "Error: Accessibility permissions required for persisted app";
    /// The automation fallback was rejected.
    pub const FALLBACK_FAILED: &str = "Warning: Failed to raise window via AppleScript";

    /// Status after selecting `name`.
    pub fn selected(name: &str) -> String {
        format!("Selected: {name}")
    }
}

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    /// No target.
    Idle,
    /// Target chosen, not pinned.
    Selected,
    /// Target chosen and enforcement active.
    Pinned,
}

/// Change notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinEvent {
    /// The target was pinned.
    Pinned {
        /// Display name of the target.
        name: String,
    },
    /// The target was unpinned by the user.
    Unpinned {
        /// Display name of the target.
        name: String,
    },
    /// Target, pin state, status text or the target list changed.
    Changed,
}

/// Platform capabilities injected into the controller.
#[derive(Clone)]
pub struct Capabilities {
    /// Window inspection and mutation.
    pub windows: Arc<dyn WindowAccess>,
    /// Running-application table.
    pub apps: Arc<dyn AppSource>,
    /// Out-of-band activation.
    pub fallback: Arc<dyn Fallback>,
    /// Durable preferences.
    pub prefs: Arc<dyn PrefStore>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// The pin-state controller.
pub struct PinController {
    /// Window capability.
    windows: Arc<dyn WindowAccess>,
    /// Time source for tickers and the fallback throttle.
    clock: Arc<dyn Clock>,
    /// Running applications.
    registry: TargetRegistry,
    /// Throttled out-of-band activation.
    fallback: ThrottledFallback,
    /// Last-pinned target storage.
    persistence: PersistenceBridge,
    /// Enforcement timer; running iff `pinned`.
    enforcer: Ticker,
    /// Background registry refresh timer; always running.
    refresher: Ticker,
    /// Re-apply geometry after raising.
    reapply_geometry: bool,
    /// Current target.
    target: Option<AppHandle>,
    /// Whether enforcement is active.
    pinned: bool,
    /// User-facing status line.
    status: String,
    /// Change notifications.
    events: UnboundedSender<PinEvent>,
}

impl PinController {
    /// Create an idle controller. `own_pid` is excluded from the target list.
    pub fn new(
        caps: Capabilities,
        config: &Config,
        own_pid: Pid,
        events: UnboundedSender<PinEvent>,
    ) -> Self {
        let now = caps.clock.now();
        let mut refresher = Ticker::new(config.registry_refresh());
        refresher.start(now);
        let mut registry = TargetRegistry::new(caps.apps, own_pid);
        registry.refresh();
        Self {
            windows: caps.windows,
            clock: caps.clock,
            registry,
            fallback: ThrottledFallback::new(caps.fallback, config.fallback_throttle()),
            persistence: PersistenceBridge::open(caps.prefs),
            enforcer: Ticker::new(config.enforce_interval()),
            refresher,
            reapply_geometry: config.reapply_geometry,
            target: None,
            pinned: false,
            status: status::IDLE.to_string(),
            events,
        }
    }

    // --- observation ---------------------------------------------------

    /// Coarse session state.
    pub fn state(&self) -> PinState {
        match (&self.target, self.pinned) {
            (None, _) => PinState::Idle,
            (Some(_), false) => PinState::Selected,
            (Some(_), true) => PinState::Pinned,
        }
    }

    /// Current target, if any.
    pub fn target(&self) -> Option<&AppHandle> {
        self.target.as_ref()
    }

    /// Display name of the current target.
    pub fn target_name(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.name.as_str())
    }

    /// Whether enforcement is active.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Status line.
    pub fn status_text(&self) -> &str {
        &self.status
    }

    /// Whether the enforcement timer is scheduled.
    pub fn enforcement_active(&self) -> bool {
        self.enforcer.is_running()
    }

    /// Running applications with the current target marked.
    pub fn available_targets(&self) -> Vec<TargetEntry> {
        self.registry.entries(self.target.as_ref())
    }

    /// Running applications whose names match `query`.
    pub fn search(&self, query: &str) -> Vec<&AppHandle> {
        filter_by_name(self.registry.apps(), query)
    }

    /// Menu-bar title: `"<name> (Pinned)"`, `"<name> (Unpinned)"`, or empty.
    pub fn title(&self) -> String {
        match &self.target {
            Some(t) if self.pinned => format!("{} (Pinned)", t.name),
            Some(t) => format!("{} (Unpinned)", t.name),
            None => String::new(),
        }
    }

    /// Earliest instant at which [`PinController::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.enforcer.deadline(), self.refresher.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Preference document.
    pub fn preferences(&self) -> &Preferences {
        self.persistence.preferences()
    }

    /// Identifier that would be restored on next launch.
    pub fn persisted_id(&self) -> Option<&str> {
        self.persistence.load()
    }

    // --- intents -------------------------------------------------------

    /// Select a target (or deselect with `None`). Enforcement always stops;
    /// the new target is never pinned automatically.
    pub fn select_target(&mut self, app: Option<AppHandle>) {
        let previous = self.target.take();
        self.stop_enforcement();
        match app {
            Some(app) => {
                if previous
                    .as_ref()
                    .is_some_and(|p| !self.registry.contains(p.pid))
                {
                    self.persistence.clear();
                }
                info!(app = %app.name, pid = app.pid, "target selected");
                self.status = status::selected(&app.name);
                self.target = Some(app);
            }
            None => {
                info!("target cleared");
                self.persistence.clear();
                self.status = status::IDLE.to_string();
            }
        }
        self.emit(PinEvent::Changed);
    }

    /// Select the first running application named `name` (or deselect).
    ///
    /// An unknown name leaves the session untouched.
    pub fn select_by_name(&mut self, name: Option<&str>) -> Result<(), PinError> {
        let app = match name {
            Some(name) => match self.registry.find_by_name(name) {
                Some(app) => Some(app.clone()),
                None => {
                    debug!(name, "selection names no running app");
                    return Err(PinError::TargetNotRunning);
                }
            },
            None => None,
        };
        self.select_target(app);
        Ok(())
    }

    /// Menu selection by pid: choosing the current target deselects it,
    /// any other running pid becomes the target.
    pub fn choose_entry(&mut self, pid: Pid) -> Result<(), PinError> {
        if self.target.as_ref().is_some_and(|t| t.pid == pid) {
            self.select_target(None);
            return Ok(());
        }
        let Some(app) = self.registry.find_by_pid(pid).cloned() else {
            debug!(pid, "menu entry names no running app");
            return Err(PinError::TargetNotRunning);
        };
        self.select_target(Some(app));
        Ok(())
    }

    /// Pin the selected target if unpinned, unpin it otherwise.
    pub fn toggle_pin(&mut self) -> Result<PinState, PinError> {
        let Some(app) = self.target.clone() else {
            return self.fail(PinError::NoTargetSelected);
        };
        if !self.windows.is_trusted() {
            return self.fail(PinError::PermissionDenied);
        }
        let window = match locate_window(self.windows.as_ref(), &app) {
            Ok(window) => window,
            Err(err) => return self.fail(err.into()),
        };

        let desired = !self.pinned;
        let report = set_frontmost(window.as_ref(), desired, self.reapply_geometry);
        if let Some(warning) = report.warning {
            warn!(app = %app.name, ?warning, "frontmost change degraded");
        }

        let now = self.clock.now();
        if desired {
            if report.raise_failed {
                self.fallback.invoke(&app, now);
            }
            if let Err(err) = self.windows.activate(app.pid) {
                warn!(app = %app.name, error = %err, "failed to activate target");
            }
            self.pinned = true;
            self.enforcer.start(now);
            self.persistence.save(&app);
            self.status = status::PINNED.to_string();
            info!(app = %app.name, "pinned");
            self.emit(PinEvent::Pinned { name: app.name });
        } else {
            self.stop_enforcement();
            self.persistence.clear();
            self.status = status::UNPINNED.to_string();
            info!(app = %app.name, "unpinned");
            self.emit(PinEvent::Unpinned { name: app.name });
        }
        self.emit(PinEvent::Changed);
        Ok(self.state())
    }

    /// Select `name` from the picker and pin it straight away.
    pub fn pin_from_picker(&mut self, name: &str) -> Result<PinState, PinError> {
        self.select_by_name(Some(name))?;
        self.toggle_pin()
    }

    /// React to the global shortcut. Returns the routed action so the caller
    /// can open or close its picker.
    pub fn handle_shortcut(&mut self, picker_open: bool) -> ShortcutAction {
        let action = route_shortcut(self.pinned, picker_open);
        if action == ShortcutAction::Unpin
            && let Err(err) = self.toggle_pin()
        {
            debug!(error = %err, "shortcut unpin failed");
        }
        action
    }

    /// Enable or disable persistence. Enabling while pinned stores the target.
    pub fn set_persistence_enabled(&mut self, enabled: bool) {
        self.persistence.set_enabled(enabled);
        if enabled
            && self.pinned
            && let Some(app) = &self.target
        {
            self.persistence.save(app);
        }
        self.emit(PinEvent::Changed);
    }

    /// Change appearance preferences.
    pub fn update_preferences(&mut self, f: impl FnOnce(&mut Preferences)) {
        self.persistence.update(f);
        self.emit(PinEvent::Changed);
    }

    /// The process `pid` terminated. Returns true if it was the target.
    ///
    /// Safe to call repeatedly: a pid that is not the current target is
    /// ignored.
    pub fn target_terminated(&mut self, pid: Pid) -> bool {
        self.registry.forget(pid);
        if self.target.as_ref().is_none_or(|t| t.pid != pid) {
            return false;
        }
        if let Some(app) = self.target.take() {
            info!(app = %app.name, pid, "target terminated");
        }
        self.stop_enforcement();
        self.persistence.clear();
        self.status = status::TERMINATED.to_string();
        self.emit(PinEvent::Changed);
        true
    }

    /// Re-read the running-application table. A target that disappeared is
    /// handled exactly as a termination event.
    pub fn refresh_targets(&mut self) {
        self.registry.refresh();
        if let Some(pid) = self.target.as_ref().map(|t| t.pid)
            && !self.registry.contains(pid)
        {
            self.target_terminated(pid);
        }
        self.emit(PinEvent::Changed);
    }

    /// Restore the last pinned target, if persistence is enabled.
    ///
    /// Returns `Ok(true)` when the target was pinned again and `Ok(false)`
    /// when there was nothing to restore.
    pub fn restore_on_startup(&mut self) -> Result<bool, PinError> {
        let Some(bundle_id) = self.persistence.load().map(str::to_owned) else {
            debug!("nothing to restore");
            return Ok(false);
        };
        self.registry.refresh();
        let Some(app) = self.registry.find_by_bundle_id(&bundle_id).cloned() else {
            info!(bundle_id = %bundle_id, "persisted app is not running; forgetting it");
            self.persistence.clear();
            return self.fail(PinError::TargetNotRunning);
        };

        info!(app = %app.name, bundle_id = %bundle_id, "restoring pinned app");
        self.select_target(Some(app.clone()));
        if !self.windows.is_trusted() {
            return self.abandon_restore(PinError::PermissionDenied, status::PERSISTED_PERMISSION);
        }
        if let Err(err) = locate_window(self.windows.as_ref(), &app) {
            let err = PinError::from(err);
            let text = match err {
                PinError::PermissionDenied => status::PERSISTED_PERMISSION,
                _ => status::PERSISTED_WINDOW,
            };
            return self.abandon_restore(err, text);
        }
        self.toggle_pin().map(|state| state == PinState::Pinned)
    }

    /// Run due timers: registry refresh and one enforcement tick.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        if self.refresher.poll(now) {
            self.refresh_targets();
        }
        if self.enforcer.poll(now) {
            self.enforce(now);
        }
    }

    // --- internals -----------------------------------------------------

    /// One enforcement cycle. The window is looked up afresh every time.
    fn enforce(&mut self, now: Instant) {
        let Some(app) = self.target.clone() else {
            self.stop_enforcement();
            return;
        };
        let window = match locate_window(self.windows.as_ref(), &app) {
            Ok(window) => window,
            Err(err) => {
                debug!(app = %app.name, error = %err, "window unavailable; skipping tick");
                self.set_status(PinError::from(err).status_text());
                return;
            }
        };
        let report = set_frontmost(window.as_ref(), true, self.reapply_geometry);
        let mut text = report.warning.map_or(status::PINNED, Warning::status_text);
        match self.fallback.invoke(&app, now) {
            FallbackOutcome::Failed(_) => text = status::FALLBACK_FAILED,
            FallbackOutcome::Activated | FallbackOutcome::Throttled => {}
        }
        self.set_status(text);
    }

    /// Stop the enforcement timer and mark the session unpinned.
    fn stop_enforcement(&mut self) {
        self.enforcer.stop();
        self.pinned = false;
    }

    /// Restoration reached the app but could not pin it.
    fn abandon_restore(&mut self, err: PinError, text: &str) -> Result<bool, PinError> {
        warn!(error = %err, "failed to restore pinned app");
        self.target = None;
        self.stop_enforcement();
        self.set_status(text);
        Err(err)
    }

    /// Record a failed operation in the status line.
    fn fail<T>(&mut self, err: PinError) -> Result<T, PinError> {
        warn!(error = %err, "pin operation failed");
        self.set_status(err.status_text());
        Err(err)
    }

    /// Update the status line, notifying only on change.
    fn set_status(&mut self, text: &str) {
        if self.status != text {
            self.status = text.to_string();
            self.emit(PinEvent::Changed);
        }
    }

    /// Publish an event; a closed channel only means nobody is listening.
    fn emit(&self, event: PinEvent) {
        if self.events.send(event).is_err() {
            debug!("pin event receiver dropped");
        }
    }
}
