//! In-memory capability implementations for tests.
//!
//! The mocks record every call behind `Arc<Mutex<..>>` state so a test can
//! drive the controller and then inspect exactly what reached the "platform".

use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

use crate::{
    app::{ActivationPolicy, AppHandle, AppSource, RunningApp},
    clock::Clock,
    config::Config,
    controller::{Capabilities, PinController, PinEvent},
    error::{AccessError, AccessResult, FallbackError},
    fallback::Fallback,
    prefs::{MemoryStore, Preferences},
    window::{Attribute, Pid, Point, Size, Value, WindowAccess, WindowRef, WindowSource},
};

/// Build an [`AppHandle`].
pub fn handle(pid: Pid, name: &str, bundle_id: Option<&str>) -> AppHandle {
    AppHandle {
        pid,
        name: name.to_string(),
        bundle_id: bundle_id.map(str::to_string),
    }
}

/// Build a [`RunningApp`] with a bundle id derived from the name.
pub fn running(pid: Pid, name: &str, policy: ActivationPolicy) -> RunningApp {
    let bundle = format!("com.example.{}", name.to_lowercase().replace(' ', "-"));
    RunningApp {
        app: handle(pid, name, Some(&bundle)),
        policy,
    }
}

/// Shared state behind [`MockWindows`] and the windows it hands out.
#[derive(Debug)]
struct WindowState {
    /// Permission flag.
    trusted: bool,
    /// Lookup strategies that resolve.
    sources: HashSet<WindowSource>,
    /// Frontmost flag; `None` makes it unreadable.
    frontmost: Option<bool>,
    /// Current origin.
    position: Point,
    /// Current extent.
    size: Size,
    /// Reject the raise action.
    fail_raise: bool,
    /// Reject app activation.
    fail_activate: bool,
    /// Attributes whose writes fail.
    fail_write: HashSet<Attribute>,
    /// Attributes whose reads fail.
    fail_read: HashSet<Attribute>,
    /// Lookup log.
    lookups: Vec<(Pid, WindowSource)>,
    /// Write log.
    writes: Vec<(Attribute, Value)>,
    /// Raise count.
    raises: usize,
    /// Activated pids.
    activations: Vec<Pid>,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            trusted: true,
            sources: WindowSource::ORDER.into_iter().collect(),
            frontmost: Some(false),
            position: Point { x: 100.0, y: 80.0 },
            size: Size {
                width: 800.0,
                height: 600.0,
            },
            fail_raise: false,
            fail_activate: false,
            fail_write: HashSet::new(),
            fail_read: HashSet::new(),
            lookups: Vec::new(),
            writes: Vec::new(),
            raises: 0,
            activations: Vec::new(),
        }
    }
}

/// Scriptable [`WindowAccess`]. Every process appears to own the same single
/// window; writing the main flag moves the frontmost flag with it.
#[derive(Debug, Clone, Default)]
pub struct MockWindows {
    /// Shared state.
    state: Arc<Mutex<WindowState>>,
}

impl MockWindows {
    /// Trusted, with every lookup strategy resolving.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the permission flag.
    pub fn set_trusted(&self, trusted: bool) {
        self.state.lock().trusted = trusted;
    }

    /// Restrict which lookup strategies resolve. An empty slice hides the window.
    pub fn set_sources(&self, sources: &[WindowSource]) {
        self.state.lock().sources = sources.iter().copied().collect();
    }

    /// Set the frontmost flag (`None` makes it unreadable).
    pub fn set_frontmost(&self, frontmost: Option<bool>) {
        self.state.lock().frontmost = frontmost;
    }

    /// Make the raise action fail.
    pub fn set_fail_raise(&self, fail: bool) {
        self.state.lock().fail_raise = fail;
    }

    /// Make activation fail.
    pub fn set_fail_activate(&self, fail: bool) {
        self.state.lock().fail_activate = fail;
    }

    /// Make writes of `attr` fail.
    pub fn set_fail_write(&self, attr: Attribute, fail: bool) {
        let mut st = self.state.lock();
        if fail {
            st.fail_write.insert(attr);
        } else {
            st.fail_write.remove(&attr);
        }
    }

    /// Make reads of `attr` fail.
    pub fn set_fail_read(&self, attr: Attribute, fail: bool) {
        let mut st = self.state.lock();
        if fail {
            st.fail_read.insert(attr);
        } else {
            st.fail_read.remove(&attr);
        }
    }

    /// Lookups performed so far.
    pub fn lookups(&self) -> Vec<(Pid, WindowSource)> {
        self.state.lock().lookups.clone()
    }

    /// Attribute writes performed so far.
    pub fn writes(&self) -> Vec<(Attribute, Value)> {
        self.state.lock().writes.clone()
    }

    /// Raise actions performed so far.
    pub fn raises(&self) -> usize {
        self.state.lock().raises
    }

    /// Pids activated so far.
    pub fn activations(&self) -> Vec<Pid> {
        self.state.lock().activations.clone()
    }

    /// Current frontmost flag.
    pub fn frontmost(&self) -> Option<bool> {
        self.state.lock().frontmost
    }

    /// Forget all recorded calls.
    pub fn clear_log(&self) {
        let mut st = self.state.lock();
        st.lookups.clear();
        st.writes.clear();
        st.raises = 0;
        st.activations.clear();
    }
}

impl WindowAccess for MockWindows {
    fn is_trusted(&self) -> bool {
        self.state.lock().trusted
    }

    fn window(&self, pid: Pid, source: WindowSource) -> AccessResult<Box<dyn WindowRef>> {
        let mut st = self.state.lock();
        st.lookups.push((pid, source));
        if !st.trusted {
            return Err(AccessError::PermissionDenied);
        }
        if !st.sources.contains(&source) {
            return Err(AccessError::NoAccessibleWindow);
        }
        Ok(Box::new(MockWindow {
            state: self.state.clone(),
        }))
    }

    fn activate(&self, pid: Pid) -> AccessResult<()> {
        let mut st = self.state.lock();
        if st.fail_activate {
            return Err(AccessError::ActivationFailed);
        }
        st.activations.push(pid);
        Ok(())
    }
}

/// Window handed out by [`MockWindows`].
struct MockWindow {
    /// Shared state.
    state: Arc<Mutex<WindowState>>,
}

impl WindowRef for MockWindow {
    fn read(&self, attr: Attribute) -> AccessResult<Value> {
        let st = self.state.lock();
        if st.fail_read.contains(&attr) {
            return Err(AccessError::AttributeReadFailed {
                attribute: attr,
                code: -25204,
            });
        }
        match attr {
            Attribute::Frontmost | Attribute::Main => {
                st.frontmost
                    .map(Value::Bool)
                    .ok_or(AccessError::AttributeReadFailed {
                        attribute: attr,
                        code: -25212,
                    })
            }
            Attribute::Position => Ok(Value::Point(st.position)),
            Attribute::Size => Ok(Value::Size(st.size)),
        }
    }

    fn write(&self, attr: Attribute, value: Value) -> AccessResult<()> {
        let mut st = self.state.lock();
        st.writes.push((attr, value));
        if st.fail_write.contains(&attr) {
            return Err(AccessError::AttributeWriteFailed {
                attribute: attr,
                code: -25200,
            });
        }
        match (attr, value) {
            (Attribute::Main | Attribute::Frontmost, Value::Bool(b)) => st.frontmost = Some(b),
            (Attribute::Position, Value::Point(p)) => st.position = p,
            (Attribute::Size, Value::Size(s)) => st.size = s,
            _ => return Err(AccessError::Unsupported),
        }
        Ok(())
    }

    fn raise(&self) -> AccessResult<()> {
        let mut st = self.state.lock();
        if st.fail_raise {
            return Err(AccessError::RaiseFailed { code: -25200 });
        }
        st.raises += 1;
        Ok(())
    }
}

/// Scriptable [`AppSource`].
#[derive(Debug, Default)]
pub struct MockApps {
    /// Current process table.
    apps: Mutex<Vec<RunningApp>>,
}

impl MockApps {
    /// Table holding `apps`.
    pub fn new(apps: Vec<RunningApp>) -> Self {
        Self {
            apps: Mutex::new(apps),
        }
    }

    /// Replace the table.
    pub fn set_apps(&self, apps: Vec<RunningApp>) {
        *self.apps.lock() = apps;
    }

    /// Remove `pid` from the table, as if the process exited.
    pub fn kill(&self, pid: Pid) {
        self.apps.lock().retain(|r| r.app.pid != pid);
    }
}

impl AppSource for MockApps {
    fn running_apps(&self) -> Vec<RunningApp> {
        self.apps.lock().clone()
    }
}

/// Recording [`Fallback`].
#[derive(Debug, Default)]
pub struct MockFallback {
    /// Names of the apps activated, in order.
    calls: Mutex<Vec<String>>,
    /// Reject every call.
    fail: Mutex<bool>,
}

impl MockFallback {
    /// Succeeding fallback with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls fail.
    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    /// App names passed to `force_activate` so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl Fallback for MockFallback {
    fn force_activate(&self, app: &AppHandle) -> Result<(), FallbackError> {
        self.calls.lock().push(app.name.clone());
        if *self.fail.lock() {
            return Err(FallbackError::InvocationFailed(format!(
                "Can't get application \"{}\"",
                app.name
            )));
        }
        Ok(())
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    /// Current instant.
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Start at the real current instant.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move forward by `d`.
    pub fn advance(&self, d: Duration) {
        *self.now.lock() += d;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// A controller wired to fresh mocks. Our own pid is `1`.
pub struct Harness {
    /// Window capability.
    pub windows: Arc<MockWindows>,
    /// Process table.
    pub apps: Arc<MockApps>,
    /// Automation fallback.
    pub fallback: Arc<MockFallback>,
    /// Preference storage.
    pub prefs: Arc<MemoryStore>,
    /// Time source.
    pub clock: Arc<ManualClock>,
    /// Controller under test.
    pub controller: PinController,
    /// Events emitted by the controller.
    pub events: UnboundedReceiver<PinEvent>,
}

impl Harness {
    /// Default config, the given process table and stored preferences.
    pub fn new(apps: Vec<RunningApp>, prefs: Preferences) -> Self {
        Self::with_config(apps, prefs, &Config::default())
    }

    /// Like [`Harness::new`] with an explicit config.
    pub fn with_config(apps: Vec<RunningApp>, prefs: Preferences, config: &Config) -> Self {
        let windows = Arc::new(MockWindows::new());
        let apps = Arc::new(MockApps::new(apps));
        let fallback = Arc::new(MockFallback::new());
        let prefs = Arc::new(MemoryStore::new(prefs));
        let clock = Arc::new(ManualClock::new());
        let (tx, events) = unbounded_channel();
        let caps = Capabilities {
            windows: windows.clone(),
            apps: apps.clone(),
            fallback: fallback.clone(),
            prefs: prefs.clone(),
            clock: clock.clone(),
        };
        let controller = PinController::new(caps, config, 1, tx);
        Self {
            windows,
            apps,
            fallback,
            prefs,
            clock,
            controller,
            events,
        }
    }

    /// Advance the clock by `d` and run one tick.
    pub fn advance(&mut self, d: Duration) {
        self.clock.advance(d);
        self.controller.tick();
    }

    /// All events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<PinEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = self.events.try_recv() {
            out.push(ev);
        }
        out
    }

    /// Persisted identifier as currently stored.
    pub fn stored_id(&self) -> Option<String> {
        self.prefs.snapshot().last_pinned_bundle_id
    }
}
