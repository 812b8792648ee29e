//! topmost-core: the pin-state controller for topmost.
//!
//! This crate owns everything that decides *whether* and *how* a target
//! application's window is kept frontmost. It is deliberately free of platform
//! code: the windowing system, the running-application table, the automation
//! fallback and durable preferences are all injected as capabilities
//! ([`WindowAccess`], [`AppSource`], [`Fallback`], [`PrefStore`], [`Clock`]).
//! The macOS implementations live in `mac-winops`.
//!
//! The controller is single-threaded. The host event loop calls
//! [`PinController::tick`] whenever [`PinController::next_deadline`] passes and
//! forwards user intents (selection, toggle, refresh, termination) as plain
//! method calls. Observable changes are published as [`PinEvent`]s on a Tokio
//! unbounded channel so the presentation layer can redraw.

mod app;
mod clock;
pub mod config;
mod controller;
mod error;
mod fallback;
pub mod prefs;
mod registry;
mod shortcut;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
mod ticker;
mod window;

pub use app::{ActivationPolicy, AppHandle, AppSource, RunningApp};
pub use clock::{Clock, SystemClock};
pub use config::{Config, ConfigError};
pub use controller::{Capabilities, PinController, PinEvent, PinState, status};
pub use error::{AccessError, AccessResult, FallbackError, PinError};
pub use fallback::{Fallback, FallbackOutcome, Throttle, ThrottledFallback};
pub use prefs::{
    JsonFileStore, MemoryStore, PersistenceBridge, PrefStore, Preferences, PrefsError, ThemeMode,
};
pub use registry::{TargetEntry, TargetRegistry, filter_by_name};
pub use shortcut::{ShortcutAction, route_shortcut};
pub use ticker::Ticker;
pub use window::{
    Attribute, FrontmostReport, Pid, Point, Size, Value, Warning, WindowAccess, WindowRef,
    WindowSource, locate_window, set_frontmost,
};
