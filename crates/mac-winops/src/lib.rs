//! mac-winops: macOS implementations of the topmost capabilities.
//!
//! - [`AxWindows`]: window lookup, attribute access and raise through the
//!   Accessibility API, plus app activation via `NSRunningApplication`.
//! - [`WorkspaceApps`]: the running-application table from `NSWorkspace`.
//! - [`observe_terminations`]: `NSWorkspace` termination notifications.
//! - [`OsaScriptFallback`]: the AppleScript activation fallback.
//!
//! Everything except the script fallback requires macOS; on other platforms
//! only [`script`] is compiled so the fallback's quoting stays testable.

#[cfg(target_os = "macos")]
mod access;
#[cfg(target_os = "macos")]
mod apps;
#[cfg(target_os = "macos")]
mod ax;
#[cfg(target_os = "macos")]
mod observer;
pub mod script;

#[cfg(target_os = "macos")]
pub use access::AxWindows;
#[cfg(target_os = "macos")]
pub use apps::WorkspaceApps;
#[cfg(target_os = "macos")]
pub use observer::{TerminationObserver, observe_terminations};
pub use script::{OsaScriptFallback, activation_script, applescript_quote};
