//! Window Accessor: representative-window lookup and frontmost enforcement.
//!
//! The platform inspection API is modelled as two small traits. A
//! [`WindowAccess`] hands out fresh [`WindowRef`]s for a process; a
//! `WindowRef` can read and write a handful of attributes and perform the raise
//! action. Window references are never cached across enforcement cycles: the
//! underlying element goes stale when an application recreates its window.

use std::fmt::{Display, Formatter, Result as FmtResult};

use tracing::{debug, warn};

use crate::{
    app::AppHandle,
    error::{AccessError, AccessResult},
};

/// Operating-system process identifier.
pub type Pid = i32;

/// A point in global screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// A 2D extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    /// Width in points.
    pub width: f64,
    /// Height in points.
    pub height: f64,
}

/// Window attributes the controller reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Top-of-stack flag as reported by the inspection API.
    Frontmost,
    /// "Main window" flag; written to reflect the desired frontmost-ness.
    Main,
    /// Window origin.
    Position,
    /// Window extent.
    Size,
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Frontmost => "frontmost",
            Self::Main => "main",
            Self::Position => "position",
            Self::Size => "size",
        };
        f.write_str(s)
    }
}

/// Attribute value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Boolean flag (frontmost, main).
    Bool(bool),
    /// Point value (position).
    Point(Point),
    /// Size value (size).
    Size(Size),
}

/// Strategy used to pick a representative window for an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowSource {
    /// The application's focused window.
    Focused,
    /// The application's main window.
    Main,
    /// The first entry of the application's window list.
    First,
}

impl WindowSource {
    /// Lookup order used by [`locate_window`].
    pub const ORDER: [Self; 3] = [Self::Focused, Self::Main, Self::First];
}

/// Handle to one window of another process.
pub trait WindowRef {
    /// Read an attribute.
    fn read(&self, attr: Attribute) -> AccessResult<Value>;
    /// Write an attribute.
    fn write(&self, attr: Attribute, value: Value) -> AccessResult<()>;
    /// Perform the window's raise action.
    fn raise(&self) -> AccessResult<()>;
}

/// Capability to inspect and mutate other processes' windows.
pub trait WindowAccess: Send + Sync {
    /// Whether the user has granted window-inspection permission.
    fn is_trusted(&self) -> bool;
    /// Resolve a window of `pid` using one specific strategy.
    fn window(&self, pid: Pid, source: WindowSource) -> AccessResult<Box<dyn WindowRef>>;
    /// Bring the application forward with all of its windows.
    fn activate(&self, pid: Pid) -> AccessResult<()>;
}

/// Locate a representative window for `app`.
///
/// Tries the focused window, then the main window, then the first entry of the
/// window list, returning the first that resolves.
pub fn locate_window(
    access: &dyn WindowAccess,
    app: &AppHandle,
) -> AccessResult<Box<dyn WindowRef>> {
    if !access.is_trusted() {
        return Err(AccessError::PermissionDenied);
    }
    for source in WindowSource::ORDER {
        match access.window(app.pid, source) {
            Ok(window) => {
                debug!(pid = app.pid, ?source, "located window");
                return Ok(window);
            }
            Err(AccessError::PermissionDenied) => return Err(AccessError::PermissionDenied),
            Err(err) => debug!(pid = app.pid, ?source, error = %err, "window lookup failed"),
        }
    }
    Err(AccessError::NoAccessibleWindow)
}

/// Non-fatal problems encountered while asserting frontmost state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// Writing the main flag was refused.
    MainAttribute,
    /// The raise action was refused.
    Raise,
    /// Position or size could not be read back.
    GeometryRead,
    /// Re-applying position or size was refused.
    GeometryWrite,
}

impl Warning {
    /// Status line shown for this warning.
    pub fn status_text(self) -> &'static str {
        match self {
            Self::MainAttribute | Self::GeometryWrite => {
                "Warning: Pinning may not persist for this app"
            }
            Self::Raise => "Warning: Unable to bring window to front via Accessibility API",
            Self::GeometryRead => "Error: Failed to get window properties",
        }
    }
}

/// Outcome of [`set_frontmost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrontmostReport {
    /// The window already had the desired state; nothing was written.
    pub skipped: bool,
    /// Most recent warning, if any step degraded.
    pub warning: Option<Warning>,
    /// The raise action failed; callers should engage the fallback.
    pub raise_failed: bool,
}

/// Assert (or release) frontmost state on `window`.
///
/// Does nothing when the frontmost flag already equals `desired`. Otherwise
/// writes the main flag, raises the window, and, when `reapply_geometry` is
/// set, writes position and size back unchanged so the window server redraws
/// the window above its siblings. Failures never abort the sequence early
/// except an unreadable geometry, which makes the re-write impossible.
pub fn set_frontmost(
    window: &dyn WindowRef,
    desired: bool,
    reapply_geometry: bool,
) -> FrontmostReport {
    let mut report = FrontmostReport::default();
    match window.read(Attribute::Frontmost) {
        Ok(Value::Bool(current)) if current == desired => {
            report.skipped = true;
            return report;
        }
        Ok(_) => {}
        Err(err) => debug!(error = %err, "frontmost flag unreadable; writing anyway"),
    }

    if let Err(err) = window.write(Attribute::Main, Value::Bool(desired)) {
        warn!(error = %err, "failed to set main attribute");
        report.warning = Some(Warning::MainAttribute);
    }

    if let Err(err) = window.raise() {
        warn!(error = %err, "failed to raise window");
        report.warning = Some(Warning::Raise);
        report.raise_failed = true;
    }

    if !reapply_geometry {
        return report;
    }

    let (position, size) = match (
        window.read(Attribute::Position),
        window.read(Attribute::Size),
    ) {
        (Ok(position), Ok(size)) => (position, size),
        (position, size) => {
            warn!(
                position_ok = position.is_ok(),
                size_ok = size.is_ok(),
                "failed to read window geometry"
            );
            report.warning = Some(Warning::GeometryRead);
            return report;
        }
    };
    let pos_res = window.write(Attribute::Position, position);
    let size_res = window.write(Attribute::Size, size);
    if pos_res.is_err() || size_res.is_err() {
        warn!(
            position_ok = pos_res.is_ok(),
            size_ok = size_res.is_ok(),
            "failed to re-apply window geometry"
        );
        report.warning = Some(Warning::GeometryWrite);
    }
    report
}
