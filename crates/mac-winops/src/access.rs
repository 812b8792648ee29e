//! [`WindowAccess`] backed by the Accessibility API.

use objc2_app_kit::{NSApplicationActivationOptions, NSRunningApplication};
use topmost_core::{
    AccessError, AccessResult, Attribute, Pid, Value, WindowAccess, WindowRef, WindowSource,
};
use tracing::debug;

use crate::ax::{self, AXElem};

/// Options used to bring the target forward: all of its windows, and
/// ignoring other apps so activation from an accessory process takes effect.
/// `ActivateIgnoringOtherApps` is deprecated (ignored) from macOS 14 but still
/// required on earlier releases.
#[allow(deprecated)]
fn activation_options() -> NSApplicationActivationOptions {
    NSApplicationActivationOptions::ActivateAllWindows
        | NSApplicationActivationOptions::ActivateIgnoringOtherApps
}

/// Live window access. Stateless: every lookup creates fresh AX elements.
#[derive(Debug, Default, Clone, Copy)]
pub struct AxWindows;

impl WindowAccess for AxWindows {
    fn is_trusted(&self) -> bool {
        permissions::accessibility_ok()
    }

    fn window(&self, pid: Pid, source: WindowSource) -> AccessResult<Box<dyn WindowRef>> {
        let app = AXElem::application(pid)?;
        let win = match source {
            WindowSource::Focused => app.child("AXFocusedWindow"),
            WindowSource::Main => app.child("AXMainWindow"),
            WindowSource::First => app.first_of("AXWindows"),
        }?;
        Ok(Box::new(AxWindow(win)))
    }

    fn activate(&self, pid: Pid) -> AccessResult<()> {
        // SAFETY: typed AppKit wrappers; the returned object is retained.
        let app = unsafe {
            NSRunningApplication::runningApplicationWithProcessIdentifier(pid as libc::pid_t)
        }
        .ok_or(AccessError::ActivationFailed)?;
        let ok = unsafe { app.activateWithOptions(activation_options()) };
        if !ok {
            return Err(AccessError::ActivationFailed);
        }
        debug!(pid, "activated app");
        Ok(())
    }
}

/// One AX window element.
struct AxWindow(AXElem);

impl WindowRef for AxWindow {
    fn read(&self, attr: Attribute) -> AccessResult<Value> {
        match attr {
            Attribute::Frontmost | Attribute::Main => ax::get_bool(&self.0, attr).map(Value::Bool),
            Attribute::Position => ax::get_point(&self.0, attr).map(Value::Point),
            Attribute::Size => ax::get_size(&self.0, attr).map(Value::Size),
        }
    }

    fn write(&self, attr: Attribute, value: Value) -> AccessResult<()> {
        match (attr, value) {
            (Attribute::Frontmost | Attribute::Main, Value::Bool(b)) => {
                ax::set_bool(&self.0, attr, b)
            }
            (Attribute::Position, Value::Point(p)) => ax::set_point(&self.0, attr, p),
            (Attribute::Size, Value::Size(s)) => ax::set_size(&self.0, attr, s),
            _ => Err(AccessError::Unsupported),
        }
    }

    fn raise(&self) -> AccessResult<()> {
        ax::raise(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(deprecated)]
    fn activation_brings_all_windows_ignoring_other_apps() {
        let opts = activation_options();
        assert!(opts.contains(NSApplicationActivationOptions::ActivateAllWindows));
        assert!(opts.contains(NSApplicationActivationOptions::ActivateIgnoringOtherApps));
    }
}
