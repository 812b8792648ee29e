//! Application termination notifications from `NSWorkspace`.

use std::ptr::NonNull;

use block2::RcBlock;
use objc2::{rc::Retained, runtime::ProtocolObject};
use objc2_app_kit::{NSRunningApplication, NSWorkspace};
use objc2_foundation::{NSNotification, NSObjectProtocol, NSString};
use topmost_core::Pid;
use tracing::{debug, info};

/// Keeps the termination observer registered; removes it on drop.
pub struct TerminationObserver {
    /// Token returned by the notification center.
    token: Retained<ProtocolObject<dyn NSObjectProtocol>>,
}

/// Observe `NSWorkspaceDidTerminateApplicationNotification`, calling
/// `on_exit` with the pid of every application that quits.
///
/// Must be called on the main thread; the callback runs there as well.
pub fn observe_terminations(on_exit: impl Fn(Pid) + 'static) -> TerminationObserver {
    let workspace = NSWorkspace::sharedWorkspace();
    let center = workspace.notificationCenter();
    let name = NSString::from_str("NSWorkspaceDidTerminateApplicationNotification");
    let app_key = NSString::from_str("NSWorkspaceApplicationKey");

    let block = RcBlock::new(move |notif: NonNull<NSNotification>| {
        // SAFETY: the notification center passes a valid notification.
        let notif = unsafe { notif.as_ref() };
        let pid = notif
            .userInfo()
            .and_then(|info| info.objectForKey(&app_key))
            .and_then(|obj| obj.downcast::<NSRunningApplication>().ok())
            .map(|app| app.processIdentifier());
        match pid {
            Some(pid) => {
                debug!(pid, "application terminated");
                on_exit(pid);
            }
            None => debug!("termination notification without an application"),
        }
    });
    // SAFETY: the block is retained by the center for the token's lifetime.
    let token = unsafe {
        center.addObserverForName_object_queue_usingBlock(Some(&name), None, None, &block)
    };
    info!("termination observer installed");
    TerminationObserver { token }
}

impl Drop for TerminationObserver {
    fn drop(&mut self) {
        let center = NSWorkspace::sharedWorkspace().notificationCenter();
        // SAFETY: the token was produced by this center.
        unsafe { center.removeObserver(self.token.as_ref()) };
    }
}
