//! Running applications via `NSWorkspace`.

use objc2_app_kit::{NSApplicationActivationPolicy, NSWorkspace};
use topmost_core::{ActivationPolicy, AppHandle, AppSource, RunningApp};

/// Lists `NSWorkspace.runningApplications`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkspaceApps;

/// Map the AppKit policy onto ours.
fn policy(p: NSApplicationActivationPolicy) -> ActivationPolicy {
    if p == NSApplicationActivationPolicy::Regular {
        ActivationPolicy::Regular
    } else if p == NSApplicationActivationPolicy::Accessory {
        ActivationPolicy::Accessory
    } else {
        ActivationPolicy::Prohibited
    }
}

impl AppSource for WorkspaceApps {
    fn running_apps(&self) -> Vec<RunningApp> {
        let workspace = NSWorkspace::sharedWorkspace();
        let running = workspace.runningApplications();
        let mut out = Vec::with_capacity(running.count());
        for app in running {
            let name = app.localizedName().map_or(String::new(), |s| s.to_string());
            if name.is_empty() {
                continue;
            }
            out.push(RunningApp {
                app: AppHandle {
                    pid: app.processIdentifier(),
                    name,
                    bundle_id: app.bundleIdentifier().map(|s| s.to_string()),
                },
                policy: policy(app.activationPolicy()),
            });
        }
        out
    }
}
