//! Application handles and the running-application capability.

use crate::window::Pid;

/// One running, user-visible process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppHandle {
    /// Process identifier; stable for the lifetime of the process.
    pub pid: Pid,
    /// Localized display name. May collide across processes.
    pub name: String,
    /// Bundle identifier, stable across relaunches. Used for persistence.
    pub bundle_id: Option<String>,
}

/// How an application participates in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPolicy {
    /// Ordinary app with a Dock icon and menu bar.
    Regular,
    /// Menu-bar style app without a Dock icon.
    Accessory,
    /// Background-only process.
    Prohibited,
}

/// A process as reported by the platform's process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningApp {
    /// Identity of the process.
    pub app: AppHandle,
    /// Activation policy at the time of listing.
    pub policy: ActivationPolicy,
}

/// Capability to list running applications.
pub trait AppSource: Send + Sync {
    /// Snapshot of all running applications, in platform order.
    fn running_apps(&self) -> Vec<RunningApp>;
}
