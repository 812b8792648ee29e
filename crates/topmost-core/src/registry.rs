//! Target Registry: the set of running, user-visible applications.

use std::sync::Arc;

use tracing::debug;

use crate::{
    app::{ActivationPolicy, AppHandle, AppSource},
    window::Pid,
};

/// Entry presented to the picker and the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    /// Process identifier.
    pub pid: Pid,
    /// Display name.
    pub name: String,
    /// Whether this entry is the current target.
    pub is_current: bool,
}

/// Cached list of pinnable applications, rebuilt wholesale on refresh.
pub struct TargetRegistry {
    /// Process table capability.
    source: Arc<dyn AppSource>,
    /// Our own pid, never offered as a target.
    own_pid: Pid,
    /// Last refreshed list.
    apps: Vec<AppHandle>,
}

impl TargetRegistry {
    /// Create an empty registry; call [`TargetRegistry::refresh`] to populate.
    pub fn new(source: Arc<dyn AppSource>, own_pid: Pid) -> Self {
        Self {
            source,
            own_pid,
            apps: Vec::new(),
        }
    }

    /// Rebuild the list from the process table.
    ///
    /// Keeps regular-activation processes other than our own.
    pub fn refresh(&mut self) -> &[AppHandle] {
        self.apps = self
            .source
            .running_apps()
            .into_iter()
            .filter(|r| r.policy == ActivationPolicy::Regular && r.app.pid != self.own_pid)
            .map(|r| r.app)
            .collect();
        debug!(count = self.apps.len(), "refreshed running apps");
        &self.apps
    }

    /// Current cached list.
    pub fn apps(&self) -> &[AppHandle] {
        &self.apps
    }

    /// Whether `pid` is in the cached list.
    pub fn contains(&self, pid: Pid) -> bool {
        self.apps.iter().any(|a| a.pid == pid)
    }

    /// Drop `pid` from the cached list (used on termination events).
    pub fn forget(&mut self, pid: Pid) {
        self.apps.retain(|a| a.pid != pid);
    }

    /// Application with the given pid.
    pub fn find_by_pid(&self, pid: Pid) -> Option<&AppHandle> {
        self.apps.iter().find(|a| a.pid == pid)
    }

    /// First application with the given display name.
    pub fn find_by_name(&self, name: &str) -> Option<&AppHandle> {
        self.apps.iter().find(|a| a.name == name)
    }

    /// First application with the given bundle identifier.
    pub fn find_by_bundle_id(&self, bundle_id: &str) -> Option<&AppHandle> {
        self.apps
            .iter()
            .find(|a| a.bundle_id.as_deref() == Some(bundle_id))
    }

    /// Name/current pairs for presentation.
    pub fn entries(&self, current: Option<&AppHandle>) -> Vec<TargetEntry> {
        self.apps
            .iter()
            .map(|a| TargetEntry {
                pid: a.pid,
                name: a.name.clone(),
                is_current: current.is_some_and(|c| c.pid == a.pid),
            })
            .collect()
    }
}

/// Case-insensitive substring filter over display names.
///
/// An empty (or whitespace-only) query matches everything.
pub fn filter_by_name<'a>(apps: &'a [AppHandle], query: &str) -> Vec<&'a AppHandle> {
    let needle = query.trim().to_lowercase();
    apps.iter()
        .filter(|a| needle.is_empty() || a.name.to_lowercase().contains(&needle))
        .collect()
}
