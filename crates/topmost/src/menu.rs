//! Status-bar menu contents derived from the controller, independent of the
//! tray backend so it can be rebuilt and tested anywhere.

use topmost_core::{Pid, PinController, TargetEntry};

/// Something the user can pick from the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Select (or, when already current, deselect) the application with this pid.
    Select(Pid),
    /// Pin or unpin the current target.
    TogglePin,
    /// Re-list running applications.
    Refresh,
    /// Open the app picker.
    OpenPicker,
    /// Open settings.
    Settings,
    /// Open the permissions help window.
    PermissionsHelp,
    /// Exit the application.
    Quit,
}

/// One row of the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    /// Disabled informational line.
    Label(String),
    /// Separator line.
    Separator,
    /// Application row with a checkmark when current.
    Target {
        /// Process identifier.
        pid: Pid,
        /// Display name.
        name: String,
        /// Whether this is the selected target.
        current: bool,
    },
    /// Clickable command.
    Item {
        /// Row text.
        label: String,
        /// Whether the row can be clicked.
        enabled: bool,
        /// Action performed on click.
        action: MenuAction,
    },
}

/// Full menu description plus the status-bar title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuModel {
    /// Title shown next to the status-bar icon.
    pub title: String,
    /// Whether the pinned glyph should be drawn.
    pub pinned: bool,
    /// Rows in display order.
    pub entries: Vec<MenuEntry>,
}

impl MenuModel {
    /// Describe the menu for the controller's current state.
    pub fn from_controller(controller: &PinController) -> Self {
        Self::build(
            controller.title(),
            controller.status_text(),
            controller.is_pinned(),
            controller.target().is_some(),
            &controller.available_targets(),
        )
    }

    /// Describe the menu from individual observations.
    pub fn build(
        title: String,
        status: &str,
        pinned: bool,
        has_target: bool,
        targets: &[TargetEntry],
    ) -> Self {
        let mut entries = vec![MenuEntry::Label(status.to_string()), MenuEntry::Separator];
        if targets.is_empty() {
            entries.push(MenuEntry::Label("No applications".to_string()));
        }
        entries.extend(targets.iter().map(|t| MenuEntry::Target {
            pid: t.pid,
            name: t.name.clone(),
            current: t.is_current,
        }));
        entries.push(MenuEntry::Separator);
        entries.push(MenuEntry::Item {
            label: if pinned { "Unpin Window" } else { "Pin Window" }.to_string(),
            enabled: has_target,
            action: MenuAction::TogglePin,
        });
        for (label, action) in [
            ("Choose App…", MenuAction::OpenPicker),
            ("Refresh App List", MenuAction::Refresh),
        ] {
            entries.push(MenuEntry::Item {
                label: label.to_string(),
                enabled: true,
                action,
            });
        }
        entries.push(MenuEntry::Separator);
        for (label, action) in [
            ("Settings…", MenuAction::Settings),
            ("Permissions Help", MenuAction::PermissionsHelp),
            ("Quit", MenuAction::Quit),
        ] {
            entries.push(MenuEntry::Item {
                label: label.to_string(),
                enabled: true,
                action,
            });
        }
        Self {
            title,
            pinned,
            entries,
        }
    }

    /// The action bound to each clickable row, in order.
    pub fn actions(&self) -> impl Iterator<Item = MenuAction> + '_ {
        self.entries.iter().filter_map(|e| match e {
            MenuEntry::Target { pid, .. } => Some(MenuAction::Select(*pid)),
            MenuEntry::Item { action, .. } => Some(action.clone()),
            MenuEntry::Label(_) | MenuEntry::Separator => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pid: Pid, name: &str, current: bool) -> TargetEntry {
        TargetEntry {
            pid,
            name: name.into(),
            is_current: current,
        }
    }

    fn toggle(model: &MenuModel) -> Option<(&str, bool)> {
        model.entries.iter().find_map(|e| match e {
            MenuEntry::Item {
                label,
                enabled,
                action: MenuAction::TogglePin,
            } => Some((label.as_str(), *enabled)),
            _ => None,
        })
    }

    #[test]
    fn idle_menu_disables_toggle() {
        let m = MenuModel::build(String::new(), "Select an app to begin", false, false, &[]);
        assert_eq!(m.entries[0], MenuEntry::Label("Select an app to begin".into()));
        assert_eq!(toggle(&m), Some(("Pin Window", false)));
        assert!(m.entries.contains(&MenuEntry::Label("No applications".into())));
    }

    #[test]
    fn pinned_menu_offers_unpin_and_marks_current() {
        let targets = [entry(2, "Finder", false), entry(3, "Safari", true)];
        let m = MenuModel::build("Safari (Pinned)".into(), "Status: Pinned", true, true, &targets);
        assert_eq!(toggle(&m), Some(("Unpin Window", true)));
        assert!(m.entries.contains(&MenuEntry::Target {
            pid: 3,
            name: "Safari".into(),
            current: true
        }));
        assert!(m.pinned);
    }

    #[test]
    fn same_named_targets_get_distinct_actions() {
        let targets = [entry(2, "Terminal", true), entry(3, "Terminal", false)];
        let m = MenuModel::build("Terminal (Unpinned)".into(), "x", false, true, &targets);
        let selects: Vec<_> = m
            .actions()
            .filter(|a| matches!(a, MenuAction::Select(_)))
            .collect();
        assert_eq!(selects, vec![MenuAction::Select(2), MenuAction::Select(3)]);
    }

    #[test]
    fn actions_cover_targets_then_commands() {
        let targets = [entry(2, "Finder", false)];
        let m = MenuModel::build(String::new(), "x", false, true, &targets);
        let actions: Vec<_> = m.actions().collect();
        assert_eq!(actions[0], MenuAction::Select(2));
        assert_eq!(actions.last(), Some(&MenuAction::Quit));
        assert!(actions.contains(&MenuAction::Refresh));
    }
}
