//! Global shortcut routing.

/// What a press of the global shortcut should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Unpin the current target and close the picker if it is open.
    Unpin,
    /// Close the open picker.
    ClosePicker,
    /// Open the picker.
    OpenPicker,
}

/// Decide what the shortcut does given the pin state and picker visibility.
pub fn route_shortcut(pinned: bool, picker_open: bool) -> ShortcutAction {
    if pinned {
        ShortcutAction::Unpin
    } else if picker_open {
        ShortcutAction::ClosePicker
    } else {
        ShortcutAction::OpenPicker
    }
}
