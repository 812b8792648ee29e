//! The single global shortcut that toggles the pin or the picker.

use std::thread;

use egui::Context;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState, hotkey::HotKey};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{debug, info};

use crate::app::AppEvent;

/// Registered shortcut; unregistered when dropped with the manager.
pub struct GlobalShortcut {
    /// Owns the OS registration.
    _manager: GlobalHotKeyManager,
}

/// Register `shortcut` (e.g. `"cmd+shift+KeyP"`) and forward presses to `tx`.
///
/// Must be called on the main thread.
pub fn register(
    shortcut: &str,
    tx: tokio_mpsc::UnboundedSender<AppEvent>,
    egui_ctx: Context,
) -> Result<GlobalShortcut, String> {
    let hotkey: HotKey = shortcut
        .parse()
        .map_err(|e| format!("invalid shortcut {shortcut:?}: {e}"))?;
    let manager =
        GlobalHotKeyManager::new().map_err(|e| format!("hotkey manager unavailable: {e}"))?;
    manager
        .register(hotkey)
        .map_err(|e| format!("failed to register {shortcut:?}: {e}"))?;
    let id = hotkey.id();
    info!(shortcut, "global shortcut registered");

    thread::spawn(move || {
        let rx = GlobalHotKeyEvent::receiver();
        while let Ok(event) = rx.recv() {
            if event.id != id || event.state != HotKeyState::Pressed {
                continue;
            }
            debug!("global shortcut pressed");
            if tx.send(AppEvent::Shortcut).is_err() {
                break;
            }
            egui_ctx.request_repaint();
        }
    });

    Ok(GlobalShortcut { _manager: manager })
}
