//! UI-thread application state: event draining, controller ticks and window rendering.

use std::time::Instant;

use eframe::{App, Frame};
use egui::{Context, ViewportCommand};
use mac_winops::TerminationObserver;
use tokio::sync::mpsc as tokio_mpsc;
use topmost_core::{PinController, PinEvent, Pid, ShortcutAction, ThemeMode};
use tracing::{debug, info};
use tray_icon::menu::MenuId;

use crate::{
    hotkey::GlobalShortcut,
    menu::{MenuAction, MenuModel},
    permissions::PermissionsHelp,
    picker::{self, Picker},
    settings::{SettingsChange, SettingsWindow},
    theme,
    toast::{self, ToastKind, Toasts},
    tray::Tray,
};

/// Input delivered to the UI thread from listeners and observers.
pub enum AppEvent {
    /// A tray menu row was clicked.
    Menu(MenuId),
    /// The global shortcut was pressed.
    Shortcut,
    /// An application quit.
    Terminated(Pid),
}

/// Everything owned by the UI thread.
pub struct TopmostApp {
    /// The pin state machine.
    pub(crate) controller: PinController,
    /// Listener and observer input.
    pub(crate) rx: tokio_mpsc::UnboundedReceiver<AppEvent>,
    /// Controller change notifications.
    pub(crate) pin_rx: tokio_mpsc::UnboundedReceiver<PinEvent>,
    /// Status-bar item.
    pub(crate) tray: Option<Tray>,
    /// App picker.
    pub(crate) picker: Picker,
    /// Settings window.
    pub(crate) settings: SettingsWindow,
    /// Permissions help window.
    pub(crate) permissions: PermissionsHelp,
    /// Pin/unpin confirmation.
    pub(crate) toasts: Toasts,
    /// Global shortcut registration, if it succeeded.
    pub(crate) _shortcut: Option<GlobalShortcut>,
    /// Termination observer registration.
    pub(crate) _observer: TerminationObserver,
    /// Theme mode and accent last pushed into egui.
    pub(crate) applied_theme: Option<(ThemeMode, String)>,
    /// Menu needs rebuilding.
    pub(crate) menu_dirty: bool,
    /// Quit was requested; let the root viewport close.
    pub(crate) quitting: bool,
}

impl TopmostApp {
    /// Perform a menu action.
    fn dispatch(&mut self, ctx: &Context, action: MenuAction) {
        match action {
            MenuAction::Select(pid) => {
                if let Err(e) = self.controller.choose_entry(pid) {
                    debug!("selection failed: {}", e);
                }
            }
            MenuAction::TogglePin => {
                if let Err(e) = self.controller.toggle_pin() {
                    debug!("toggle failed: {}", e);
                }
            }
            MenuAction::Refresh => self.controller.refresh_targets(),
            MenuAction::OpenPicker => self.picker.open(),
            MenuAction::Settings => self.settings.show(),
            MenuAction::PermissionsHelp => self.permissions.show(),
            MenuAction::Quit => {
                info!("quit requested");
                self.quitting = true;
                self.tray = None;
                ctx.send_viewport_cmd(ViewportCommand::Close);
            }
        }
    }

    /// Drain listener input.
    fn drain_app_events(&mut self, ctx: &Context) {
        while let Ok(ev) = self.rx.try_recv() {
            match ev {
                AppEvent::Menu(id) => {
                    if let Some(action) = self.tray.as_ref().and_then(|t| t.action(&id)) {
                        self.dispatch(ctx, action);
                    }
                }
                AppEvent::Shortcut => match self.controller.handle_shortcut(self.picker.is_open()) {
                    ShortcutAction::Unpin | ShortcutAction::ClosePicker => self.picker.close(),
                    ShortcutAction::OpenPicker => self.picker.open(),
                },
                AppEvent::Terminated(pid) => {
                    self.controller.target_terminated(pid);
                }
            }
        }
    }

    /// Drain controller notifications into toasts and menu refreshes.
    fn drain_pin_events(&mut self, now: Instant) {
        while let Ok(ev) = self.pin_rx.try_recv() {
            match ev {
                PinEvent::Pinned { name } => self.toasts.show(ToastKind::Pinned, name, now),
                PinEvent::Unpinned { name } => self.toasts.show(ToastKind::Unpinned, name, now),
                PinEvent::Changed => {}
            }
            self.menu_dirty = true;
        }
    }

    /// Push theme preferences into egui when they changed.
    fn sync_theme(&mut self, ctx: &Context) {
        let prefs = self.controller.preferences();
        let wanted = (prefs.theme_mode, prefs.accent_color.clone());
        if self.applied_theme.as_ref() != Some(&wanted) {
            theme::apply(ctx, wanted.0, &wanted.1);
            self.applied_theme = Some(wanted);
        }
    }

    /// Render the picker and act on a choice.
    fn render_picker(&mut self, ctx: &Context) {
        let accent = theme::accent_or_default(&self.controller.preferences().accent_color);
        let names: Vec<String> = self
            .controller
            .search(self.picker.query())
            .into_iter()
            .map(|a| a.name.clone())
            .collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        if let Some(name) = picker::render(&mut self.picker, ctx, &names, accent)
            && let Err(e) = self.controller.pin_from_picker(&name)
        {
            debug!("pin from picker failed: {}", e);
        }
    }

    /// Render settings and apply the changes.
    fn render_settings(&mut self, ctx: &Context) {
        let changes = self.settings.render(ctx, self.controller.preferences());
        for change in changes {
            match change {
                SettingsChange::Persistence(on) => self.controller.set_persistence_enabled(on),
                cosmetic => self
                    .controller
                    .update_preferences(|p| cosmetic.apply_cosmetic(p)),
            }
        }
    }

    /// Ask for the next frame when the controller or a toast has work.
    fn schedule(&self, ctx: &Context, now: Instant) {
        let next = [self.controller.next_deadline(), self.toasts.deadline()]
            .into_iter()
            .flatten()
            .min();
        if let Some(at) = next {
            ctx.request_repaint_after(at.saturating_duration_since(now));
        }
    }
}

impl App for TopmostApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        egui::Color32::TRANSPARENT.to_normalized_gamma_f32()
    }

    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        if !self.quitting && ctx.input(|i| i.viewport().close_requested()) {
            ctx.send_viewport_cmd(ViewportCommand::Visible(false));
            ctx.send_viewport_cmd(ViewportCommand::CancelClose);
        }

        self.drain_app_events(ctx);
        self.controller.tick();
        self.sync_theme(ctx);
        self.render_picker(ctx);
        self.render_settings(ctx);
        self.permissions.render(ctx);

        let now = Instant::now();
        self.drain_pin_events(now);
        if self.menu_dirty {
            if let Some(tray) = &mut self.tray {
                tray.update(MenuModel::from_controller(&self.controller));
            }
            self.menu_dirty = false;
        }
        let accent = theme::accent_or_default(&self.controller.preferences().accent_color);
        toast::render(ctx, self.toasts.current(now), accent);

        self.schedule(ctx, now);
    }
}
