//! Status-bar icon and menu backed by `tray-icon`.

use std::{collections::HashMap, thread};

use egui::Context;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{error, warn};
use tray_icon::{
    Icon, TrayIcon, TrayIconBuilder,
    menu::{CheckMenuItem, Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem},
};

use crate::{
    app::AppEvent,
    icon::{ICON_SIZE, glyph_rgba},
    menu::{MenuAction, MenuEntry, MenuModel},
};

/// Status-bar item and the actions bound to its current menu.
pub struct Tray {
    /// Live tray icon.
    icon: TrayIcon,
    /// Menu ids of the current menu.
    actions: HashMap<MenuId, MenuAction>,
    /// Model the menu was last built from.
    shown: Option<MenuModel>,
}

/// Tray glyph for the pinned state.
fn glyph(pinned: bool) -> Option<Icon> {
    Icon::from_rgba(glyph_rgba(pinned, ICON_SIZE), ICON_SIZE, ICON_SIZE).ok()
}

/// Build a native menu for `model`, returning it with its id table.
fn build_menu(model: &MenuModel) -> (Menu, HashMap<MenuId, MenuAction>) {
    let menu = Menu::new();
    let mut actions = HashMap::new();
    let mut actions_iter = model.actions();
    for entry in &model.entries {
        let res = match entry {
            MenuEntry::Label(text) => menu.append(&MenuItem::new(text, false, None)),
            MenuEntry::Separator => menu.append(&PredefinedMenuItem::separator()),
            MenuEntry::Target { name, current, .. } => {
                let item = CheckMenuItem::new(name, true, *current, None);
                if let Some(a) = actions_iter.next() {
                    actions.insert(item.id().clone(), a);
                }
                menu.append(&item)
            }
            MenuEntry::Item { label, enabled, .. } => {
                let item = MenuItem::new(label, *enabled, None);
                if let Some(a) = actions_iter.next() {
                    actions.insert(item.id().clone(), a);
                }
                menu.append(&item)
            }
        };
        if let Err(e) = res {
            warn!("failed to append menu entry: {}", e);
        }
    }
    (menu, actions)
}

impl Tray {
    /// Create the status-bar item and start forwarding menu clicks to `tx`.
    pub fn new(
        model: &MenuModel,
        tx: tokio_mpsc::UnboundedSender<AppEvent>,
        egui_ctx: Context,
    ) -> Option<Self> {
        let (menu, actions) = build_menu(model);
        let mut builder = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_menu_on_left_click(true)
            .with_title(&model.title)
            .with_tooltip("topmost");
        if let Some(icon) = glyph(model.pinned) {
            builder = builder.with_icon(icon).with_icon_as_template(true);
        }
        let icon = match builder.build() {
            Ok(t) => t,
            Err(e) => {
                error!("Failed to create tray icon: {}", e);
                return None;
            }
        };

        thread::spawn(move || {
            let menu_rx = MenuEvent::receiver();
            while let Ok(ev) = menu_rx.recv() {
                if tx.send(AppEvent::Menu(ev.id)).is_err() {
                    break;
                }
                egui_ctx.request_repaint();
            }
        });

        Some(Self {
            icon,
            actions,
            shown: Some(model.clone()),
        })
    }

    /// Action for a clicked menu id.
    pub fn action(&self, id: &MenuId) -> Option<MenuAction> {
        self.actions.get(id).cloned()
    }

    /// Rebuild the menu, title and glyph if `model` differs from what is shown.
    pub fn update(&mut self, model: MenuModel) {
        if self.shown.as_ref() == Some(&model) {
            return;
        }
        let (menu, actions) = build_menu(&model);
        self.icon.set_menu(Some(Box::new(menu)));
        self.actions = actions;
        self.icon.set_title(Some(&model.title));
        if self.shown.as_ref().map(|m| m.pinned) != Some(model.pinned) {
            if let Err(e) = self.icon.set_icon(glyph(model.pinned)) {
                warn!("failed to update tray icon: {}", e);
            }
            self.icon.set_icon_as_template(true);
        }
        self.shown = Some(model);
    }
}
