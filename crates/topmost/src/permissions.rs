//! Accessibility permissions help window.

use std::{process::Command, time::Duration};

use egui::{
    CentralPanel, Color32, Context, RichText, ViewportBuilder, ViewportCommand, ViewportId, vec2,
};
use tracing::warn;

/// System Settings pane for Accessibility trust.
const ACCESSIBILITY_PANE: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

/// Window explaining how to grant Accessibility access, with a live status.
pub struct PermissionsHelp {
    /// Whether the help viewport is visible.
    visible: bool,
    /// Stable viewport id for the help window.
    id: ViewportId,
}

/// Open the Accessibility pane in System Settings.
fn open_accessibility_settings() {
    if let Err(e) = Command::new("open").arg(ACCESSIBILITY_PANE).spawn() {
        warn!("failed to open System Settings: {}", e);
    }
}

impl PermissionsHelp {
    /// Construct a hidden help window.
    pub fn new() -> Self {
        Self {
            visible: false,
            id: ViewportId::from_hash_of("topmost_permissions"),
        }
    }

    /// Show the help window.
    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Render the help viewport when visible.
    pub fn render(&mut self, ctx: &Context) {
        if !self.visible {
            ctx.send_viewport_cmd_to(self.id, ViewportCommand::Visible(false));
            return;
        }

        let builder = ViewportBuilder::default()
            .with_title("Permissions Required")
            .with_visible(true)
            .with_decorations(true)
            .with_resizable(true)
            .with_inner_size(vec2(520.0, 300.0));

        ctx.show_viewport_immediate(self.id, builder, |wctx, _| {
            if wctx.input(|i| i.viewport().close_requested()) {
                self.visible = false;
                wctx.send_viewport_cmd(ViewportCommand::Visible(false));
                return;
            }

            let access_ok = ::permissions::check_permissions().accessibility_ok;
            let (color, status) = if access_ok {
                (Color32::from_rgb(64, 201, 99), "Enabled")
            } else {
                (Color32::from_rgb(220, 50, 47), "Not enabled yet")
            };

            CentralPanel::default().show(wctx, |ui| {
                ui.heading(RichText::new("topmost Needs Accessibility Access").strong());
                ui.add_space(8.0);
                ui.label(
                    "Keeping a window in front requires inspecting and raising other \
                     applications' windows through the Accessibility API.",
                );
                ui.add_space(12.0);
                ui.separator();
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Accessibility").color(color).strong());
                    ui.label(RichText::new(status).color(color));
                });
                ui.add_space(4.0);
                ui.label(
                    "Add topmost under System Settings > Privacy & Security > Accessibility, \
                     then enable it. Pinning starts working immediately.",
                );
                ui.add_space(6.0);
                if ui.button("Open Accessibility Settings").clicked() {
                    open_accessibility_settings();
                }
                if !access_ok && ui.button("Ask Again").clicked() {
                    ::permissions::prompt_accessibility();
                }
            });
            // Keep the status live while the window is open.
            wctx.request_repaint_after(Duration::from_secs(1));
        });
    }
}
