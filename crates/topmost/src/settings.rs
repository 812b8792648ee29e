//! Settings window: persistence toggle, theme mode and accent color.

use topmost_core::{Preferences, ThemeMode};

/// A change the user made in the settings window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsChange {
    /// Remember the pinned app across restarts.
    Persistence(bool),
    /// New theme mode.
    Theme(ThemeMode),
    /// New accent color as `#RRGGBB`.
    Accent(String),
}

impl SettingsChange {
    /// Apply a cosmetic change to a preference document.
    ///
    /// Persistence changes go through the controller so the stored target is
    /// kept consistent; they are ignored here.
    pub fn apply_cosmetic(&self, prefs: &mut Preferences) {
        match self {
            Self::Persistence(_) => {}
            Self::Theme(mode) => prefs.theme_mode = *mode,
            Self::Accent(hex) => prefs.accent_color.clone_from(hex),
        }
    }
}

#[cfg(target_os = "macos")]
mod render {
    use egui::{
        CentralPanel, Color32, Context, RichText, Sense, Stroke, ViewportBuilder, ViewportCommand,
        ViewportId, vec2,
    };
    use topmost_core::{Preferences, ThemeMode};

    use super::SettingsChange;
    use crate::theme::{ACCENT_PALETTE, accent_or_default, parse_hex};

    /// Swatch diameter in logical pixels.
    const SWATCH: f32 = 28.0;

    /// Settings window visibility and rendering.
    pub struct SettingsWindow {
        /// Whether the window is shown.
        visible: bool,
        /// Stable viewport id.
        id: ViewportId,
        /// Shortcut text shown read-only.
        shortcut: String,
    }

    impl SettingsWindow {
        /// Hidden settings window describing `shortcut`.
        pub fn new(shortcut: &str) -> Self {
            Self {
                visible: false,
                id: ViewportId::from_hash_of("topmost_settings"),
                shortcut: shortcut.to_string(),
            }
        }

        /// Show the window.
        pub fn show(&mut self) {
            self.visible = true;
        }

        /// Render against `prefs`, returning whatever the user changed.
        pub fn render(&mut self, ctx: &Context, prefs: &Preferences) -> Vec<SettingsChange> {
            if !self.visible {
                ctx.send_viewport_cmd_to(self.id, ViewportCommand::Visible(false));
                return Vec::new();
            }
            let builder = ViewportBuilder::default()
                .with_title("topmost Settings")
                .with_visible(true)
                .with_resizable(false)
                .with_inner_size(vec2(420.0, 380.0));

            let accent = accent_or_default(&prefs.accent_color);
            let mut changes = Vec::new();
            ctx.show_viewport_immediate(self.id, builder, |vctx, _| {
                if vctx.input(|i| i.viewport().close_requested()) {
                    self.visible = false;
                    vctx.send_viewport_cmd(ViewportCommand::Visible(false));
                    return;
                }
                CentralPanel::default().show(vctx, |ui| {
                    ui.heading("General");
                    ui.horizontal(|ui| {
                        ui.label("Toggle shortcut:");
                        ui.label(RichText::new(&self.shortcut).monospace().color(accent));
                    });
                    ui.add_space(12.0);

                    ui.heading("Behavior");
                    let mut persist = prefs.persistence_enabled;
                    if ui
                        .checkbox(&mut persist, "Persist last pinned app")
                        .on_hover_text("Remember pinned windows after app restart")
                        .changed()
                    {
                        changes.push(SettingsChange::Persistence(persist));
                    }
                    ui.add_space(12.0);

                    ui.heading("Appearance");
                    ui.horizontal(|ui| {
                        for mode in ThemeMode::ALL {
                            if ui
                                .selectable_label(prefs.theme_mode == mode, mode.label())
                                .clicked()
                                && prefs.theme_mode != mode
                            {
                                changes.push(SettingsChange::Theme(mode));
                            }
                        }
                    });
                    ui.add_space(8.0);
                    ui.label("Accent color");
                    for row in ACCENT_PALETTE.chunks(6) {
                        ui.horizontal(|ui| {
                            for (name, hex) in row {
                                let color = parse_hex(hex).unwrap_or(Color32::GRAY);
                                let selected = prefs.accent_color.eq_ignore_ascii_case(hex);
                                let (rect, resp) =
                                    ui.allocate_exact_size(vec2(SWATCH, SWATCH), Sense::click());
                                let painter = ui.painter();
                                painter.circle_filled(rect.center(), SWATCH / 2.0 - 2.0, color);
                                if selected {
                                    painter.circle_stroke(
                                        rect.center(),
                                        SWATCH / 2.0,
                                        Stroke::new(2.0, ui.visuals().strong_text_color()),
                                    );
                                }
                                if resp.on_hover_text(*name).clicked() && !selected {
                                    changes.push(SettingsChange::Accent((*hex).to_string()));
                                }
                            }
                        });
                    }
                });
            });
            changes
        }
    }
}

#[cfg(target_os = "macos")]
pub use render::SettingsWindow;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosmetic_changes_update_preferences() {
        let mut prefs = Preferences::default();
        SettingsChange::Theme(ThemeMode::Dark).apply_cosmetic(&mut prefs);
        SettingsChange::Accent("#10B981".into()).apply_cosmetic(&mut prefs);
        assert_eq!(prefs.theme_mode, ThemeMode::Dark);
        assert_eq!(prefs.accent_color, "#10B981");
    }

    #[test]
    fn persistence_is_not_cosmetic() {
        let mut prefs = Preferences::default();
        let before = prefs.clone();
        SettingsChange::Persistence(!prefs.persistence_enabled).apply_cosmetic(&mut prefs);
        assert_eq!(prefs, before);
    }
}
