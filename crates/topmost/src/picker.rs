//! App picker: a searchable list of running applications opened by the
//! global shortcut. Choosing an entry pins that application.

/// Query, highlight and visibility of the picker.
#[derive(Debug, Default)]
pub struct Picker {
    /// Whether the picker window is shown.
    open: bool,
    /// Current search text.
    query: String,
    /// Highlighted row within the filtered list.
    cursor: usize,
}

/// Keyboard input the picker reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKey {
    /// Move the highlight up.
    Up,
    /// Move the highlight down.
    Down,
    /// Choose the highlighted entry.
    Enter,
    /// Close without choosing.
    Escape,
}

impl Picker {
    /// Whether the picker is visible.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Show the picker with an empty query.
    pub fn open(&mut self) {
        self.open = true;
        self.query.clear();
        self.cursor = 0;
    }

    /// Hide the picker.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Current search text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the search text; the highlight returns to the top.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.cursor = 0;
    }

    /// Highlighted row, clamped to a list of `len` matches.
    pub fn cursor(&self, len: usize) -> usize {
        self.cursor.min(len.saturating_sub(1))
    }

    /// Apply a key against `matches` (display names, in list order).
    ///
    /// Returns the chosen name on `Enter`; the picker closes in that case and
    /// on `Escape`.
    pub fn key(&mut self, key: PickerKey, matches: &[&str]) -> Option<String> {
        let len = matches.len();
        match key {
            PickerKey::Up => {
                self.cursor = self.cursor(len).saturating_sub(1);
                None
            }
            PickerKey::Down => {
                if len > 0 {
                    self.cursor = (self.cursor(len) + 1).min(len - 1);
                }
                None
            }
            PickerKey::Enter => {
                let chosen = matches.get(self.cursor(len)).map(|s| (*s).to_string());
                if chosen.is_some() {
                    self.close();
                }
                chosen
            }
            PickerKey::Escape => {
                self.close();
                None
            }
        }
    }
}

#[cfg(target_os = "macos")]
mod render {
    use egui::{
        CentralPanel, Color32, Context, Key, RichText, ScrollArea, TextEdit, ViewportBuilder,
        ViewportCommand, ViewportId, vec2,
    };

    use super::{Picker, PickerKey};

    /// Picker window size in logical pixels.
    const PICKER_SIZE: [f32; 2] = [360.0, 420.0];

    /// Render `picker` over `matches`; returns the chosen application name.
    pub fn render(
        picker: &mut Picker,
        ctx: &Context,
        matches: &[&str],
        accent: Color32,
    ) -> Option<String> {
        let id = ViewportId::from_hash_of("topmost_picker");
        if !picker.open {
            ctx.send_viewport_cmd_to(id, ViewportCommand::Visible(false));
            return None;
        }
        let builder = ViewportBuilder::default()
            .with_title("Pin an App")
            .with_visible(true)
            .with_always_on_top()
            .with_resizable(false)
            .with_inner_size(vec2(PICKER_SIZE[0], PICKER_SIZE[1]));

        let mut chosen = None;
        let mut query = picker.query.clone();
        ctx.show_viewport_immediate(id, builder, |vctx, _| {
            if vctx.input(|i| i.viewport().close_requested()) {
                picker.close();
                return;
            }
            for (k, pk) in [
                (Key::ArrowUp, PickerKey::Up),
                (Key::ArrowDown, PickerKey::Down),
                (Key::Enter, PickerKey::Enter),
                (Key::Escape, PickerKey::Escape),
            ] {
                if vctx.input(|i| i.key_pressed(k)) {
                    chosen = chosen.or(picker.key(pk, matches));
                }
            }
            let cursor = picker.cursor(matches.len());
            CentralPanel::default().show(vctx, |ui| {
                ui.heading("Pin an App");
                let edit = ui.add(
                    TextEdit::singleline(&mut query)
                        .hint_text("Search applications")
                        .desired_width(f32::INFINITY),
                );
                edit.request_focus();
                ui.add_space(6.0);
                ScrollArea::vertical().show(ui, |ui| {
                    if matches.is_empty() {
                        ui.label(RichText::new("No matching applications").weak());
                    }
                    for (i, name) in matches.iter().enumerate() {
                        let text = if i == cursor {
                            RichText::new(*name).color(accent).strong()
                        } else {
                            RichText::new(*name)
                        };
                        if ui.selectable_label(i == cursor, text).clicked() {
                            chosen = Some((*name).to_string());
                        }
                    }
                });
            });
        });
        if query != picker.query {
            picker.set_query(query);
        }
        if chosen.is_some() {
            picker.close();
        }
        chosen
    }
}

#[cfg(target_os = "macos")]
pub use render::render;

#[cfg(test)]
mod tests {
    use super::*;

    const APPS: [&str; 3] = ["Finder", "Safari", "Slack"];

    #[test]
    fn open_resets_query_and_cursor() {
        let mut p = Picker::default();
        p.open();
        p.set_query("sa");
        p.key(PickerKey::Down, &APPS);
        p.close();
        p.open();
        assert!(p.is_open());
        assert_eq!(p.query(), "");
        assert_eq!(p.cursor(APPS.len()), 0);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut p = Picker::default();
        p.open();
        p.key(PickerKey::Up, &APPS);
        assert_eq!(p.cursor(APPS.len()), 0);
        for _ in 0..5 {
            p.key(PickerKey::Down, &APPS);
        }
        assert_eq!(p.cursor(APPS.len()), 2);
        // A shorter filtered list clamps the highlight.
        assert_eq!(p.cursor(1), 0);
    }

    #[test]
    fn enter_chooses_highlighted_and_closes() {
        let mut p = Picker::default();
        p.open();
        p.key(PickerKey::Down, &APPS);
        assert_eq!(p.key(PickerKey::Enter, &APPS), Some("Safari".to_string()));
        assert!(!p.is_open());
    }

    #[test]
    fn enter_on_empty_list_keeps_picker_open() {
        let mut p = Picker::default();
        p.open();
        assert_eq!(p.key(PickerKey::Enter, &[]), None);
        assert!(p.is_open());
    }

    #[test]
    fn escape_closes() {
        let mut p = Picker::default();
        p.open();
        assert_eq!(p.key(PickerKey::Escape, &APPS), None);
        assert!(!p.is_open());
    }

    #[test]
    fn new_query_moves_highlight_to_top() {
        let mut p = Picker::default();
        p.open();
        p.key(PickerKey::Down, &APPS);
        p.set_query("s");
        assert_eq!(p.cursor(APPS.len()), 0);
    }
}
