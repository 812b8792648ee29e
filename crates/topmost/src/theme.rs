//! Accent palette and theme-mode application for the egui shell.

use egui::{Color32, Context, Stroke, ThemePreference, Visuals};
use topmost_core::{ThemeMode, prefs::DEFAULT_ACCENT};

/// Named accent colors offered in settings, in display order.
pub const ACCENT_PALETTE: [(&str, &str); 15] = [
    ("Aurora Blue", DEFAULT_ACCENT),
    ("Emerald Glow", "#10B981"),
    ("Crimson Flame", "#EF4444"),
    ("Amethyst Dream", "#8B5CF6"),
    ("Sunset Orange", "#F59E0B"),
    ("Midnight Slate", "#1E293B"),
    ("Rose Quartz", "#F9A8D4"),
    ("Ocean Teal", "#14B8A6"),
    ("Golden Haze", "#FBBF24"),
    ("Neon Coral", "#FF6B6B"),
    ("Sapphire Luxe", "#1E3A8A"),
    ("Velvet Indigo", "#4C1D95"),
    ("Jade Serenity", "#059669"),
    ("Champagne Bliss", "#FDE68A"),
    ("Obsidian Spark", "#0F172A"),
];

/// Parse `#RRGGBB` (leading `#` optional) into an opaque color.
pub fn parse_hex(hex: &str) -> Option<Color32> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return None;
    }
    let n = u32::from_str_radix(digits, 16).ok()?;
    Some(Color32::from_rgb(
        ((n >> 16) & 0xff) as u8,
        ((n >> 8) & 0xff) as u8,
        (n & 0xff) as u8,
    ))
}

/// Accent color for a stored hex string, falling back to the default accent.
pub fn accent_or_default(hex: &str) -> Color32 {
    parse_hex(hex)
        .or_else(|| parse_hex(DEFAULT_ACCENT))
        .unwrap_or(Color32::from_rgb(0x3b, 0x82, 0xf6))
}

/// egui theme preference for a stored mode.
pub fn preference(mode: ThemeMode) -> ThemePreference {
    match mode {
        ThemeMode::Light => ThemePreference::Light,
        ThemeMode::Dark => ThemePreference::Dark,
        ThemeMode::System => ThemePreference::System,
    }
}

/// Tint selection and link colors of `visuals` with `accent`.
pub fn apply_accent(visuals: &mut Visuals, accent: Color32) {
    visuals.selection.bg_fill = accent;
    visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.hyperlink_color = accent;
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, accent);
    visuals.widgets.active.bg_fill = accent;
}

/// Apply the stored theme mode and accent to every egui style.
pub fn apply(ctx: &Context, mode: ThemeMode, accent_hex: &str) {
    let accent = accent_or_default(accent_hex);
    ctx.set_theme(preference(mode));
    ctx.all_styles_mut(|style| apply_accent(&mut style.visuals, accent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(parse_hex("#3B82F6"), Some(Color32::from_rgb(0x3b, 0x82, 0xf6)));
        assert_eq!(parse_hex("10b981"), Some(Color32::from_rgb(0x10, 0xb9, 0x81)));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(parse_hex(""), None);
        assert_eq!(parse_hex("#FFF"), None);
        assert_eq!(parse_hex("#GG0000"), None);
        assert_eq!(parse_hex("#1234567"), None);
    }

    #[test]
    fn every_palette_entry_parses_and_is_unique() {
        for (name, hex) in ACCENT_PALETTE {
            assert!(parse_hex(hex).is_some(), "{name} has a bad hex {hex}");
        }
        let mut hexes: Vec<_> = ACCENT_PALETTE.iter().map(|(_, h)| *h).collect();
        hexes.sort_unstable();
        hexes.dedup();
        assert_eq!(hexes.len(), ACCENT_PALETTE.len());
    }

    #[test]
    fn bad_stored_accent_uses_default() {
        assert_eq!(accent_or_default("nope"), parse_hex(DEFAULT_ACCENT).unwrap());
        assert_eq!(
            accent_or_default("#EF4444"),
            Color32::from_rgb(0xef, 0x44, 0x44)
        );
    }

    #[test]
    fn accent_tints_selection() {
        let mut v = Visuals::dark();
        let accent = Color32::from_rgb(1, 2, 3);
        apply_accent(&mut v, accent);
        assert_eq!(v.selection.bg_fill, accent);
        assert_eq!(v.hyperlink_color, accent);
    }

    #[test]
    fn modes_map_to_preferences() {
        assert_eq!(preference(ThemeMode::Light), ThemePreference::Light);
        assert_eq!(preference(ThemeMode::Dark), ThemePreference::Dark);
        assert_eq!(preference(ThemeMode::System), ThemePreference::System);
    }
}
