//! Short-lived pin/unpin confirmation shown in the middle of the screen.

use std::time::{Duration, Instant};

/// What the toast is confirming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// A window was pinned.
    Pinned,
    /// A window was unpinned.
    Unpinned,
}

impl ToastKind {
    /// Glyph drawn in the toast.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Pinned => "📌",
            Self::Unpinned => "⊘",
        }
    }
}

/// One visible toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Kind of confirmation.
    pub kind: ToastKind,
    /// Name of the application involved.
    pub app: String,
    /// When the toast disappears.
    until: Instant,
}

/// Holds at most one toast; a new one replaces the old.
#[derive(Debug)]
pub struct Toasts {
    /// How long a toast stays visible.
    lifetime: Duration,
    /// The current toast, if any.
    current: Option<Toast>,
}

impl Toasts {
    /// Toasts that stay visible for `lifetime`.
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            current: None,
        }
    }

    /// Show a toast, replacing any visible one.
    pub fn show(&mut self, kind: ToastKind, app: impl Into<String>, now: Instant) {
        self.current = Some(Toast {
            kind,
            app: app.into(),
            until: now + self.lifetime,
        });
    }

    /// The visible toast at `now`, dropping it once expired.
    pub fn current(&mut self, now: Instant) -> Option<&Toast> {
        if self.current.as_ref().is_some_and(|t| now >= t.until) {
            self.current = None;
        }
        self.current.as_ref()
    }

    /// When the visible toast expires.
    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|t| t.until)
    }
}

#[cfg(target_os = "macos")]
mod render {
    use egui::{
        Align2, CentralPanel, Color32, Context, CornerRadius, FontId, Frame, ViewportBuilder,
        ViewportCommand, ViewportId, vec2,
    };

    use super::Toast;

    /// Side length of the square toast window.
    const SIZE: f32 = 96.0;

    /// Draw `toast`, or hide the toast viewport when there is none.
    pub fn render(ctx: &Context, toast: Option<&Toast>, accent: Color32) {
        let id = ViewportId::from_hash_of("topmost_toast");
        let Some(toast) = toast else {
            ctx.send_viewport_cmd_to(id, ViewportCommand::Visible(false));
            return;
        };
        let builder = ViewportBuilder::default()
            .with_title("topmost")
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_mouse_passthrough(true)
            .with_has_shadow(false)
            .with_taskbar(false)
            .with_resizable(false)
            .with_visible(true)
            .with_inner_size(vec2(SIZE, SIZE));
        ctx.show_viewport_immediate(id, builder, |vctx, _| {
            let frame = Frame::NONE
                .fill(Color32::from_black_alpha(200))
                .corner_radius(CornerRadius::same(18));
            CentralPanel::default().frame(frame).show(vctx, |ui| {
                let rect = ui.max_rect();
                let painter = ui.painter();
                painter.text(
                    rect.center() - vec2(0.0, 10.0),
                    Align2::CENTER_CENTER,
                    toast.kind.glyph(),
                    FontId::proportional(34.0),
                    accent,
                );
                painter.text(
                    rect.center_bottom() - vec2(0.0, 16.0),
                    Align2::CENTER_CENTER,
                    &toast.app,
                    FontId::proportional(11.0),
                    Color32::WHITE,
                );
            });
        });
    }
}

#[cfg(target_os = "macos")]
pub use render::render;
