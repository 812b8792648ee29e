//! Procedural status-bar glyph rendered as template RGBA.

/// Edge length of the status-bar icon in pixels.
pub const ICON_SIZE: u32 = 22;

/// Alpha coverage of a pixel centre for a ring or disc.
fn coverage(d: f32, outer: f32, inner: f32) -> u8 {
    // One-pixel antialiased edges on both rims.
    let outside = (d - outer).clamp(0.0, 1.0);
    let inside = (inner - d).clamp(0.0, 1.0);
    ((1.0 - outside.max(inside)) * 255.0).round() as u8
}

/// Black-on-transparent pin glyph: a ring when unpinned, a ring with a solid
/// centre when pinned. macOS tints template images for light and dark bars.
pub fn glyph_rgba(pinned: bool, size: u32) -> Vec<u8> {
    let c = size as f32 / 2.0;
    let outer = c - 2.0;
    let ring_inner = outer - 2.0;
    let dot = outer * 0.45;
    let mut out = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - c;
            let dy = y as f32 + 0.5 - c;
            let d = (dx * dx + dy * dy).sqrt();
            let ring = coverage(d, outer, ring_inner);
            let a = if pinned {
                ring.max(coverage(d, dot, -1.0))
            } else {
                ring
            };
            out.extend_from_slice(&[0, 0, 0, a]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(px: &[u8], size: u32, x: u32, y: u32) -> u8 {
        px[((y * size + x) * 4 + 3) as usize]
    }

    #[test]
    fn buffer_is_rgba_sized() {
        assert_eq!(glyph_rgba(true, ICON_SIZE).len(), (ICON_SIZE * ICON_SIZE * 4) as usize);
    }

    #[test]
    fn centre_filled_only_when_pinned() {
        let mid = ICON_SIZE / 2;
        assert_eq!(alpha(&glyph_rgba(true, ICON_SIZE), ICON_SIZE, mid, mid), 255);
        assert_eq!(alpha(&glyph_rgba(false, ICON_SIZE), ICON_SIZE, mid, mid), 0);
    }

    #[test]
    fn corners_transparent() {
        for pinned in [true, false] {
            let px = glyph_rgba(pinned, ICON_SIZE);
            assert_eq!(alpha(&px, ICON_SIZE, 0, 0), 0);
            assert_eq!(alpha(&px, ICON_SIZE, ICON_SIZE - 1, ICON_SIZE - 1), 0);
        }
    }
}
