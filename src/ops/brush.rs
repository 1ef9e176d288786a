// ============================================================================
// BRUSH — round-capped line segments composited source-over
// ============================================================================

use image::Rgba;

use crate::canvas::{PixelRect, PixelSurface, Surface};

/// Paint a line of width `size` from `start` to `end` with round caps.
///
/// A pixel is covered when its centre lies within `size / 2` of the segment.
/// A zero-length segment paints a single round dot.  Returns the rectangle
/// that may have changed, or `None` when nothing on the surface was touched.
pub fn stroke_segment(
    surface: &mut PixelSurface,
    start: (f32, f32),
    end: (f32, f32),
    size: u32,
    color: Rgba<u8>,
) -> Option<PixelRect> {
    if size == 0 || color[3] == 0 {
        return None;
    }
    let half = size as f32 / 2.0;
    let (ax, ay) = start;
    let (bx, by) = end;

    let min_x = (ax.min(bx) - half).floor() as i64;
    let min_y = (ay.min(by) - half).floor() as i64;
    let max_x = (ax.max(bx) + half).ceil() as i64;
    let max_y = (ay.max(by) + half).ceil() as i64;
    let rect = surface.clip_rect(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)?;

    let mut touched = false;
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            if distance_to_segment(px, py, ax, ay, bx, by) <= half {
                let dst = surface.get_pixel(x, y);
                surface.put_pixel(x, y, blend_over(dst, color));
                touched = true;
            }
        }
    }
    touched.then_some(rect)
}

/// Euclidean distance from `(px, py)` to the segment `a`–`b`.
#[inline]
fn distance_to_segment(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = ax + t * dx;
    let cy = ay + t * dy;
    ((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt()
}

/// Unpremultiplied source-over.
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    if src[3] == 255 {
        return src;
    }
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
pub fn parse_hex_color(s: &str) -> Option<Rgba<u8>> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        6 => Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 255])),
        8 => Some(Rgba([channel(0)?, channel(2)?, channel(4)?, channel(6)?])),
        _ => None,
    }
}

/// Format as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
pub fn format_hex_color(c: Rgba<u8>) -> String {
    if c[3] == 255 {
        format!("#{:02X}{:02X}{:02X}", c[0], c[1], c[2])
    } else {
        format!("#{:02X}{:02X}{:02X}{:02X}", c[0], c[1], c[2], c[3])
    }
}
