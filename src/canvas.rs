// ============================================================================
// PIXEL SURFACE — the RGBA buffer every tool reads from and writes to
// ============================================================================

use image::{Rgba, RgbaImage};

/// Bytes per RGBA pixel.  Region and snapshot buffers are tightly packed
/// rows of this many bytes per pixel, no padding.
pub const BYTES_PER_PIXEL: usize = 4;

const TRANSPARENT_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// An axis-aligned rectangle fully inside a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Intersect the rectangle `(x, y, w, h)` (which may start at negative
    /// coordinates or run past the far edges) with `0..bounds_w × 0..bounds_h`.
    /// Returns `None` when the intersection has zero area.
    pub fn clamped(x: i64, y: i64, w: i64, h: i64, bounds_w: u32, bounds_h: u32) -> Option<Self> {
        if w <= 0 || h <= 0 {
            return None;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(bounds_w as i64);
        let y1 = y.saturating_add(h).min(bounds_h as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn byte_len(&self) -> usize {
        self.area() * BYTES_PER_PIXEL
    }
}

// ============================================================================
// SURFACE CONTRACT
// ============================================================================

/// Accessor contract between the drawing core and whoever owns the pixels.
///
/// Region coordinates may be negative or run past the surface edges:
/// reads fill the outside part with transparent black, writes drop it.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// A zero-area surface (e.g. not sized yet) is treated as unavailable.
    fn is_ready(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    /// Read a `w × h` region into `buf`, resizing it to `w * h * 4` bytes.
    /// Reusing `buf` across calls avoids a fresh allocation per read.
    fn get_region_into(&self, x: i32, y: i32, w: u32, h: u32, buf: &mut Vec<u8>);

    /// Write a `w × h` region of tightly packed RGBA bytes at `(x, y)`.
    fn put_region(&mut self, x: i32, y: i32, w: u32, h: u32, data: &[u8]);

    /// Replace the whole buffer.  Returns `false` (and writes nothing) when
    /// `data` is not exactly `width * height * 4` bytes.
    fn put_full(&mut self, data: &[u8]) -> bool;

    fn get_region(&self, x: i32, y: i32, w: u32, h: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        self.get_region_into(x, y, w, h, &mut buf);
        buf
    }

    fn get_full(&self) -> Vec<u8> {
        self.get_region(0, 0, self.width(), self.height())
    }

    /// Clip a rectangle in surface space to the surface extent.
    fn clip_rect(&self, x: i64, y: i64, w: i64, h: i64) -> Option<PixelRect> {
        PixelRect::clamped(x, y, w, h, self.width(), self.height())
    }

    fn byte_len(&self) -> usize {
        self.width() as usize * self.height() as usize * BYTES_PER_PIXEL
    }
}

// ============================================================================
// PIXEL SURFACE — flat RgbaImage-backed implementation
// ============================================================================

/// Row-major RGBA8 surface, origin top-left.
#[derive(Clone, Debug)]
pub struct PixelSurface {
    image: RgbaImage,
}

impl Default for PixelSurface {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl PixelSurface {
    /// Create a fully transparent surface.  Zero dimensions are allowed and
    /// yield an unavailable surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self { image: RgbaImage::new(width, height) }
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn as_rgba_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba_image(self) -> RgbaImage {
        self.image
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Set every channel of every pixel to 0.
    pub fn clear(&mut self) {
        for b in self.image.iter_mut() {
            *b = 0;
        }
    }

    /// Resize the surface.  Like resizing a canvas element, the previous
    /// contents are discarded and the surface comes back transparent.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
    }

    /// Read a pixel; out-of-bounds reads return transparent black.
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        if x >= self.image.width() || y >= self.image.height() {
            return TRANSPARENT_PIXEL;
        }
        *self.image.get_pixel(x, y)
    }

    /// Write a pixel; out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) {
        if x >= self.image.width() || y >= self.image.height() {
            return;
        }
        self.image.put_pixel(x, y, pixel);
    }

    /// Fill the whole surface with one colour.
    pub fn fill(&mut self, color: Rgba<u8>) {
        for px in self.image.pixels_mut() {
            *px = color;
        }
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn get_region_into(&self, x: i32, y: i32, w: u32, h: u32, buf: &mut Vec<u8>) {
        let needed = w as usize * h as usize * BYTES_PER_PIXEL;
        buf.clear();
        // Outside pixels must read as transparent, so start from zeroes.
        buf.resize(needed, 0);

        let Some(clip) = self.clip_rect(x as i64, y as i64, w as i64, h as i64) else {
            return;
        };

        let src = self.image.as_raw();
        let src_stride = self.image.width() as usize * BYTES_PER_PIXEL;
        let dst_stride = w as usize * BYTES_PER_PIXEL;
        let run = clip.width as usize * BYTES_PER_PIXEL;
        let dx = (clip.x as i64 - x as i64) as usize;

        for row in 0..clip.height {
            let sy = (clip.y + row) as usize;
            let dy = (clip.y as i64 + row as i64 - y as i64) as usize;
            let src_start = sy * src_stride + clip.x as usize * BYTES_PER_PIXEL;
            let dst_start = dy * dst_stride + dx * BYTES_PER_PIXEL;
            buf[dst_start..dst_start + run].copy_from_slice(&src[src_start..src_start + run]);
        }
    }

    fn put_region(&mut self, x: i32, y: i32, w: u32, h: u32, data: &[u8]) {
        let needed = w as usize * h as usize * BYTES_PER_PIXEL;
        if data.len() < needed {
            log_warn!(
                "put_region: {} bytes supplied for a {}x{} region ({} expected), ignored",
                data.len(), w, h, needed
            );
            return;
        }

        let Some(clip) = self.clip_rect(x as i64, y as i64, w as i64, h as i64) else {
            return;
        };

        let dst_stride = self.image.width() as usize * BYTES_PER_PIXEL;
        let src_stride = w as usize * BYTES_PER_PIXEL;
        let run = clip.width as usize * BYTES_PER_PIXEL;
        let sx = (clip.x as i64 - x as i64) as usize;
        let dst = &mut *self.image;

        for row in 0..clip.height {
            let dy = (clip.y + row) as usize;
            let sy = (clip.y as i64 + row as i64 - y as i64) as usize;
            let dst_start = dy * dst_stride + clip.x as usize * BYTES_PER_PIXEL;
            let src_start = sy * src_stride + sx * BYTES_PER_PIXEL;
            dst[dst_start..dst_start + run].copy_from_slice(&data[src_start..src_start + run]);
        }
    }

    fn put_full(&mut self, data: &[u8]) -> bool {
        if data.len() != self.byte_len() {
            return false;
        }
        let dst: &mut [u8] = &mut self.image;
        dst.copy_from_slice(data);
        true
    }

    fn get_full(&self) -> Vec<u8> {
        self.image.as_raw().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(w: u32, h: u32) -> PixelSurface {
        let mut s = PixelSurface::new(w, h);
        for y in 0..h {
            for x in 0..w {
                s.put_pixel(x, y, Rgba([x as u8, y as u8, (x + y) as u8, 255]));
            }
        }
        s
    }

    #[test]
    fn clamped_rect_trims_negative_origin() {
        let r = PixelRect::clamped(-3, -2, 10, 10, 5, 5).unwrap();
        assert_eq!(r, PixelRect { x: 0, y: 0, width: 5, height: 5 });
    }

    #[test]
    fn clamped_rect_outside_is_none() {
        assert!(PixelRect::clamped(10, 10, 4, 4, 5, 5).is_none());
        assert!(PixelRect::clamped(-8, 0, 4, 4, 5, 5).is_none());
        assert!(PixelRect::clamped(0, 0, 0, 4, 5, 5).is_none());
    }

    #[test]
    fn region_read_pads_outside_with_transparent() {
        let s = numbered(4, 4);
        let region = s.get_region(-1, -1, 2, 2);
        assert_eq!(region.len(), 16);
        // Only the bottom-right pixel of the 2x2 read lies on the surface.
        assert_eq!(&region[0..12], &[0u8; 12]);
        assert_eq!(&region[12..16], &[0, 0, 0, 255]);
    }

    #[test]
    fn region_write_drops_outside_pixels() {
        let mut s = PixelSurface::new(3, 3);
        let data = vec![200u8; 4 * 4 * 4];
        s.put_region(1, 1, 4, 4, &data);
        assert_eq!(s.get_pixel(0, 0), TRANSPARENT_PIXEL);
        assert_eq!(s.get_pixel(1, 1), Rgba([200, 200, 200, 200]));
        assert_eq!(s.get_pixel(2, 2), Rgba([200, 200, 200, 200]));
    }

    #[test]
    fn region_round_trip_inside_bounds() {
        let s = numbered(6, 5);
        let region = s.get_region(2, 1, 3, 3);
        let mut t = PixelSurface::new(6, 5);
        t.put_region(2, 1, 3, 3, &region);
        assert_eq!(t.get_pixel(3, 2), s.get_pixel(3, 2));
        assert_eq!(t.get_pixel(1, 1), TRANSPARENT_PIXEL);
    }

    #[test]
    fn put_full_rejects_wrong_length() {
        let mut s = numbered(2, 2);
        let before = s.get_full();
        assert!(!s.put_full(&[1, 2, 3]));
        assert_eq!(s.get_full(), before);
        assert!(s.put_full(&[9u8; 16]));
        assert_eq!(s.get_pixel(1, 1), Rgba([9, 9, 9, 9]));
    }

    #[test]
    fn zero_sized_surface_is_not_ready() {
        let s = PixelSurface::default();
        assert!(!s.is_ready());
        assert!(s.get_full().is_empty());
    }
}
