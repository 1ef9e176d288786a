use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ColorType, ImageEncoder, ImageError, RgbaImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::canvas::{PixelSurface, Surface};

/// Error type for raster import/export.
#[derive(Debug)]
pub enum IoError {
    Io(std::io::Error),
    Image(ImageError),
    /// The decoded image has no pixels.
    EmptyImage,
    /// The surface has no pixels to export.
    Dimensions { width: u32, height: u32 },
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::Io(e) => write!(f, "I/O error: {}", e),
            IoError::Image(e) => write!(f, "Image error: {}", e),
            IoError::EmptyImage => write!(f, "Image has no pixels"),
            IoError::Dimensions { width, height } => {
                write!(f, "Cannot export a {}x{} surface", width, height)
            }
        }
    }
}

impl std::error::Error for IoError {}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Io(e)
    }
}

impl From<ImageError> for IoError {
    fn from(e: ImageError) -> Self {
        IoError::Image(e)
    }
}

/// `<name>.png` in the current directory.
pub fn default_export_path(name: &str) -> PathBuf {
    PathBuf::from(format!("{}.png", name))
}

// ============================================================================
// IMPORT
// ============================================================================

/// Decode any raster format the `image` crate supports to RGBA8.
pub fn decode_image(path: &Path) -> Result<RgbaImage, IoError> {
    let img = image::open(path)?.to_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(IoError::EmptyImage);
    }
    Ok(img)
}

/// Where an `img_w × img_h` image lands when fitted into the canvas:
/// uniformly scaled by `min(cw / iw, ch / ih)` and centred.
/// Returns `(x, y, width, height)` in canvas pixels.
pub fn fit_rect(img_w: u32, img_h: u32, canvas_w: u32, canvas_h: u32) -> (i32, i32, u32, u32) {
    let scale = (canvas_w as f32 / img_w as f32).min(canvas_h as f32 / img_h as f32);
    let w = (img_w as f32 * scale).round().max(1.0);
    let h = (img_h as f32 * scale).round().max(1.0);
    let x = ((canvas_w as f32 - w) / 2.0).round() as i32;
    let y = ((canvas_h as f32 - h) / 2.0).round() as i32;
    (x, y, w as u32, h as u32)
}

/// Clear the surface and draw `img` scaled to fit, aspect ratio preserved,
/// centred.  Returns `false` if either side has no pixels.
pub fn draw_image_fitted(surface: &mut PixelSurface, img: &RgbaImage) -> bool {
    if !surface.is_ready() || img.width() == 0 || img.height() == 0 {
        return false;
    }
    surface.clear();
    let (x, y, w, h) = fit_rect(img.width(), img.height(), surface.width(), surface.height());
    if (w, h) == img.dimensions() {
        surface.put_region(x, y, w, h, img.as_raw());
    } else {
        let scaled = image::imageops::resize(img, w, h, FilterType::Triangle);
        surface.put_region(x, y, w, h, scaled.as_raw());
    }
    true
}

/// Decode `path` and draw it onto the surface with [`draw_image_fitted`].
pub fn load_image_fitted(surface: &mut PixelSurface, path: &Path) -> Result<(), IoError> {
    let img = decode_image(path)?;
    if !draw_image_fitted(surface, &img) {
        return Err(IoError::Dimensions {
            width: surface.width(),
            height: surface.height(),
        });
    }
    Ok(())
}

// ============================================================================
// EXPORT
// ============================================================================

/// Encode the full surface as an RGBA8 PNG into `writer`.
pub fn write_png<W: Write>(surface: &PixelSurface, writer: W) -> Result<(), IoError> {
    if !surface.is_ready() {
        return Err(IoError::Dimensions {
            width: surface.width(),
            height: surface.height(),
        });
    }
    let encoder = PngEncoder::new(writer);
    encoder.write_image(surface.as_raw(), surface.width(), surface.height(), ColorType::Rgba8)?;
    Ok(())
}

/// Write the full surface to `path` as PNG.
pub fn export_png(surface: &PixelSurface, path: &Path) -> Result<(), IoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_png(surface, &mut writer)?;
    writer.flush()?;
    Ok(())
}
