use std::path::Path;

use image::RgbaImage;
use uuid::Uuid;

use crate::canvas::{PixelSurface, Surface};
use crate::components::history::HistoryManager;
use crate::components::tools::{Tool, ToolSettings};
use crate::io::{self, IoError};
use crate::ops::brush::stroke_segment;
use crate::ops::filters::ConvolutionEngine;
use crate::settings::AppSettings;

/// One drawing session: a surface, its history and the active tool.
///
/// This is the driver a UI layer talks to.  Pointer input is serialized
/// by the caller; each completed stroke produces exactly one checkpoint.
pub struct Session {
    pub id: Uuid,
    surface: PixelSurface,
    history: HistoryManager,
    engine: ConvolutionEngine,
    tools: ToolSettings,
    /// Last pointer position while a stroke is in progress.
    stroke_last: Option<(f32, f32)>,
    is_dirty: bool,
}

impl Session {
    /// Blank session with default settings.
    pub fn new(width: u32, height: u32) -> Self {
        let settings = AppSettings {
            canvas_width: width,
            canvas_height: height,
            ..AppSettings::default()
        };
        Self::with_settings(&settings)
    }

    /// Blank canvas of the configured size, baseline already recorded.
    pub fn with_settings(settings: &AppSettings) -> Self {
        let surface = PixelSurface::new(settings.canvas_width, settings.canvas_height);
        let mut history = HistoryManager::new(settings.max_history_length);
        history.clear_history(&surface);

        let mut tools = ToolSettings::default();
        tools.set_size(settings.brush_size);
        tools.set_color(settings.brush_color);

        let session = Self {
            id: Uuid::new_v4(),
            surface,
            history,
            engine: ConvolutionEngine::new(settings.kernel()).with_parallel(settings.parallel_blur),
            tools,
            stroke_last: None,
            is_dirty: false,
        };
        crate::logger::set_session(&session.id.to_string());
        log_info!(
            "Session {} started ({}x{}, kernel {} / sigma {}, history {})",
            session.id,
            settings.canvas_width,
            settings.canvas_height,
            settings.kernel_size,
            settings.kernel_sigma,
            settings.max_history_length
        );
        session
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolSettings {
        &mut self.tools
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke_last.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    // ---- pointer input ------------------------------------------------------

    /// Start a stroke and apply the tool once at the press position.
    /// Ignored while a stroke is already in progress.
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if self.stroke_last.is_some() {
            return;
        }
        self.stroke_last = Some((x, y));
        self.apply_tool((x, y), (x, y));
    }

    /// Continue the stroke.  Moves without a press are hover and do nothing.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let Some(last) = self.stroke_last else { return };
        self.apply_tool(last, (x, y));
        self.stroke_last = Some((x, y));
    }

    /// Finish the stroke and checkpoint it.
    pub fn pointer_up(&mut self) {
        if self.stroke_last.take().is_some() {
            self.history.checkpoint(&self.surface);
        }
    }

    fn apply_tool(&mut self, from: (f32, f32), to: (f32, f32)) {
        let changed = match self.tools.tool() {
            Tool::Brush => {
                stroke_segment(&mut self.surface, from, to, self.tools.size(), self.tools.color())
                    .is_some()
            }
            Tool::Blur => self
                .engine
                .apply_circular_blur(
                    &mut self.surface,
                    to.0.floor() as i32,
                    to.1.floor() as i32,
                    self.tools.size() as i32,
                )
                .is_some(),
        };
        self.is_dirty |= changed;
    }

    // ---- history ------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        if self.is_drawing() {
            return false;
        }
        let undone = self.history.undo(&mut self.surface);
        self.is_dirty |= undone;
        undone
    }

    pub fn redo(&mut self) -> bool {
        if self.is_drawing() {
            return false;
        }
        let redone = self.history.redo(&mut self.surface);
        self.is_dirty |= redone;
        redone
    }

    /// Resize the canvas (contents are discarded) and start a fresh history.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.stroke_last = None;
        self.surface.resize(width, height);
        self.history.clear_history(&self.surface);
        log_info!("Session {} resized to {}x{}", self.id, width, height);
    }

    /// Erase the canvas as one undoable step.
    pub fn clear(&mut self) {
        self.stroke_last = None;
        self.surface.clear();
        self.history.checkpoint(&self.surface);
        self.is_dirty = true;
    }

    // ---- import / export ----------------------------------------------------

    /// Replace the canvas contents with `img` fitted and centred, as one
    /// undoable step.
    pub fn import_rgba(&mut self, img: &RgbaImage) -> bool {
        self.stroke_last = None;
        if !io::draw_image_fitted(&mut self.surface, img) {
            return false;
        }
        self.history.checkpoint(&self.surface);
        self.is_dirty = true;
        true
    }

    pub fn import_image(&mut self, path: &Path) -> Result<(), IoError> {
        let img = io::decode_image(path).inspect_err(|e| {
            log_warn!("Import of {} failed: {}", path.display(), e);
        })?;
        if !self.import_rgba(&img) {
            return Err(IoError::Dimensions {
                width: self.surface.width(),
                height: self.surface.height(),
            });
        }
        log_info!(
            "Imported {} ({}x{}) into {}x{} canvas",
            path.display(),
            img.width(),
            img.height(),
            self.surface.width(),
            self.surface.height()
        );
        Ok(())
    }

    pub fn export_png(&mut self, path: &Path) -> Result<(), IoError> {
        match io::export_png(&self.surface, path) {
            Ok(()) => {
                log_info!("Exported {}", path.display());
                self.is_dirty = false;
                Ok(())
            }
            Err(e) => {
                log_err!("Export to {} failed: {}", path.display(), e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn new_session_has_a_blank_baseline() {
        let session = Session::new(8, 6);
        assert_eq!(session.history().undo_count(), 1);
        assert!(session.surface().as_raw().iter().all(|&b| b == 0));
        assert!(!session.is_dirty());
    }

    #[test]
    fn one_checkpoint_per_stroke() {
        let mut session = Session::new(20, 20);
        session.pointer_down(2.0, 2.0);
        for i in 3..15 {
            session.pointer_move(i as f32, i as f32);
        }
        assert_eq!(session.history().undo_count(), 1);
        session.pointer_up();
        assert_eq!(session.history().undo_count(), 2);
        assert!(session.is_dirty());
    }

    #[test]
    fn hover_and_stray_release_do_nothing() {
        let mut session = Session::new(10, 10);
        session.pointer_move(5.0, 5.0);
        session.pointer_up();
        assert_eq!(session.history().undo_count(), 1);
        assert!(session.surface().as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn undo_is_refused_mid_stroke() {
        let mut session = Session::new(10, 10);
        session.pointer_down(5.0, 5.0);
        session.pointer_up();
        session.pointer_down(1.0, 1.0);
        assert!(!session.undo());
        session.pointer_up();
        assert!(session.undo());
    }

    #[test]
    fn blur_tool_softens_an_edge() {
        let mut session = Session::new(16, 16);
        session.tools_mut().set_color(Rgba([255, 255, 255, 255]));
        session.tools_mut().set_size(16);
        // A white disk reaching just short of (8, 8).
        session.pointer_down(0.0, 8.0);
        session.pointer_up();
        let edge_before = session.surface().get_pixel(8, 8);

        session.tools_mut().set_tool(Tool::Blur);
        session.tools_mut().set_size(4);
        session.pointer_down(8.0, 8.0);
        session.pointer_up();
        assert_ne!(session.surface().get_pixel(8, 8), edge_before);
        assert_eq!(session.history().undo_count(), 3);
    }

    #[test]
    fn resize_resets_history() {
        let mut session = Session::new(4, 4);
        session.pointer_down(1.0, 1.0);
        session.pointer_up();
        session.resize(6, 3);
        assert_eq!((session.surface().width(), session.surface().height()), (6, 3));
        assert_eq!(session.history().undo_count(), 1);
        assert!(!session.undo());
    }

    #[test]
    fn clear_is_undoable() {
        let mut session = Session::new(6, 6);
        session.pointer_down(3.0, 3.0);
        session.pointer_up();
        let drawn = session.surface().get_full();
        session.clear();
        assert!(session.surface().as_raw().iter().all(|&b| b == 0));
        assert!(session.undo());
        assert_eq!(session.surface().get_full(), drawn);
    }
}
