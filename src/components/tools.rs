use image::Rgba;

use crate::ops::brush::{format_hex_color, parse_hex_color};

/// Colour swatches offered by the toolbar.
pub const PALETTE: [&str; 7] = [
    "#FF4C4C", "#FFE629", "#10F549", "#35A4FF", "#A467FF", "#000000", "#FFFFFF",
];

pub const DEFAULT_BRUSH_SIZE: u32 = 15;
pub const DEFAULT_COLOR: Rgba<u8> = Rgba([0xFF, 0x4C, 0x4C, 0xFF]);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    /// Paints round-capped lines; size is the line width.
    #[default]
    Brush,
    /// Gaussian-blurs a disk; size is the disk radius.
    Blur,
}

impl Tool {
    /// Inclusive size range the tool accepts.
    pub fn size_range(self) -> (u32, u32) {
        match self {
            Tool::Brush => (1, 100),
            Tool::Blur => (1, 20),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tool::Brush => "brush",
            Tool::Blur => "blur",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "brush" => Some(Tool::Brush),
            "blur" => Some(Tool::Blur),
            _ => None,
        }
    }
}

/// Tool / colour / size parameters supplied by the toolbar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolSettings {
    tool: Tool,
    size: u32,
    color: Rgba<u8>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: Tool::Brush,
            size: DEFAULT_BRUSH_SIZE,
            color: DEFAULT_COLOR,
        }
    }
}

impl ToolSettings {
    pub fn new(tool: Tool, size: u32, color: Rgba<u8>) -> Self {
        let mut settings = Self { tool, size, color };
        settings.set_size(size);
        settings
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    pub fn color_hex(&self) -> String {
        format_hex_color(self.color)
    }

    /// Switch tools, pulling the size into the new tool's range
    /// (e.g. a 60px brush becomes a 20px blur).
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.set_size(self.size);
    }

    pub fn set_size(&mut self, size: u32) {
        let (lo, hi) = self.tool.size_range();
        self.size = size.clamp(lo, hi);
    }

    pub fn set_color(&mut self, color: Rgba<u8>) {
        self.color = color;
    }

    /// Returns `false` and keeps the current colour if `hex` does not parse.
    pub fn set_color_hex(&mut self, hex: &str) -> bool {
        match parse_hex_color(hex) {
            Some(c) => {
                self.color = c;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_toolbar() {
        let s = ToolSettings::default();
        assert_eq!(s.tool(), Tool::Brush);
        assert_eq!(s.size(), 15);
        assert_eq!(s.color_hex(), PALETTE[0]);
    }

    #[test]
    fn switching_to_blur_clamps_size() {
        let mut s = ToolSettings::default();
        s.set_size(60);
        assert_eq!(s.size(), 60);
        s.set_tool(Tool::Blur);
        assert_eq!(s.size(), 20);
        s.set_tool(Tool::Brush);
        assert_eq!(s.size(), 20);
    }

    #[test]
    fn size_is_kept_in_range() {
        let mut s = ToolSettings::default();
        s.set_size(0);
        assert_eq!(s.size(), 1);
        s.set_size(1000);
        assert_eq!(s.size(), 100);
    }

    #[test]
    fn palette_entries_parse() {
        for hex in PALETTE {
            assert!(parse_hex_color(hex).is_some(), "{hex}");
        }
        let mut s = ToolSettings::default();
        assert!(!s.set_color_hex("nope"));
        assert!(s.set_color_hex("#35A4FF"));
        assert_eq!(s.color(), Rgba([0x35, 0xA4, 0xFF, 0xFF]));
    }

    #[test]
    fn tool_names_round_trip() {
        assert_eq!(Tool::from_name("BLUR"), Some(Tool::Blur));
        assert_eq!(Tool::from_name(Tool::Brush.name()), Some(Tool::Brush));
        assert_eq!(Tool::from_name("eraser"), None);
    }
}
