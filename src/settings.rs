// ============================================================================
// SETTINGS — key=value configuration persisted in the platform config dir
// ============================================================================

use std::path::{Path, PathBuf};

use image::Rgba;

use crate::components::history::MAX_HISTORY_LENGTH;
use crate::components::tools::{DEFAULT_BRUSH_SIZE, DEFAULT_COLOR};
use crate::ops::brush::{format_hex_color, parse_hex_color};
use crate::ops::filters::{DEFAULT_KERNEL_SIGMA, DEFAULT_KERNEL_SIZE, Kernel};

const SETTINGS_FILE: &str = "blurpad_settings.cfg";

/// Errors from reading or writing a settings file.
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse { line: usize, message: String },
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "I/O error: {}", e),
            SettingsError::Parse { line, message } => write!(f, "line {}: {}", line, message),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

/// Settings that persist across sessions.
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Maximum number of undo checkpoints kept.
    pub max_history_length: usize,
    /// Blur kernel side length (odd, >= 3).
    pub kernel_size: usize,
    /// Blur kernel standard deviation (> 0).
    pub kernel_sigma: f32,
    /// Size of a new blank canvas.
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Initial tool size.
    pub brush_size: u32,
    /// Initial paint colour.
    pub brush_color: Rgba<u8>,
    /// Compute blur windows with rayon.
    pub parallel_blur: bool,
    /// File stem used when exporting without an explicit path.
    pub export_name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_history_length: MAX_HISTORY_LENGTH,
            kernel_size: DEFAULT_KERNEL_SIZE,
            kernel_sigma: DEFAULT_KERNEL_SIGMA,
            canvas_width: 800,
            canvas_height: 600,
            brush_size: DEFAULT_BRUSH_SIZE,
            brush_color: DEFAULT_COLOR,
            parallel_blur: false,
            export_name: "drawing".to_string(),
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/blurpad/blurpad_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\BlurPad\blurpad_settings.cfg
    /// On macOS:   ~/Library/Application Support/BlurPad/blurpad_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("BlurPad").join(SETTINGS_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("BlurPad")
                    .join(SETTINGS_FILE),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = match std::env::var("XDG_CONFIG_HOME") {
                Ok(dir) => PathBuf::from(dir),
                Err(_) => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
            };
            Some(config_dir.join("blurpad").join(SETTINGS_FILE))
        }
    }

    /// Load from the default location.  A missing or unreadable file gives
    /// the defaults; malformed lines keep the default for that key.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };

        let mut s = Self::default();
        for (idx, line) in content.lines().enumerate() {
            let Some((key, val)) = line.split_once('=') else { continue };
            if let Err(e) = s.set(key, val) {
                log_warn!("{}:{}: {}", path.display(), idx + 1, e);
            }
        }
        s
    }

    /// Load from `path`, reporting the first malformed line.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse `key=value` lines.  Blank lines, `#` comments and unknown keys
    /// are skipped.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let mut s = Self::default();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, val)) = trimmed.split_once('=') else {
                return Err(SettingsError::Parse {
                    line: idx + 1,
                    message: format!("expected key=value, got '{}'", trimmed),
                });
            };
            s.set(key, val)
                .map_err(|message| SettingsError::Parse { line: idx + 1, message })?;
        }
        Ok(s)
    }

    /// Apply `key=value` overrides (e.g. from the command line) on top of
    /// the current values.
    pub fn apply_overrides<'a, I>(&mut self, pairs: I) -> Result<(), String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for pair in pairs {
            let (key, val) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
            self.set(key, val)?;
        }
        Ok(())
    }

    /// Set one key.  Unknown keys are ignored.
    pub fn set(&mut self, key: &str, val: &str) -> Result<(), String> {
        let key = key.trim();
        let val = val.trim();
        match key {
            "max_history_length" => {
                let n: usize = parse_num(key, val)?;
                if n == 0 {
                    return Err("max_history_length must be at least 1".to_string());
                }
                self.max_history_length = n;
            }
            "kernel_size" => {
                let n: usize = parse_num(key, val)?;
                if n < 3 || n % 2 == 0 {
                    return Err(format!("kernel_size must be odd and >= 3, got {}", n));
                }
                self.kernel_size = n;
            }
            "kernel_sigma" => {
                let v: f32 = parse_num(key, val)?;
                if !v.is_finite() || v <= 0.0 {
                    return Err(format!("kernel_sigma must be positive, got {}", v));
                }
                self.kernel_sigma = v;
            }
            "canvas_width" => self.canvas_width = parse_num(key, val)?,
            "canvas_height" => self.canvas_height = parse_num(key, val)?,
            "brush_size" => self.brush_size = parse_num(key, val)?,
            "brush_color" => {
                self.brush_color =
                    parse_hex_color(val).ok_or_else(|| format!("invalid colour '{}'", val))?;
            }
            "parallel_blur" => {
                self.parallel_blur = match val {
                    "true" | "1" | "yes" => true,
                    "false" | "0" | "no" => false,
                    _ => return Err(format!("invalid boolean '{}' for {}", val, key)),
                };
            }
            "export_name" => {
                if val.is_empty() {
                    return Err("export_name must not be empty".to_string());
                }
                self.export_name = val.to_string();
            }
            _ => {}
        }
        Ok(())
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "max_history_length={}\n\
             kernel_size={}\n\
             kernel_sigma={}\n\
             canvas_width={}\n\
             canvas_height={}\n\
             brush_size={}\n\
             brush_color={}\n\
             parallel_blur={}\n\
             export_name={}\n",
            self.max_history_length,
            self.kernel_size,
            self.kernel_sigma,
            self.canvas_width,
            self.canvas_height,
            self.brush_size,
            format_hex_color(self.brush_color),
            self.parallel_blur,
            self.export_name,
        )
    }

    /// Save to the default location, ignoring failures.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            log_warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())?;
        Ok(())
    }

    /// The blur kernel these settings describe.
    pub fn kernel(&self) -> Kernel {
        Kernel::gaussian(self.kernel_size, self.kernel_sigma)
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, val: &str) -> Result<T, String> {
    val.parse::<T>()
        .map_err(|_| format!("invalid value '{}' for {}", val, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_text() {
        let s = AppSettings::default();
        assert_eq!(AppSettings::parse(&s.to_config_string()).unwrap(), s);
    }

    #[test]
    fn parse_reads_known_keys_and_skips_others() {
        let s = AppSettings::parse(
            "# comment\n\
             kernel_size=9\n\
             kernel_sigma=2.5\n\
             \n\
             brush_color=#35A4FF\n\
             theme=dark\n\
             parallel_blur=yes\n",
        )
        .unwrap();
        assert_eq!(s.kernel_size, 9);
        assert_eq!(s.kernel_sigma, 2.5);
        assert_eq!(s.brush_color, Rgba([0x35, 0xA4, 0xFF, 255]));
        assert!(s.parallel_blur);
        assert_eq!(s.max_history_length, MAX_HISTORY_LENGTH);
    }

    #[test]
    fn parse_reports_the_bad_line() {
        let err = AppSettings::parse("kernel_size=15\nkernel_size=8\n").unwrap_err();
        match err {
            SettingsError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(AppSettings::parse("kernel_sigma=-1").is_err());
        assert!(AppSettings::parse("max_history_length=0").is_err());
        assert!(AppSettings::parse("just words").is_err());
    }

    #[test]
    fn overrides_apply_in_order() {
        let mut s = AppSettings::default();
        s.apply_overrides(["canvas_width=64", "canvas_width=32", "export_name=out"])
            .unwrap();
        assert_eq!(s.canvas_width, 32);
        assert_eq!(s.export_name, "out");
        assert!(s.apply_overrides(["canvas_width"]).is_err());
    }

    #[test]
    fn save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let mut s = AppSettings::default();
        s.max_history_length = 12;
        s.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path).unwrap(), s);
    }

    #[test]
    fn kernel_follows_settings() {
        let mut s = AppSettings::default();
        s.kernel_size = 5;
        s.kernel_sigma = 1.0;
        let k = s.kernel();
        assert_eq!(k.size(), 5);
        assert!(k.is_normalized());
    }
}
