//! Session logger — writes all log output to a single file in the OS data directory.
//!
//! The file is **truncated at each launch**, so it only ever holds output
//! from the most recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\BlurPad\blurpad.log`
//!   Linux:    `~/.local/share/BlurPad/blurpad.log`
//!   macOS:    `~/Library/Application Support/BlurPad/blurpad.log`
//!
//! Use the `log_info!` / `log_warn!` / `log_err!` macros anywhere in the
//! crate.  Until [`init`] (or [`init_at`]) has run, logging is a no-op, so
//! library users and tests need no setup.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
/// Id of the drawing session currently writing to the log.
static ACTIVE_SESSION: Mutex<Option<String>> = Mutex::new(None);

/// Returns the path to the current session log file.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Write a line to the session log.  Silently ignores I/O errors so that
/// logging never crashes the application.
pub fn write_line(line: &str) {
    if let Some(mutex) = LOG_FILE.get()
        && let Ok(mut file) = mutex.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

/// Write a timestamped, level-tagged line to the session log.
pub fn write(level: &str, msg: &str) {
    if LOG_FILE.get().is_none() {
        return;
    }
    let ts = timestamp();
    write_line(&format!("[{}] [{}] {}", ts, level, msg));
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::write("INFO", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::write("WARN", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::write("ERROR", &format!($($arg)*));
    };
}

/// Tag later log lines (and a panic report) with the drawing session id.
pub fn set_session(id: &str) {
    if let Ok(mut slot) = ACTIVE_SESSION.lock() {
        *slot = Some(id.to_string());
    }
}

fn active_session() -> Option<String> {
    ACTIVE_SESSION.lock().ok().and_then(|slot| slot.clone())
}

/// Initialise the session logger at the default location.
pub fn init() {
    init_at(&log_file_path());
}

/// Initialise the session logger at `path`.  Only the first call in a
/// process takes effect.
///
/// * Creates (or truncates) the log file.
/// * Installs a panic hook that writes the panic message to the log before
///   propagating to the previous handler.
pub fn init_at(path: &Path) {
    if LOG_FILE.get().is_some() {
        return;
    }

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path);

    match file {
        Ok(f) => {
            let _ = LOG_PATH.set(path.to_path_buf());
            let _ = LOG_FILE.set(Mutex::new(f));
        }
        Err(e) => {
            // Not fatal: the session simply runs without a log.
            eprintln!("[logger] Failed to open log file {:?}: {}", path, e);
            return;
        }
    }

    write_line(&header_line(path));
    write_line("");

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        write_line(&panic_line(active_session().as_deref(), &msg));
        prev(info);
    }));
}

fn header_line(path: &Path) -> String {
    format!(
        "=== BlurPad {} log opened {} (pid {}) -> {} ===",
        env!("CARGO_PKG_VERSION"),
        human_timestamp(),
        std::process::id(),
        path.display()
    )
}

fn panic_line(session: Option<&str>, msg: &str) -> String {
    match session {
        Some(id) => format!("[{}] [PANIC] session {}: {}", timestamp(), id, msg),
        None => format!("[{}] [PANIC] before any session: {}", timestamp(), msg),
    }
}

fn log_file_path() -> PathBuf {
    data_dir().join("BlurPad").join("blurpad.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

/// `HH:MM:SS` within the current UTC day.
fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let secs = d.as_secs();
            let h = (secs % 86400) / 3600;
            let m = (secs % 3600) / 60;
            let s = secs % 60;
            format!("{:02}:{:02}:{:02}", h, m, s)
        }
        Err(_) => "??:??:??".to_string(),
    }
}

fn human_timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => format!("(unix {})", d.as_secs()),
        Err(_) => "(unknown time)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_clock_shaped() {
        let ts = timestamp();
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.as_bytes()[2], b':');
        assert_eq!(ts.as_bytes()[5], b':');
    }

    #[test]
    fn header_names_version_and_file() {
        let line = header_line(Path::new("/tmp/blurpad-test.log"));
        assert!(line.contains(env!("CARGO_PKG_VERSION")));
        assert!(line.contains(&format!("pid {}", std::process::id())));
        assert!(line.ends_with("/tmp/blurpad-test.log ==="));
    }

    #[test]
    fn panic_line_carries_the_session_id() {
        let line = panic_line(Some("3f2a"), "boom");
        assert!(line.ends_with("[PANIC] session 3f2a: boom"));
        assert!(panic_line(None, "boom").ends_with("before any session: boom"));
    }

    #[test]
    fn default_log_path_ends_with_app_folder() {
        let path = log_file_path();
        assert!(path.ends_with("BlurPad/blurpad.log"));
    }
}
