// ============================================================================
// BlurPad CLI — headless drawing sessions driven by command-line actions
// ============================================================================
//
// Usage examples:
//   blurpad --width 256 --height 256 "stroke 10,10 200,120" -o line.png
//   blurpad -i photo.png "blur 40,40 60,60 80,80" "undo" "redo" -o soft.png
//   blurpad -i photo.png --set kernel_sigma=2 "size 12" "blur 100,100"
//
// Each action is one argument.  A `stroke` or `blur` action is a complete
// press / drag / release and therefore one undo step.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Instant;

use clap::Parser;
use image::Rgba;

use crate::canvas::Surface;
use crate::components::tools::Tool;
use crate::io::{decode_image, default_export_path};
use crate::ops::brush::parse_hex_color;
use crate::project::Session;
use crate::settings::AppSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// BlurPad headless drawing surface.
///
/// Replays brush / blur strokes and undo / redo steps on a canvas and
/// exports the result as PNG.
#[derive(Parser, Debug)]
#[command(
    name = "blurpad",
    about = "BlurPad headless drawing surface",
    long_about = "Replay brush and blur strokes on a canvas and export it as PNG.\n\n\
                  Actions (one per argument):\n  \
                  tool brush|blur     select the tool\n  \
                  color #RRGGBB       brush colour\n  \
                  size N              brush width / blur radius\n  \
                  stroke X,Y X,Y ...  press, drag through the points, release\n  \
                  blur X,Y ...        select the blur tool, then stroke\n  \
                  undo | redo | clear\n  \
                  resize W H          resize the canvas and reset history"
)]
pub struct CliArgs {
    /// Image to import. The canvas takes its size unless --width/--height are given.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output PNG path (default: <export_name>.png from the settings).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Canvas width in pixels.
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Canvas height in pixels.
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Settings file to use instead of the per-user one.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override a setting, e.g. --set kernel_sigma=2.5 (repeatable).
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Compute blur windows on all cores.
    #[arg(long)]
    pub parallel: bool,

    /// Write the session log here instead of the data directory.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Print each action and timing information.
    #[arg(short, long)]
    pub verbose: bool,

    /// Actions to replay, in order.
    #[arg(value_name = "ACTION")]
    pub actions: Vec<Action>,
}

// ============================================================================
// Actions
// ============================================================================

/// One scripted interaction.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Tool(Tool),
    Color(Rgba<u8>),
    Size(u32),
    /// Press at the first point, drag through the rest, release.
    Stroke(Vec<(f32, f32)>),
    /// `Tool(Blur)` followed by `Stroke`.
    Blur(Vec<(f32, f32)>),
    Undo,
    Redo,
    Clear,
    Resize(u32, u32),
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| "empty action".to_string())?
            .to_lowercase();
        let rest: Vec<&str> = words.collect();

        let action = match verb.as_str() {
            "tool" => {
                let name = single(&verb, &rest)?;
                Action::Tool(Tool::from_name(name).ok_or_else(|| format!("unknown tool '{}'", name))?)
            }
            "color" | "colour" => {
                let hex = single(&verb, &rest)?;
                Action::Color(parse_hex_color(hex).ok_or_else(|| format!("invalid colour '{}'", hex))?)
            }
            "size" => {
                let n = single(&verb, &rest)?;
                Action::Size(n.parse().map_err(|_| format!("invalid size '{}'", n))?)
            }
            "stroke" => Action::Stroke(parse_points(&verb, &rest)?),
            "blur" => Action::Blur(parse_points(&verb, &rest)?),
            "undo" | "redo" | "clear" => {
                if !rest.is_empty() {
                    return Err(format!("'{}' takes no arguments", verb));
                }
                match verb.as_str() {
                    "undo" => Action::Undo,
                    "redo" => Action::Redo,
                    _ => Action::Clear,
                }
            }
            "resize" => {
                let [w, h] = rest.as_slice() else {
                    return Err("usage: resize W H".to_string());
                };
                let w = w.parse().map_err(|_| format!("invalid width '{}'", w))?;
                let h = h.parse().map_err(|_| format!("invalid height '{}'", h))?;
                Action::Resize(w, h)
            }
            _ => return Err(format!("unknown action '{}'", verb)),
        };
        Ok(action)
    }
}

fn single<'a>(verb: &str, rest: &[&'a str]) -> Result<&'a str, String> {
    match rest {
        [one] => Ok(one),
        _ => Err(format!("'{}' takes exactly one argument", verb)),
    }
}

fn parse_points(verb: &str, rest: &[&str]) -> Result<Vec<(f32, f32)>, String> {
    if rest.is_empty() {
        return Err(format!("'{}' needs at least one X,Y point", verb));
    }
    rest.iter()
        .map(|p| {
            let (x, y) = p
                .split_once(',')
                .ok_or_else(|| format!("point '{}' is not X,Y", p))?;
            let x: f32 = x.trim().parse().map_err(|_| format!("invalid x in '{}'", p))?;
            let y: f32 = y.trim().parse().map_err(|_| format!("invalid y in '{}'", p))?;
            if !x.is_finite() || !y.is_finite() {
                return Err(format!("point '{}' is not finite", p));
            }
            Ok((x, y))
        })
        .collect()
}

impl Action {
    /// Apply to the session.  Returns `false` for undo / redo that had
    /// nothing to do.
    pub fn apply(&self, session: &mut Session) -> bool {
        match self {
            Action::Tool(tool) => session.tools_mut().set_tool(*tool),
            Action::Color(color) => session.tools_mut().set_color(*color),
            Action::Size(size) => session.tools_mut().set_size(*size),
            Action::Stroke(points) => replay_stroke(session, points),
            Action::Blur(points) => {
                session.tools_mut().set_tool(Tool::Blur);
                replay_stroke(session, points);
            }
            Action::Undo => return session.undo(),
            Action::Redo => return session.redo(),
            Action::Clear => session.clear(),
            Action::Resize(w, h) => session.resize(*w, *h),
        }
        true
    }
}

fn replay_stroke(session: &mut Session, points: &[(f32, f32)]) {
    let Some((&(x, y), rest)) = points.split_first() else { return };
    session.pointer_down(x, y);
    for &(x, y) in rest {
        session.pointer_move(x, y);
    }
    session.pointer_up();
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the session and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    match run_session(&args) {
        Ok(path) => {
            if args.verbose {
                println!("→ {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            log_err!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_session(args: &CliArgs) -> Result<PathBuf, String> {
    let start = Instant::now();
    let mut settings = resolve_settings(args)?;

    // -- Step 1: Canvas --------------------------------------------------
    let image = match &args.input {
        Some(path) => Some(
            decode_image(path).map_err(|e| format!("could not load '{}': {}", path.display(), e))?,
        ),
        None => None,
    };
    if let Some(img) = &image {
        settings.canvas_width = args.width.unwrap_or(img.width());
        settings.canvas_height = args.height.unwrap_or(img.height());
    }
    if settings.canvas_width == 0 || settings.canvas_height == 0 {
        return Err(format!(
            "canvas size {}x{} has no pixels",
            settings.canvas_width, settings.canvas_height
        ));
    }

    let mut session = Session::with_settings(&settings);
    if let Some(img) = &image {
        import_into(&mut session, img)?;
    }

    // -- Step 2: Actions -------------------------------------------------
    for (idx, action) in args.actions.iter().enumerate() {
        let applied = action.apply(&mut session);
        if args.verbose {
            let note = if applied { "" } else { " (nothing to do)" };
            println!("[{}/{}] {:?}{}", idx + 1, args.actions.len(), action, note);
        }
    }

    // -- Step 3: Export --------------------------------------------------
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_export_path(&settings.export_name));
    session
        .export_png(&output)
        .map_err(|e| format!("could not write '{}': {}", output.display(), e))?;

    if args.verbose {
        println!(
            "{} action(s), {} undo step(s) held, {:.0}ms",
            args.actions.len(),
            session.history().undo_count(),
            start.elapsed().as_secs_f64() * 1000.0
        );
    }
    Ok(output)
}

fn import_into(session: &mut Session, img: &image::RgbaImage) -> Result<(), String> {
    if session.import_rgba(img) {
        return Ok(());
    }
    Err(format!(
        "could not place a {}x{} image on a {}x{} canvas",
        img.width(),
        img.height(),
        session.surface().width(),
        session.surface().height()
    ))
}

/// File settings, then `--set` overrides, then the dedicated flags.
fn resolve_settings(args: &CliArgs) -> Result<AppSettings, String> {
    let mut settings = match &args.config {
        Some(path) => load_config(path)?,
        None => AppSettings::load(),
    };
    settings.apply_overrides(args.overrides.iter().map(String::as_str))?;
    if args.parallel {
        settings.parallel_blur = true;
    }
    if let Some(w) = args.width {
        settings.canvas_width = w;
    }
    if let Some(h) = args.height {
        settings.canvas_height = h;
    }
    Ok(settings)
}

fn load_config(path: &Path) -> Result<AppSettings, String> {
    AppSettings::load_from(path).map_err(|e| format!("config '{}': {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_action() {
        assert_eq!("tool blur".parse::<Action>(), Ok(Action::Tool(Tool::Blur)));
        assert_eq!("color #000000".parse::<Action>(), Ok(Action::Color(Rgba([0, 0, 0, 255]))));
        assert_eq!("size 7".parse::<Action>(), Ok(Action::Size(7)));
        assert_eq!(
            "stroke 1,2 3.5,4".parse::<Action>(),
            Ok(Action::Stroke(vec![(1.0, 2.0), (3.5, 4.0)]))
        );
        assert_eq!("blur 5,5".parse::<Action>(), Ok(Action::Blur(vec![(5.0, 5.0)])));
        assert_eq!("UNDO".parse::<Action>(), Ok(Action::Undo));
        assert_eq!("redo".parse::<Action>(), Ok(Action::Redo));
        assert_eq!("clear".parse::<Action>(), Ok(Action::Clear));
        assert_eq!("resize 10 20".parse::<Action>(), Ok(Action::Resize(10, 20)));
    }

    #[test]
    fn rejects_malformed_actions() {
        for bad in ["", "paint 1,1", "tool eraser", "size big", "stroke", "stroke 1;2", "undo 2", "resize 10", "blur nan,1"] {
            assert!(bad.parse::<Action>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn clap_accepts_actions_and_flags() {
        let args = CliArgs::try_parse_from([
            "blurpad",
            "--width",
            "32",
            "--height",
            "16",
            "--set",
            "kernel_size=5",
            "stroke 1,1 8,8",
            "undo",
        ])
        .unwrap();
        assert_eq!(args.width, Some(32));
        assert_eq!(args.actions.len(), 2);
        assert_eq!(args.actions[1], Action::Undo);

        assert!(CliArgs::try_parse_from(["blurpad", "wiggle"]).is_err());
    }

    #[test]
    fn import_onto_an_empty_canvas_is_an_error() {
        let img = image::RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255]));
        let mut empty = Session::new(0, 0);
        let err = import_into(&mut empty, &img).unwrap_err();
        assert!(err.contains("3x3 image on a 0x0 canvas"), "{err}");

        let mut session = Session::new(3, 3);
        assert!(import_into(&mut session, &img).is_ok());
        assert_eq!(session.surface().get_pixel(2, 2), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn blur_action_switches_tool() {
        let mut session = Session::new(16, 16);
        assert!(Action::Blur(vec![(8.0, 8.0)]).apply(&mut session));
        assert_eq!(session.tools().tool(), Tool::Blur);
        assert_eq!(session.history().undo_count(), 2);
        assert!(!Action::Redo.apply(&mut session));
    }
}
