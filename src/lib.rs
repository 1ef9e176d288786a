//! BlurPad: a raster drawing surface with a localized circular Gaussian
//! blur tool and bounded whole-surface undo / redo.
//!
//! The core pieces are [`ops::filters::ConvolutionEngine`] (blur),
//! [`components::history::HistoryManager`] (undo / redo) and the
//! [`canvas::Surface`] accessor they both talk to.  [`project::Session`]
//! ties them to pointer input the way an editor front end would.

#![allow(clippy::too_many_arguments)]

#[macro_use]
pub mod logger;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod io;
pub mod ops;
pub mod project;
pub mod settings;

pub use canvas::{PixelRect, PixelSurface, Surface};
pub use components::history::{HistoryManager, HistorySnapshot, MAX_HISTORY_LENGTH};
pub use ops::filters::{ConvolutionEngine, Kernel, build_gaussian_kernel};
pub use project::Session;
