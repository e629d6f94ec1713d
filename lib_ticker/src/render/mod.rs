//! # Rendering
//!
//! Pixels from decisions. Nothing in this module performs I/O or blocks.
//!
//! ## Core Components:
//!
//! - **`frame`**: the fixed-size RGB buffer and the final brightness transform.
//! - **`font`** and **`text`**: the 5x7 micro font and coloured text lines.
//! - **`scroll`**: seamless, modular horizontal scrolling.
//! - **`compositor`**: the draw contract and the per-frame pipeline.
//! - **`modes`**: one renderer per display mode.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Frame composition.
pub mod compositor;
/// Micro font.
pub mod font;
/// Value formatting.
pub mod format;
/// Pixel buffer.
pub mod frame;
/// Mode renderers.
pub mod modes;
/// Named colours.
pub mod palette;
/// Scroll phase.
pub mod scroll;
/// Text lines.
pub mod text;

pub use compositor::{Compositor, DrawContext, DrawMode, Lane, Phases, Row};
pub use frame::{Frame, Rgb};
pub use scroll::ScrollPhase;
pub use text::{Line, Piece};
