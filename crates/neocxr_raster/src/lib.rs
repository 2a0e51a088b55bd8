//! Software raster backend for NEOCXR frames.
//!
//! Wraps a tiny-skia pixmap with the handful of primitives the viewer
//! compositor needs: a base layer blit, anti-aliased strokes with optional
//! dashes, filled circles and PNG output.

mod error;
mod painter;

pub use error::{RasterError, Result};
pub use painter::{Painter, StrokeStyle};
