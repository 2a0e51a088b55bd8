//! Frame rendering.

mod canvas;
mod compositor;
mod pixmap;

pub use canvas::{Canvas, DisplayList, DrawCommand, LineStyle};
pub use compositor::{RenderCompositor, Scene};
pub use pixmap::PixmapCanvas;
