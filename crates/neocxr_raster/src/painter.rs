//! CPU painter backed by a tiny-skia pixmap.

use std::path::Path;

use tiny_skia::{
    Color, ColorU8, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, StrokeDash,
    Transform,
};

use crate::error::{RasterError, Result};

/// How a polyline is stroked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// Line width in pixels
    pub width: f32,
    /// Straight (non-premultiplied) RGBA color
    pub color: [u8; 4],
    /// Round caps and joins instead of butt/miter
    pub round: bool,
    /// Dash pattern as (on, off) lengths
    pub dash: Option<[f32; 2]>,
    /// Connect the last point back to the first
    pub closed: bool,
}

impl StrokeStyle {
    pub fn new(width: f32, color: [u8; 4]) -> Self {
        Self {
            width,
            color,
            round: false,
            dash: None,
            closed: false,
        }
    }

    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    pub fn with_dash(mut self, on: f32, off: f32) -> Self {
        self.dash = Some([on, off]);
        self
    }

    pub fn with_closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }
}

fn paint_for(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

/// An RGBA drawing surface.
pub struct Painter {
    pixmap: Pixmap,
}

impl Painter {
    /// Create a transparent surface. Zero-sized surfaces are rejected.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(RasterError::InvalidSize { width, height })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Fill the whole surface with one color.
    pub fn clear(&mut self, color: [u8; 4]) {
        self.pixmap
            .fill(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    }

    /// Replace the surface contents with a straight-alpha RGBA buffer of the same size.
    pub fn blit_rgba(&mut self, data: &[u8]) -> Result<()> {
        let expected = self.width() as usize * self.height() as usize * 4;
        if data.len() != expected {
            return Err(RasterError::BufferSize {
                expected,
                found: data.len(),
            });
        }

        for (dst, src) in self.pixmap.pixels_mut().iter_mut().zip(data.chunks_exact(4)) {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }
        Ok(())
    }

    /// Stroke a sequence of points. A single point becomes a dot of the stroke width.
    pub fn stroke_polyline(&mut self, points: &[(f32, f32)], style: &StrokeStyle) {
        match points {
            [] => {}
            [(x, y)] => {
                if style.round {
                    self.fill_circle((*x, *y), style.width / 2.0, style.color);
                }
            }
            [(x0, y0), rest @ ..] => {
                let mut pb = PathBuilder::new();
                pb.move_to(*x0, *y0);
                for (x, y) in rest {
                    pb.line_to(*x, *y);
                }
                if style.closed {
                    pb.close();
                }
                let Some(path) = pb.finish() else {
                    log::trace!("Skipping degenerate path with {} points", points.len());
                    return;
                };

                let mut stroke = Stroke {
                    width: style.width.max(0.5),
                    ..Default::default()
                };
                if style.round {
                    stroke.line_cap = LineCap::Round;
                    stroke.line_join = LineJoin::Round;
                }
                if let Some([on, off]) = style.dash {
                    stroke.dash = StrokeDash::new(vec![on, off], 0.0);
                }

                self.pixmap.stroke_path(
                    &path,
                    &paint_for(style.color),
                    &stroke,
                    Transform::identity(),
                    None,
                );
            }
        }
    }

    pub fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: [u8; 4]) {
        let Some(path) = PathBuilder::from_circle(center.0, center.1, radius.max(0.5)) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint_for(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// Straight-alpha color at a pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RasterError::Encode(e.to_string()))
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.encode_png()?;
        std::fs::write(path.as_ref(), bytes)?;
        log::debug!(
            "Wrote {}x{} frame to {:?}",
            self.width(),
            self.height(),
            path.as_ref()
        );
        Ok(())
    }
}

impl std::fmt::Debug for Painter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Painter")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
