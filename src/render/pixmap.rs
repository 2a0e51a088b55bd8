//! [`Canvas`] backed by the `neocxr_raster` CPU painter.

use std::f32::consts::TAU;
use std::path::Path;

use image::RgbaImage;
use neocxr_raster::{Painter, RasterError, StrokeStyle};

use crate::constants::PLACEHOLDER_COLOR;
use crate::geometry::Point;

use super::canvas::{Canvas, LineStyle};

/// Busy ring drawn on the placeholder.
const RING_COLOR: [u8; 4] = [120, 120, 130, 255];
const RING_SEGMENTS: usize = 48;

fn to_tuple(p: &Point) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

fn to_stroke_style(style: &LineStyle) -> StrokeStyle {
    let mut out = StrokeStyle::new(style.width, style.color)
        .with_round(style.round)
        .with_closed(style.closed);
    if let Some([on, off]) = style.dash {
        out = out.with_dash(on, off);
    }
    out
}

/// Paints frames into an RGBA pixmap.
#[derive(Debug)]
pub struct PixmapCanvas {
    painter: Painter,
}

impl PixmapCanvas {
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        Ok(Self {
            painter: Painter::new(width, height)?,
        })
    }

    /// Straight-alpha color at a pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.painter.pixel(x, y)
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        self.painter.encode_png()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), RasterError> {
        self.painter.save_png(path)
    }
}

impl Canvas for PixmapCanvas {
    fn size(&self) -> (u32, u32) {
        (self.painter.width(), self.painter.height())
    }

    fn clear(&mut self, color: [u8; 4]) {
        self.painter.clear(color);
    }

    fn draw_base_layer(&mut self, layer: &RgbaImage) {
        if let Err(e) = self.painter.blit_rgba(layer.as_raw()) {
            log::warn!("Base layer not drawn: {}", e);
        }
    }

    fn stroke_polyline(&mut self, points: &[Point], style: &LineStyle) {
        let points: Vec<(f32, f32)> = points.iter().map(to_tuple).collect();
        self.painter
            .stroke_polyline(&points, &to_stroke_style(style));
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: [u8; 4]) {
        self.painter.fill_circle(to_tuple(&center), radius, color);
    }

    fn draw_placeholder(&mut self, message: &str) {
        log::debug!("⏳ Placeholder: {}", message);
        self.painter.clear(PLACEHOLDER_COLOR);

        let (w, h) = self.size();
        let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
        let r = (w.min(h) as f32 / 8.0).max(4.0);
        let ring: Vec<(f32, f32)> = (0..RING_SEGMENTS)
            .map(|i| {
                let a = i as f32 / RING_SEGMENTS as f32 * TAU;
                (cx + r * a.cos(), cy + r * a.sin())
            })
            .collect();
        let style = StrokeStyle::new((r / 4.0).max(1.0), RING_COLOR)
            .with_dash(r / 2.0, r / 4.0)
            .with_closed(true);
        self.painter.stroke_polyline(&ring, &style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BACKGROUND_COLOR;

    #[test]
    fn test_base_layer_is_blitted() {
        let mut canvas = PixmapCanvas::new(2, 2).unwrap();
        let layer = RgbaImage::from_pixel(2, 2, image::Rgba([50, 50, 50, 255]));
        canvas.draw_base_layer(&layer);
        assert_eq!(canvas.pixel(1, 1), Some([50, 50, 50, 255]));
    }

    #[test]
    fn test_mismatched_layer_is_skipped() {
        let mut canvas = PixmapCanvas::new(4, 4).unwrap();
        canvas.clear(BACKGROUND_COLOR);
        canvas.draw_base_layer(&RgbaImage::new(2, 2));
        assert_eq!(canvas.pixel(3, 3), Some(BACKGROUND_COLOR));
    }

    #[test]
    fn test_stroke_and_circle() {
        let mut canvas = PixmapCanvas::new(20, 20).unwrap();
        canvas.clear(BACKGROUND_COLOR);
        let style = LineStyle::new(4.0, [0, 255, 0, 255]).with_round(true);
        canvas.stroke_polyline(&[Point::new(2.0, 5.0), Point::new(18.0, 5.0)], &style);
        canvas.fill_circle(Point::new(10.0, 15.0), 3.0, [255, 0, 0, 255]);

        assert!(canvas.pixel(10, 5).unwrap()[1] > 200);
        assert!(canvas.pixel(10, 15).unwrap()[0] > 200);
        assert_eq!(canvas.pixel(0, 10), Some(BACKGROUND_COLOR));
    }

    #[test]
    fn test_placeholder_fills_surface() {
        let mut canvas = PixmapCanvas::new(32, 32).unwrap();
        canvas.draw_placeholder("Loading");
        assert_eq!(canvas.pixel(0, 0), Some(PLACEHOLDER_COLOR));
        assert_eq!(canvas.pixel(16, 16), Some(PLACEHOLDER_COLOR));
    }
}
