//! Drawing surface abstraction.
//!
//! The compositor and capture tools draw through [`Canvas`] in screen
//! coordinates. [`DisplayList`] records the calls instead of painting them,
//! which is what the tests inspect.

use image::RgbaImage;

use crate::geometry::Point;

/// How a polyline is stroked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub width: f32,
    /// Straight RGBA
    pub color: [u8; 4],
    /// Round caps and joins
    pub round: bool,
    /// (on, off) dash lengths
    pub dash: Option<[f32; 2]>,
    pub closed: bool,
}

impl LineStyle {
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

    pub fn with_dash(mut self, dash: [f32; 2]) -> Self {
        self.dash = Some(dash);
        self
    }

    pub fn with_closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }
}

/// A screen-space drawing surface.
pub trait Canvas {
    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);

    fn clear(&mut self, color: [u8; 4]);

    /// Replace the surface with a full-size RGBA layer.
    fn draw_base_layer(&mut self, layer: &RgbaImage);

    fn stroke_polyline(&mut self, points: &[Point], style: &LineStyle);

    fn fill_circle(&mut self, center: Point, radius: f32, color: [u8; 4]);

    /// Indicate that image data is not available yet.
    fn draw_placeholder(&mut self, message: &str);
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear([u8; 4]),
    BaseLayer { width: u32, height: u32 },
    Polyline { points: Vec<Point>, style: LineStyle },
    Circle { center: Point, radius: f32, color: [u8; 4] },
    Placeholder(String),
}

/// Canvas that records drawing calls in order.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
    /// Last base layer drawn, kept for pixel checks
    base_layer: Option<RgbaImage>,
}

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn base_layer(&self) -> Option<&RgbaImage> {
        self.base_layer.as_ref()
    }

    /// Polylines in drawing order.
    pub fn polylines(&self) -> impl Iterator<Item = (&[Point], &LineStyle)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Polyline { points, style } => Some((points.as_slice(), style)),
            _ => None,
        })
    }
}

impl Canvas for DisplayList {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: [u8; 4]) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn draw_base_layer(&mut self, layer: &RgbaImage) {
        self.commands.push(DrawCommand::BaseLayer {
            width: layer.width(),
            height: layer.height(),
        });
        self.base_layer = Some(layer.clone());
    }

    fn stroke_polyline(&mut self, points: &[Point], style: &LineStyle) {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            style: *style,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: [u8; 4]) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn draw_placeholder(&mut self, message: &str) {
        self.commands
            .push(DrawCommand::Placeholder(message.to_string()));
    }
}
