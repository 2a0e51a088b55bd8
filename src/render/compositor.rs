//! Frame composition.
//!
//! Layers are drawn in a fixed order, each on top of the previous one:
//!
//! 1. base layer: every screen pixel is mapped back into image space and
//!    takes the windowed gray value of the nearest sample
//! 2. committed annotations, in commit order
//! 3. the in-flight gesture, if any
//!
//! Without an image only the loading placeholder is drawn.

use image::{Rgba, RgbaImage};

use crate::capture::{CaptureSession, ToolRegistry};
use crate::constants::{
    BACKGROUND_COLOR, PLACEHOLDER_COLOR, POLYLINE_HANDLE_RADIUS, POLYLINE_WIDTH, STROKE_ALPHA,
};
use crate::data::ImageFrame;
use crate::geometry::Point;
use crate::intensity::map_to_gray;
use crate::model::{Annotation, AnnotationShape};
use crate::viewport::ViewportTransform;

use super::canvas::{Canvas, LineStyle};

/// Everything needed to draw one frame.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    /// Loaded image and its view, `None` while loading
    pub image: Option<(&'a ImageFrame, &'a ViewportTransform)>,
    pub annotations: &'a [Annotation],
    pub capture: Option<(&'a CaptureSession, &'a ToolRegistry)>,
    /// Shown when there is no image
    pub placeholder: &'a str,
}

impl<'a> Scene<'a> {
    /// A scene with no image yet.
    pub fn loading(placeholder: &'a str) -> Self {
        Self {
            image: None,
            annotations: &[],
            capture: None,
            placeholder,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderCompositor {
    /// Fill for screen pixels outside the image
    pub background: [u8; 4],
}

impl Default for RenderCompositor {
    fn default() -> Self {
        Self {
            background: BACKGROUND_COLOR,
        }
    }
}

impl RenderCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a full frame.
    pub fn render(&self, canvas: &mut dyn Canvas, scene: &Scene<'_>) {
        let Some((frame, view)) = scene.image else {
            canvas.clear(PLACEHOLDER_COLOR);
            canvas.draw_placeholder(scene.placeholder);
            return;
        };

        canvas.clear(self.background);
        let (width, height) = canvas.size();
        canvas.draw_base_layer(&self.base_layer(frame, view, width, height));

        for annotation in scene.annotations {
            draw_annotation(canvas, annotation, view);
        }

        if let Some((capture, registry)) = scene.capture {
            capture.render(registry, canvas, view);
        }

        log::trace!(
            "Rendered frame: {} annotations, capture active: {}",
            scene.annotations.len(),
            scene.capture.is_some_and(|(c, _)| c.is_active())
        );
    }

    /// Windowed gray layer at screen resolution.
    pub fn base_layer(
        &self,
        frame: &ImageFrame,
        view: &ViewportTransform,
        width: u32,
        height: u32,
    ) -> RgbaImage {
        let state = view.state();
        let (cols, rows) = (frame.width() as f64, frame.height() as f64);

        RgbaImage::from_fn(width, height, |x, y| {
            let p = view.inverse(Point::new(x as f64 + 0.5, y as f64 + 0.5));
            if !(p.x >= 0.0 && p.y >= 0.0 && p.x < cols && p.y < rows) {
                return Rgba(self.background);
            }
            match frame.sample(p.x as usize, p.y as usize) {
                Some(raw) => {
                    let g = map_to_gray(raw as f64, &state.voi, state.invert);
                    Rgba([g, g, g, 255])
                }
                None => Rgba(self.background),
            }
        })
    }
}

/// Draw one committed annotation in screen space.
fn draw_annotation(canvas: &mut dyn Canvas, annotation: &Annotation, view: &ViewportTransform) {
    let screen: Vec<Point> = annotation
        .shape()
        .points()
        .iter()
        .map(|p| view.forward(*p))
        .collect();

    match annotation.shape() {
        AnnotationShape::Stroke(s) => {
            let width = (2.0 * s.radius() * view.state().scale) as f32;
            let style = LineStyle::new(width, s.polarity().color().with_alpha(STROKE_ALPHA))
                .with_round(true);
            canvas.stroke_polyline(&screen, &style);
        }
        AnnotationShape::Polyline(p) => {
            let color = annotation.color().with_alpha(255);
            let style = LineStyle::new(POLYLINE_WIDTH, color).with_closed(p.closed());
            canvas.stroke_polyline(&screen, &style);
            for handle in &screen {
                canvas.fill_circle(*handle, POLYLINE_HANDLE_RADIUS, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{ActiveClass, GestureEvent, PointerButton, ToolId};
    use crate::color::Color;
    use crate::geometry::Size;
    use crate::intensity::Voi;
    use crate::model::{AnnotationId, Polarity, Timestamp};
    use crate::render::{DisplayList, DrawCommand};
    use crate::viewport::ViewportPatch;
    use ndarray::Array2;

    fn frame() -> ImageFrame {
        // Left half dark, right half bright
        let samples = Array2::from_shape_fn((4, 4), |(_, x)| if x < 2 { 0.0 } else { 300.0 });
        ImageFrame::new("img", samples)
    }

    fn view() -> ViewportTransform {
        ViewportTransform::for_image(Size::new(4.0, 4.0), Size::new(8.0, 8.0), Voi::default())
    }

    fn polyline() -> Annotation {
        let shape = AnnotationShape::polyline(
            vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(4.0, 4.0)],
            true,
        )
        .unwrap();
        Annotation::new(AnnotationId(1), 2, Color::new(0, 0x66, 0xff), Timestamp(0), shape)
    }

    #[test]
    fn test_placeholder_without_image() {
        let mut canvas = DisplayList::new(8, 8);
        RenderCompositor::new().render(&mut canvas, &Scene::loading("Loading image..."));
        assert_eq!(
            canvas.commands(),
            &[
                DrawCommand::Clear(PLACEHOLDER_COLOR),
                DrawCommand::Placeholder("Loading image...".to_string())
            ]
        );
    }

    #[test]
    fn test_base_layer_windows_and_fits() {
        let (f, v) = (frame(), view());
        let layer = RenderCompositor::new().base_layer(&f, &v, 8, 8);
        // Fit scale is 2, so screen x 0..4 shows image columns 0..2
        assert_eq!(layer.get_pixel(1, 1).0, [0, 0, 0, 255]);
        assert_eq!(layer.get_pixel(6, 6).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_base_layer_invert_and_background() {
        let f = frame();
        let mut v = view();
        v.set_partial(
            ViewportPatch::new()
                .with_invert(true)
                .with_scale(1.0)
                .with_translation(Point::new(2.0, 2.0)),
        );
        let compositor = RenderCompositor {
            background: [9, 9, 9, 255],
        };
        let layer = compositor.base_layer(&f, &v, 8, 8);
        // Image now covers screen 2..6
        assert_eq!(layer.get_pixel(0, 0).0, [9, 9, 9, 255]);
        assert_eq!(layer.get_pixel(2, 3).0, [255, 255, 255, 255]);
        assert_eq!(layer.get_pixel(5, 3).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_layer_order_and_annotation_styles() {
        let (f, v) = (frame(), view());
        let stroke = Annotation::new(
            AnnotationId(2),
            1,
            Color::RED,
            Timestamp(1),
            AnnotationShape::stroke(Polarity::Negative, 3.0, vec![Point::new(1.0, 1.0)]).unwrap(),
        );
        let annotations = vec![polyline(), stroke];

        let registry = ToolRegistry::new();
        let mut capture = CaptureSession::new();
        capture.set_tool(ToolId::Stroke).unwrap();
        capture
            .set_class(Some(ActiveClass {
                id: 1,
                color: Color::RED,
            }))
            .unwrap();
        capture
            .handle(
                &GestureEvent::PointerDown {
                    pos: Point::new(2.0, 2.0),
                    button: PointerButton::Primary,
                },
                &registry,
            )
            .unwrap();
        capture
            .handle(
                &GestureEvent::PointerMove {
                    pos: Point::new(3.0, 2.0),
                    primary_held: true,
                },
                &registry,
            )
            .unwrap();

        let mut canvas = DisplayList::new(8, 8);
        let scene = Scene {
            image: Some((&f, &v)),
            annotations: &annotations,
            capture: Some((&capture, &registry)),
            placeholder: "",
        };
        RenderCompositor::new().render(&mut canvas, &scene);

        let commands = canvas.commands();
        assert_eq!(commands[0], DrawCommand::Clear(BACKGROUND_COLOR));
        assert_eq!(commands[1], DrawCommand::BaseLayer { width: 8, height: 8 });

        let lines: Vec<_> = canvas.polylines().collect();
        assert_eq!(lines.len(), 3);

        // Committed polyline: thin, class color, closed, in screen space
        let (points, style) = lines[0];
        assert_eq!(points[1], Point::new(8.0, 0.0));
        assert_eq!(style.width, POLYLINE_WIDTH);
        assert_eq!(style.color, [0, 0x66, 0xff, 255]);
        assert!(style.closed);

        // Committed stroke: radius scaled to screen, polarity color
        let (_, style) = lines[1];
        assert_eq!(style.width, 12.0);
        assert_eq!(style.color, Color::RED.with_alpha(STROKE_ALPHA));
        assert!(style.round);
        assert!(style.dash.is_none());

        // Working stroke is drawn last and dashed
        assert!(matches!(commands.last(), Some(DrawCommand::Polyline { .. })));
        assert!(lines[2].1.dash.is_some());

        let handles = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
            .count();
        assert_eq!(handles, 3);
    }
}
