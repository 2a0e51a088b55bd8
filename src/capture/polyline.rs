//! Click-by-click polyline.

use crate::color::Color;
use crate::constants::{POLYLINE_HANDLE_RADIUS, POLYLINE_WIDTH, WORKING_ALPHA, WORKING_DASH};
use crate::error::ValidationError;
use crate::geometry::Point;
use crate::model::{AnnotationShape, MIN_CLOSED_POLYLINE_VERTICES, MIN_POLYLINE_VERTICES};
use crate::render::{Canvas, LineStyle};
use crate::viewport::ViewportTransform;

use super::tool::{
    CaptureTool, GestureEvent, GestureStep, PointerButton, ToolConfig, ToolId, WorkingGeometry,
};

/// Working line color.
const WORKING_COLOR: Color = Color::YELLOW;

/// Color of the most recently placed vertex handle.
const ACTIVE_HANDLE_COLOR: Color = Color::RED;

/// The starting click places the first vertex; each further primary click
/// adds one (a click on the previous vertex is not duplicated). Double-click
/// or `Finish` ends the line without adding a vertex.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolylineCapture;

impl CaptureTool for PolylineCapture {
    fn id(&self) -> ToolId {
        ToolId::Polyline
    }

    fn starts_gesture(&self, event: &GestureEvent) -> bool {
        matches!(
            event,
            GestureEvent::Click {
                button: PointerButton::Primary,
                ..
            }
        )
    }

    fn on_gesture_start(&self, event: &GestureEvent, _config: &ToolConfig) -> WorkingGeometry {
        let points = match *event {
            GestureEvent::Click { pos, .. } => vec![pos],
            _ => Vec::new(),
        };
        log::debug!("📐 Polyline started");
        WorkingGeometry::Polyline {
            points,
            cursor: None,
        }
    }

    fn on_gesture_update(&self, working: &mut WorkingGeometry, event: &GestureEvent) -> GestureStep {
        let WorkingGeometry::Polyline { points, cursor } = working else {
            return GestureStep::Cancel;
        };

        match *event {
            GestureEvent::Click {
                pos,
                button: PointerButton::Primary,
            } => {
                if points.last() != Some(&pos) {
                    points.push(pos);
                    log::trace!("Polyline vertex {} at ({:.1}, {:.1})", points.len(), pos.x, pos.y);
                }
                GestureStep::Continue
            }
            GestureEvent::PointerMove { pos, .. } => {
                *cursor = Some(pos);
                GestureStep::Continue
            }
            GestureEvent::DoubleClick { .. } => GestureStep::End { close: false },
            GestureEvent::Finish { close } => GestureStep::End { close },
            GestureEvent::Click {
                button: PointerButton::Secondary,
                ..
            }
            | GestureEvent::Cancel => GestureStep::Cancel,
            _ => GestureStep::Continue,
        }
    }

    /// A close request on fewer than three vertices yields an open line.
    fn on_gesture_end(
        &self,
        working: WorkingGeometry,
        close: bool,
    ) -> Result<AnnotationShape, ValidationError> {
        match working {
            WorkingGeometry::Polyline { points, .. } => {
                let closed = close && points.len() >= MIN_CLOSED_POLYLINE_VERTICES;
                AnnotationShape::polyline(points, closed)
            }
            other => Err(ValidationError::degenerate(
                "polyline",
                other.points().len(),
                MIN_POLYLINE_VERTICES,
            )),
        }
    }

    fn render(&self, working: &WorkingGeometry, canvas: &mut dyn Canvas, view: &ViewportTransform) {
        let WorkingGeometry::Polyline { points, cursor } = working else {
            return;
        };

        let mut screen: Vec<Point> = points.iter().map(|p| view.forward(*p)).collect();
        let handles = screen.clone();
        if let Some(c) = cursor {
            screen.push(view.forward(*c));
        }

        let style = LineStyle::new(POLYLINE_WIDTH, WORKING_COLOR.with_alpha(WORKING_ALPHA))
            .with_dash(WORKING_DASH);
        canvas.stroke_polyline(&screen, &style);

        let last = handles.len().saturating_sub(1);
        for (i, h) in handles.iter().enumerate() {
            let color = if i == last {
                ACTIVE_HANDLE_COLOR
            } else {
                WORKING_COLOR
            };
            canvas.fill_circle(*h, POLYLINE_HANDLE_RADIUS, color.with_alpha(255));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(x: f64, y: f64) -> GestureEvent {
        GestureEvent::Click {
            pos: Point::new(x, y),
            button: PointerButton::Primary,
        }
    }

    fn run(events: &[GestureEvent]) -> (WorkingGeometry, Option<GestureStep>) {
        let tool = PolylineCapture;
        let mut working = tool.on_gesture_start(&events[0], &ToolConfig::default());
        let mut last = None;
        for e in &events[1..] {
            let step = tool.on_gesture_update(&mut working, e);
            if step != GestureStep::Continue {
                last = Some(step);
                break;
            }
        }
        (working, last)
    }

    #[test]
    fn test_start_click_places_first_vertex() {
        let (working, step) = run(&[click(1.0, 2.0)]);
        assert_eq!(working.points(), &[Point::new(1.0, 2.0)]);
        assert_eq!(step, None);
    }

    #[test]
    fn test_repeated_click_is_not_duplicated() {
        let (working, _) = run(&[click(1.0, 1.0), click(1.0, 1.0), click(5.0, 5.0)]);
        assert_eq!(working.points().len(), 2);
    }

    #[test]
    fn test_double_click_ends_without_vertex() {
        let (working, step) = run(&[
            click(0.0, 0.0),
            click(10.0, 0.0),
            click(10.0, 10.0),
            GestureEvent::DoubleClick {
                pos: Point::new(20.0, 20.0),
            },
        ]);
        assert_eq!(step, Some(GestureStep::End { close: false }));
        let shape = PolylineCapture.on_gesture_end(working, false).unwrap();
        assert_eq!(shape.points().len(), 3);
    }

    #[test]
    fn test_close_rules() {
        let (working, step) = run(&[
            click(0.0, 0.0),
            click(10.0, 0.0),
            click(10.0, 10.0),
            GestureEvent::Finish { close: true },
        ]);
        assert_eq!(step, Some(GestureStep::End { close: true }));
        match PolylineCapture.on_gesture_end(working, true).unwrap() {
            AnnotationShape::Polyline(p) => assert!(p.closed()),
            other => panic!("unexpected {:?}", other),
        }

        let (working, _) = run(&[click(0.0, 0.0), click(10.0, 0.0)]);
        match PolylineCapture.on_gesture_end(working, true).unwrap() {
            AnnotationShape::Polyline(p) => assert!(!p.closed()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_single_vertex_is_degenerate() {
        let (working, _) = run(&[click(0.0, 0.0)]);
        assert_eq!(
            PolylineCapture.on_gesture_end(working, false),
            Err(ValidationError::degenerate("polyline", 1, 2))
        );
    }

    #[test]
    fn test_hover_tracks_cursor() {
        let (working, _) = run(&[
            click(0.0, 0.0),
            GestureEvent::PointerMove {
                pos: Point::new(3.0, 4.0),
                primary_held: false,
            },
        ]);
        match working {
            WorkingGeometry::Polyline { points, cursor } => {
                assert_eq!(points.len(), 1);
                assert_eq!(cursor, Some(Point::new(3.0, 4.0)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
