//! Freehand polarity brush.

use crate::constants::{WORKING_ALPHA, WORKING_DASH};
use crate::error::ValidationError;
use crate::model::AnnotationShape;
use crate::render::{Canvas, LineStyle};
use crate::viewport::ViewportTransform;

use super::tool::{
    CaptureTool, GestureEvent, GestureStep, PointerButton, ToolConfig, ToolId, WorkingGeometry,
};

/// Starts on primary pointer-down, samples every move while the primary
/// button is held and ends on pointer-up. Pointer-down itself adds no point.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrokeCapture;

impl CaptureTool for StrokeCapture {
    fn id(&self) -> ToolId {
        ToolId::Stroke
    }

    fn starts_gesture(&self, event: &GestureEvent) -> bool {
        matches!(
            event,
            GestureEvent::PointerDown {
                button: PointerButton::Primary,
                ..
            }
        )
    }

    fn on_gesture_start(&self, _event: &GestureEvent, config: &ToolConfig) -> WorkingGeometry {
        log::debug!(
            "🖌️ Stroke started ({}, radius {})",
            config.polarity.name(),
            config.radius
        );
        WorkingGeometry::Stroke {
            polarity: config.polarity,
            radius: config.radius,
            points: Vec::new(),
        }
    }

    fn on_gesture_update(&self, working: &mut WorkingGeometry, event: &GestureEvent) -> GestureStep {
        let WorkingGeometry::Stroke { points, .. } = working else {
            return GestureStep::Cancel;
        };

        match *event {
            GestureEvent::PointerMove {
                pos,
                primary_held: true,
            } => {
                points.push(pos);
                GestureStep::Continue
            }
            GestureEvent::PointerUp {
                button: PointerButton::Primary,
                ..
            } => GestureStep::End { close: false },
            GestureEvent::PointerDown {
                button: PointerButton::Secondary,
                ..
            }
            | GestureEvent::Click {
                button: PointerButton::Secondary,
                ..
            }
            | GestureEvent::Cancel => GestureStep::Cancel,
            _ => GestureStep::Continue,
        }
    }

    fn on_gesture_end(
        &self,
        working: WorkingGeometry,
        _close: bool,
    ) -> Result<AnnotationShape, ValidationError> {
        match working {
            WorkingGeometry::Stroke {
                polarity,
                radius,
                points,
            } => AnnotationShape::stroke(polarity, radius, points),
            other => Err(ValidationError::degenerate("stroke", other.points().len(), 1)),
        }
    }

    fn render(&self, working: &WorkingGeometry, canvas: &mut dyn Canvas, view: &ViewportTransform) {
        let WorkingGeometry::Stroke {
            polarity,
            radius,
            points,
        } = working
        else {
            return;
        };

        let screen: Vec<_> = points.iter().map(|p| view.forward(*p)).collect();
        let width = (2.0 * radius * view.state().scale) as f32;
        let style = LineStyle::new(width, polarity.color().with_alpha(WORKING_ALPHA))
            .with_round(true)
            .with_dash(WORKING_DASH);
        canvas.stroke_polyline(&screen, &style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::Polarity;

    fn down() -> GestureEvent {
        GestureEvent::PointerDown {
            pos: Point::new(1.0, 1.0),
            button: PointerButton::Primary,
        }
    }

    fn drag(x: f64, y: f64) -> GestureEvent {
        GestureEvent::PointerMove {
            pos: Point::new(x, y),
            primary_held: true,
        }
    }

    #[test]
    fn test_only_primary_down_starts() {
        let tool = StrokeCapture;
        assert!(tool.starts_gesture(&down()));
        assert!(!tool.starts_gesture(&GestureEvent::PointerDown {
            pos: Point::ORIGIN,
            button: PointerButton::Secondary
        }));
        assert!(!tool.starts_gesture(&drag(0.0, 0.0)));
    }

    #[test]
    fn test_moves_append_and_hover_is_ignored() {
        let tool = StrokeCapture;
        let config = ToolConfig {
            polarity: Polarity::Negative,
            radius: 3.0,
        };
        let mut working = tool.on_gesture_start(&down(), &config);
        assert!(working.points().is_empty());

        assert_eq!(
            tool.on_gesture_update(&mut working, &drag(2.0, 2.0)),
            GestureStep::Continue
        );
        let hover = GestureEvent::PointerMove {
            pos: Point::new(9.0, 9.0),
            primary_held: false,
        };
        assert_eq!(tool.on_gesture_update(&mut working, &hover), GestureStep::Continue);
        assert_eq!(working.points(), &[Point::new(2.0, 2.0)]);

        let up = GestureEvent::PointerUp {
            pos: Point::new(2.0, 2.0),
            button: PointerButton::Primary,
        };
        assert_eq!(
            tool.on_gesture_update(&mut working, &up),
            GestureStep::End { close: false }
        );

        match tool.on_gesture_end(working, false).unwrap() {
            AnnotationShape::Stroke(s) => {
                assert_eq!(s.polarity(), Polarity::Negative);
                assert_eq!(s.radius(), 3.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tap_without_movement_is_degenerate() {
        let tool = StrokeCapture;
        let working = tool.on_gesture_start(&down(), &ToolConfig::default());
        assert_eq!(
            tool.on_gesture_end(working, false),
            Err(ValidationError::degenerate("stroke", 0, 1))
        );
    }

    #[test]
    fn test_secondary_button_cancels() {
        let tool = StrokeCapture;
        let mut working = tool.on_gesture_start(&down(), &ToolConfig::default());
        let right = GestureEvent::Click {
            pos: Point::ORIGIN,
            button: PointerButton::Secondary,
        };
        assert_eq!(tool.on_gesture_update(&mut working, &right), GestureStep::Cancel);
        assert_eq!(
            tool.on_gesture_update(&mut working, &GestureEvent::Cancel),
            GestureStep::Cancel
        );
    }
}
