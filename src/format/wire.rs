//! Wire representation of annotations and task submissions.
//!
//! ```json
//! {"type": "scribble", "class_id": 1, "polarity": "pos", "radius": 5.0,
//!  "points": [{"x": 10, "y": 12}], "color": "#ff0000"}
//! {"type": "polyline", "class_id": 6, "points": [...], "closed": false, "color": "#0066ff"}
//! ```
//!
//! Points are rounded to whole image pixels.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::constants::DEFAULT_STROKE_RADIUS;
use crate::error::ValidationError;
use crate::geometry::Point;
use crate::model::{Annotation, AnnotationId, AnnotationShape, Polarity, Timestamp};

/// Highest accepted reader confidence.
pub const MAX_CONFIDENCE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePoint {
    pub x: i64,
    pub y: i64,
}

impl From<&Point> for WirePoint {
    fn from(p: &Point) -> Self {
        let r = p.rounded();
        Self {
            x: r.x as i64,
            y: r.y as i64,
        }
    }
}

impl From<&WirePoint> for Point {
    fn from(p: &WirePoint) -> Self {
        Point::new(p.x as f64, p.y as f64)
    }
}

fn default_radius() -> f64 {
    DEFAULT_STROKE_RADIUS
}

/// One annotation as sent to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireAnnotation {
    Scribble {
        class_id: u32,
        polarity: Polarity,
        #[serde(default = "default_radius")]
        radius: f64,
        points: Vec<WirePoint>,
        color: Color,
    },
    Polyline {
        class_id: u32,
        points: Vec<WirePoint>,
        #[serde(default)]
        closed: bool,
        color: Color,
    },
}

impl From<&Annotation> for WireAnnotation {
    fn from(annotation: &Annotation) -> Self {
        match annotation.shape() {
            AnnotationShape::Stroke(s) => WireAnnotation::Scribble {
                class_id: annotation.class_id(),
                polarity: s.polarity(),
                radius: s.radius(),
                points: s.points().iter().map(WirePoint::from).collect(),
                color: annotation.color(),
            },
            AnnotationShape::Polyline(p) => WireAnnotation::Polyline {
                class_id: annotation.class_id(),
                points: p.points().iter().map(WirePoint::from).collect(),
                closed: p.closed(),
                color: annotation.color(),
            },
        }
    }
}

impl WireAnnotation {
    pub fn class_id(&self) -> u32 {
        match self {
            WireAnnotation::Scribble { class_id, .. } | WireAnnotation::Polyline { class_id, .. } => {
                *class_id
            }
        }
    }

    /// Rebuild a committed annotation, re-running shape validation.
    pub fn into_annotation(
        self,
        id: AnnotationId,
        created_at: Timestamp,
    ) -> Result<Annotation, ValidationError> {
        let (class_id, color, shape) = match self {
            WireAnnotation::Scribble {
                class_id,
                polarity,
                radius,
                points,
                color,
            } => (
                class_id,
                color,
                AnnotationShape::stroke(polarity, radius, points.iter().map(Point::from).collect())?,
            ),
            WireAnnotation::Polyline {
                class_id,
                points,
                closed,
                color,
            } => (
                class_id,
                color,
                AnnotationShape::polyline(points.iter().map(Point::from).collect(), closed)?,
            ),
        };
        Ok(Annotation::new(id, class_id, color, created_at, shape))
    }
}

/// Convert saved items back into annotations with ids starting at `first_id`.
/// Invalid items are skipped and reported.
pub fn annotations_from_wire(
    items: Vec<WireAnnotation>,
    first_id: u64,
    created_at: Timestamp,
) -> (Vec<Annotation>, Vec<ValidationError>) {
    let mut annotations = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    let mut next = first_id;

    for item in items {
        match item.into_annotation(AnnotationId(next), created_at) {
            Ok(a) => {
                annotations.push(a);
                next += 1;
            }
            Err(e) => {
                log::warn!("Skipping saved annotation: {}", e);
                errors.push(e);
            }
        }
    }
    (annotations, errors)
}

/// Reader metadata attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmissionMeta {
    /// 0-100
    pub confidence: u8,
    #[serde(default)]
    pub notes: String,
}

impl SubmissionMeta {
    /// Confidence above 100 is clamped.
    pub fn new(confidence: u32, notes: impl Into<String>) -> Self {
        Self {
            confidence: confidence.min(MAX_CONFIDENCE as u32) as u8,
            notes: notes.into(),
        }
    }
}

/// Everything sent when saving a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub task_id: String,
    pub items: Vec<WireAnnotation>,
    pub meta: SubmissionMeta,
}

impl Submission {
    pub fn new(task_id: impl Into<String>, items: Vec<WireAnnotation>, meta: SubmissionMeta) -> Self {
        Self {
            task_id: task_id.into(),
            items,
            meta,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polyline_annotation() -> Annotation {
        let shape = AnnotationShape::polyline(
            vec![Point::new(1.4, 2.5), Point::new(30.0, 40.49), Point::new(-3.6, 7.0)],
            true,
        )
        .unwrap();
        Annotation::new(AnnotationId(4), 6, Color::new(0, 0x66, 0xff), Timestamp(0), shape)
    }

    #[test]
    fn test_scribble_wire_shape() {
        let shape =
            AnnotationShape::stroke(Polarity::Negative, 7.0, vec![Point::new(10.2, 11.7)]).unwrap();
        let a = Annotation::new(AnnotationId(1), 2, Color::RED, Timestamp(5), shape);
        let json = serde_json::to_value(WireAnnotation::from(&a)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "scribble",
                "class_id": 2,
                "polarity": "neg",
                "radius": 7.0,
                "points": [{"x": 10, "y": 12}],
                "color": "#ff0000"
            })
        );
    }

    #[test]
    fn test_polyline_points_are_rounded() {
        let wire = WireAnnotation::from(&polyline_annotation());
        match &wire {
            WireAnnotation::Polyline { points, closed, .. } => {
                assert_eq!(
                    points,
                    &vec![
                        WirePoint { x: 1, y: 3 },
                        WirePoint { x: 30, y: 40 },
                        WirePoint { x: -4, y: 7 }
                    ]
                );
                assert!(*closed);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(wire.class_id(), 6);
    }

    #[test]
    fn test_scribble_without_radius_uses_default() {
        let json = r##"{"type":"scribble","class_id":1,"polarity":"pos",
                       "points":[{"x":1,"y":2}],"color":"#00ff00"}"##;
        let wire: WireAnnotation = serde_json::from_str(json).unwrap();
        let a = wire.into_annotation(AnnotationId(9), Timestamp(0)).unwrap();
        match a.shape() {
            AnnotationShape::Stroke(s) => assert_eq!(s.radius(), DEFAULT_STROKE_RADIUS),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_items_are_skipped() {
        let items = vec![
            WireAnnotation::Polyline {
                class_id: 1,
                points: vec![WirePoint { x: 0, y: 0 }],
                closed: false,
                color: Color::YELLOW,
            },
            WireAnnotation::from(&polyline_annotation()),
        ];
        let (annotations, errors) = annotations_from_wire(items, 20, Timestamp(0));
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].id(), AnnotationId(20));
        assert_eq!(errors, vec![ValidationError::degenerate("polyline", 1, 2)]);
    }

    #[test]
    fn test_submission_json() {
        let submission = Submission::new(
            "task-17",
            vec![WireAnnotation::from(&polyline_annotation())],
            SubmissionMeta::new(250, "left apex"),
        );
        assert_eq!(submission.meta.confidence, 100);

        let json = submission.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["task_id"], "task-17");
        assert_eq!(value["items"][0]["type"], "polyline");
        assert_eq!(value["meta"]["notes"], "left apex");

        assert_eq!(Submission::from_json(&json).unwrap(), submission);
    }
}
