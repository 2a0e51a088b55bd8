//! Committed annotation types.
//!
//! Shapes can only be built through their validating constructors, so every
//! `Annotation` in existence already satisfies its point-count rules.
//! Geometry is in image coordinates.

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::color::Color;
use crate::error::ValidationError;
use crate::geometry::Point;

/// Minimum number of points for a committed stroke.
pub const MIN_STROKE_POINTS: usize = 1;

/// Minimum number of vertices for an open polyline.
pub const MIN_POLYLINE_VERTICES: usize = 2;

/// Minimum number of vertices for a closed polyline.
pub const MIN_CLOSED_POLYLINE_VERTICES: usize = 3;

/// Unique identifier for an annotation within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationId(pub u64);

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Milliseconds since the owning session started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

/// Monotonic clock anchored at session start.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    epoch: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp(self.epoch.elapsed().as_millis() as u64)
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a stroke marks the finding (positive) or explicitly excludes a region (negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Polarity {
    #[default]
    #[serde(rename = "pos")]
    Positive,
    #[serde(rename = "neg")]
    Negative,
}

impl Polarity {
    pub fn toggled(&self) -> Polarity {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }

    /// Display color for strokes of this polarity.
    pub fn color(&self) -> Color {
        match self {
            Polarity::Positive => Color::GREEN,
            Polarity::Negative => Color::RED,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
        }
    }
}

/// Freehand brush stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeShape {
    polarity: Polarity,
    radius: f64,
    points: Vec<Point>,
}

impl StrokeShape {
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Connected line segments, optionally closed.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineShape {
    points: Vec<Point>,
    closed: bool,
}

impl PolylineShape {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn closed(&self) -> bool {
        self.closed
    }
}

/// Shape data for an annotation (in image coordinates).
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationShape {
    Stroke(StrokeShape),
    Polyline(PolylineShape),
}

impl AnnotationShape {
    /// Build a stroke. Needs at least one finite point and a positive radius.
    pub fn stroke(
        polarity: Polarity,
        radius: f64,
        points: Vec<Point>,
    ) -> Result<Self, ValidationError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ValidationError::InvalidRadius(radius));
        }
        let points = finite_points(points);
        if points.len() < MIN_STROKE_POINTS {
            return Err(ValidationError::degenerate(
                "stroke",
                points.len(),
                MIN_STROKE_POINTS,
            ));
        }
        Ok(AnnotationShape::Stroke(StrokeShape {
            polarity,
            radius,
            points,
        }))
    }

    /// Build a polyline. Open lines need two vertices, closed ones three.
    pub fn polyline(points: Vec<Point>, closed: bool) -> Result<Self, ValidationError> {
        let points = finite_points(points);
        let (kind, required) = if closed {
            ("closed polyline", MIN_CLOSED_POLYLINE_VERTICES)
        } else {
            ("polyline", MIN_POLYLINE_VERTICES)
        };
        if points.len() < required {
            return Err(ValidationError::degenerate(kind, points.len(), required));
        }
        Ok(AnnotationShape::Polyline(PolylineShape { points, closed }))
    }

    pub fn points(&self) -> &[Point] {
        match self {
            AnnotationShape::Stroke(s) => s.points(),
            AnnotationShape::Polyline(p) => p.points(),
        }
    }

    /// Short type name, matching the wire discriminant.
    pub fn kind(&self) -> &'static str {
        match self {
            AnnotationShape::Stroke(_) => "scribble",
            AnnotationShape::Polyline(_) => "polyline",
        }
    }

    /// Axis-aligned bounds `(min, max)` including stroke radius.
    pub fn bounds(&self) -> (Point, Point) {
        let pad = match self {
            AnnotationShape::Stroke(s) => s.radius(),
            AnnotationShape::Polyline(_) => 0.0,
        };
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in self.points() {
            min = Point::new(min.x.min(p.x - pad), min.y.min(p.y - pad));
            max = Point::new(max.x.max(p.x + pad), max.y.max(p.y + pad));
        }
        (min, max)
    }
}

fn finite_points(points: Vec<Point>) -> Vec<Point> {
    let before = points.len();
    let points: Vec<Point> = points.into_iter().filter(Point::is_finite).collect();
    if points.len() != before {
        log::warn!("Dropped {} non-finite points", before - points.len());
    }
    points
}

/// A committed, class-tagged annotation. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    id: AnnotationId,
    class_id: u32,
    color: Color,
    created_at: Timestamp,
    shape: AnnotationShape,
}

impl Annotation {
    pub fn new(
        id: AnnotationId,
        class_id: u32,
        color: Color,
        created_at: Timestamp,
        shape: AnnotationShape,
    ) -> Self {
        Self {
            id,
            class_id,
            color,
            created_at,
            shape,
        }
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn class_id(&self) -> u32 {
        self.class_id
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn shape(&self) -> &AnnotationShape {
        &self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn test_stroke_requires_points() {
        assert_eq!(
            AnnotationShape::stroke(Polarity::Positive, 5.0, vec![]),
            Err(ValidationError::degenerate("stroke", 0, 1))
        );
        let single = AnnotationShape::stroke(Polarity::Negative, 5.0, pts(&[(1.0, 2.0)])).unwrap();
        assert_eq!(single.points().len(), 1);
    }

    #[test]
    fn test_stroke_rejects_bad_radius() {
        for r in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                AnnotationShape::stroke(Polarity::Positive, r, pts(&[(0.0, 0.0)])),
                Err(ValidationError::InvalidRadius(_))
            ));
        }
    }

    #[test]
    fn test_polyline_vertex_rules() {
        assert!(AnnotationShape::polyline(pts(&[(0.0, 0.0)]), false).is_err());
        assert!(AnnotationShape::polyline(pts(&[(0.0, 0.0), (1.0, 1.0)]), false).is_ok());
        assert_eq!(
            AnnotationShape::polyline(pts(&[(0.0, 0.0), (1.0, 1.0)]), true),
            Err(ValidationError::degenerate("closed polyline", 2, 3))
        );
        let closed =
            AnnotationShape::polyline(pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]), true).unwrap();
        match closed {
            AnnotationShape::Polyline(p) => assert!(p.closed()),
            _ => panic!("expected polyline"),
        }
    }

    #[test]
    fn test_non_finite_points_are_dropped() {
        let shape = AnnotationShape::polyline(
            pts(&[(0.0, 0.0), (f64::NAN, 1.0), (3.0, 4.0)]),
            false,
        )
        .unwrap();
        assert_eq!(shape.points(), pts(&[(0.0, 0.0), (3.0, 4.0)]).as_slice());

        assert!(AnnotationShape::polyline(pts(&[(0.0, 0.0), (f64::NAN, 1.0)]), false).is_err());
    }

    #[test]
    fn test_bounds_include_radius() {
        let shape =
            AnnotationShape::stroke(Polarity::Positive, 2.0, pts(&[(10.0, 10.0), (20.0, 15.0)]))
                .unwrap();
        assert_eq!(
            shape.bounds(),
            (Point::new(8.0, 8.0), Point::new(22.0, 17.0))
        );
    }

    #[test]
    fn test_polarity() {
        assert_eq!(Polarity::Positive.toggled(), Polarity::Negative);
        assert_eq!(Polarity::Positive.color(), Color::GREEN);
        assert_eq!(Polarity::Negative.color(), Color::RED);
        assert_eq!(serde_json::to_string(&Polarity::Negative).unwrap(), "\"neg\"");
    }

    #[test]
    fn test_clock_is_monotonic() {
        let clock = SessionClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
