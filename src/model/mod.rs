//! Data models for the NEOCXR viewer.

mod annotation;
mod taxonomy;

pub use annotation::{
    Annotation, AnnotationId, AnnotationShape, MIN_CLOSED_POLYLINE_VERTICES,
    MIN_POLYLINE_VERTICES, MIN_STROKE_POINTS, Polarity, PolylineShape, SessionClock, StrokeShape,
    Timestamp,
};
pub use taxonomy::{ClassKind, PathologyClass, Taxonomy, default_classes};
