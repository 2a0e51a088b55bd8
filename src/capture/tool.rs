//! Tool identifiers, gesture events and the capture capability trait.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::constants::{DEFAULT_STROKE_RADIUS, MAX_STROKE_RADIUS, MIN_STROKE_RADIUS};
use crate::error::ValidationError;
use crate::geometry::Point;
use crate::model::{AnnotationShape, Polarity};
use crate::render::Canvas;
use crate::viewport::ViewportTransform;

/// Tools available in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    /// No drawing; pointer input is ignored
    #[default]
    Pointer,
    /// Freehand polarity brush
    Stroke,
    /// Click-by-click polyline
    Polyline,
    /// Drag to move the image
    Pan,
    /// Drag to zoom about the drag anchor
    Zoom,
    /// Drag to change window width/center
    WindowLevel,
}

impl ToolId {
    pub fn name(&self) -> &'static str {
        match self {
            ToolId::Pointer => "Pointer",
            ToolId::Stroke => "Stroke",
            ToolId::Polyline => "Polyline",
            ToolId::Pan => "Pan",
            ToolId::Zoom => "Zoom",
            ToolId::WindowLevel => "Window/Level",
        }
    }

    pub fn all() -> &'static [ToolId] {
        &[
            ToolId::Pointer,
            ToolId::Stroke,
            ToolId::Polyline,
            ToolId::Pan,
            ToolId::Zoom,
            ToolId::WindowLevel,
        ]
    }

    /// Whether the tool produces annotations.
    pub fn is_drawing_tool(&self) -> bool {
        matches!(self, ToolId::Stroke | ToolId::Polyline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Input delivered to a capture tool, in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    PointerDown { pos: Point, button: PointerButton },
    PointerMove { pos: Point, primary_held: bool },
    PointerUp { pos: Point, button: PointerButton },
    Click { pos: Point, button: PointerButton },
    DoubleClick { pos: Point },
    /// Explicit finish command; `close` requests a closed shape
    Finish { close: bool },
    Cancel,
}

/// Per-tool settings, snapshotted when a gesture starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub polarity: Polarity,
    pub radius: f64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            polarity: Polarity::Positive,
            radius: DEFAULT_STROKE_RADIUS,
        }
    }
}

impl ToolConfig {
    /// Clamp a requested radius into the brush range. Non-finite values are rejected.
    pub fn clamp_radius(radius: f64) -> Result<f64, ValidationError> {
        if radius.is_finite() {
            Ok(radius.clamp(MIN_STROKE_RADIUS, MAX_STROKE_RADIUS))
        } else {
            Err(ValidationError::InvalidRadius(radius))
        }
    }
}

/// The class new annotations are tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveClass {
    pub id: u32,
    pub color: Color,
}

/// Geometry of the gesture in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkingGeometry {
    Stroke {
        polarity: Polarity,
        radius: f64,
        points: Vec<Point>,
    },
    Polyline {
        points: Vec<Point>,
        /// Last hover position, drawn as a rubber-band segment
        cursor: Option<Point>,
    },
}

impl WorkingGeometry {
    pub fn points(&self) -> &[Point] {
        match self {
            WorkingGeometry::Stroke { points, .. } | WorkingGeometry::Polyline { points, .. } => {
                points
            }
        }
    }
}

/// What a tool wants after seeing an event mid-gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureStep {
    Continue,
    End { close: bool },
    Cancel,
}

/// A drawing capability.
///
/// Tools are stateless; the gesture state lives in the `WorkingGeometry`
/// owned by the capture session and is passed in on every call.
pub trait CaptureTool {
    fn id(&self) -> ToolId;

    /// Whether this event begins a gesture for this tool.
    fn starts_gesture(&self, event: &GestureEvent) -> bool;

    fn on_gesture_start(&self, event: &GestureEvent, config: &ToolConfig) -> WorkingGeometry;

    fn on_gesture_update(&self, working: &mut WorkingGeometry, event: &GestureEvent) -> GestureStep;

    /// Turn the finished working geometry into a shape, or report why it is degenerate.
    fn on_gesture_end(
        &self,
        working: WorkingGeometry,
        close: bool,
    ) -> Result<AnnotationShape, ValidationError>;

    fn on_cancel(&self, working: &WorkingGeometry) {
        log::debug!(
            "🚫 {} gesture cancelled with {} points",
            self.id().name(),
            working.points().len()
        );
    }

    /// Draw the in-progress geometry on top of everything else.
    fn render(&self, working: &WorkingGeometry, canvas: &mut dyn Canvas, view: &ViewportTransform);
}
