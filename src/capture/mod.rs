//! Interactive annotation capture.
//!
//! Pointer events (already mapped into image space) drive a small state
//! machine that turns gestures into committed, class-tagged annotations.
//! Each drawing tool is a stateless [`CaptureTool`] capability looked up in
//! a caller-owned [`ToolRegistry`].

mod polyline;
mod registry;
mod session;
mod stroke;
mod tool;

pub use polyline::PolylineCapture;
pub use registry::ToolRegistry;
pub use session::{CaptureOutcome, CapturePhase, CaptureSession};
pub use stroke::StrokeCapture;
pub use tool::{
    ActiveClass, CaptureTool, GestureEvent, GestureStep, PointerButton, ToolConfig, ToolId,
    WorkingGeometry,
};
