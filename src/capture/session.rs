//! The capture state machine.
//!
//! ```text
//! Idle --start (class selected)--> Active --end (valid)----> Committed --> Idle
//!                                    |  \--end (degenerate)--> Idle
//!                                    \----cancel------------> Idle
//! ```
//!
//! `Committed` is not a resting phase: the finished annotation is returned
//! from [`CaptureSession::handle`] and the session is already back in `Idle`.

use crate::constants::{MAX_STROKE_RADIUS, MIN_STROKE_RADIUS};
use crate::error::ValidationError;
use crate::model::{Annotation, AnnotationId, Polarity, SessionClock, Timestamp};
use crate::render::Canvas;
use crate::viewport::ViewportTransform;

use super::registry::ToolRegistry;
use super::tool::{ActiveClass, GestureEvent, GestureStep, ToolConfig, ToolId, WorkingGeometry};

/// Resting phase of the capture machine.
///
/// Commit is not a resting phase: it is reported once as
/// [`CaptureOutcome::Committed`] and the machine is back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapturePhase {
    #[default]
    Idle,
    Active,
}

/// Result of feeding one event to the capture machine.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Event not relevant to the current tool/phase
    Ignored,
    Started,
    Updated,
    /// Gesture finished; the annotation is ready to be stored
    Committed(Annotation),
    /// Gesture finished with degenerate geometry and was dropped
    Discarded(ValidationError),
    Cancelled,
}

/// Active tool, class selection and in-flight geometry for one image.
#[derive(Debug)]
pub struct CaptureSession {
    active_tool: ToolId,
    active_class: Option<ActiveClass>,
    config: ToolConfig,
    /// Present exactly while Active
    working: Option<WorkingGeometry>,
    /// Class captured when the gesture started
    gesture_class: Option<ActiveClass>,
    next_id: u64,
    clock: SessionClock,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            active_tool: ToolId::default(),
            active_class: None,
            config: ToolConfig::default(),
            working: None,
            gesture_class: None,
            next_id: 1,
            clock: SessionClock::new(),
        }
    }

    pub fn with_config(mut self, config: ToolConfig) -> Self {
        self.config = config;
        self
    }

    /// Continue numbering after annotations loaded from elsewhere.
    pub fn with_next_id(mut self, next_id: u64) -> Self {
        self.next_id = next_id.max(1);
        self
    }

    pub fn phase(&self) -> CapturePhase {
        if self.working.is_some() {
            CapturePhase::Active
        } else {
            CapturePhase::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase() == CapturePhase::Active
    }

    pub fn working(&self) -> Option<&WorkingGeometry> {
        self.working.as_ref()
    }

    pub fn active_tool(&self) -> ToolId {
        self.active_tool
    }

    pub fn active_class(&self) -> Option<ActiveClass> {
        self.active_class
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Never hand out ids below `next_id`. Ids only move forward.
    pub fn reserve_ids_below(&mut self, next_id: u64) {
        self.next_id = self.next_id.max(next_id);
    }

    /// Time since the session started.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn ensure_idle(&self, what: &str) -> Result<(), ValidationError> {
        if self.is_active() {
            log::warn!("Ignoring {} change while a gesture is active", what);
            return Err(ValidationError::SelectionLocked);
        }
        Ok(())
    }

    pub fn set_tool(&mut self, tool: ToolId) -> Result<(), ValidationError> {
        self.ensure_idle("tool")?;
        if self.active_tool != tool {
            log::debug!("🔧 Tool: {}", tool.name());
        }
        self.active_tool = tool;
        Ok(())
    }

    /// Select a class, or `None` for "no finding".
    pub fn set_class(&mut self, class: Option<ActiveClass>) -> Result<(), ValidationError> {
        self.ensure_idle("class")?;
        self.active_class = class;
        log::debug!("🏷️ Class: {:?}", class.map(|c| c.id));
        Ok(())
    }

    pub fn set_polarity(&mut self, polarity: Polarity) -> Result<(), ValidationError> {
        self.ensure_idle("polarity")?;
        self.config.polarity = polarity;
        Ok(())
    }

    pub fn toggle_polarity(&mut self) -> Result<Polarity, ValidationError> {
        let next = self.config.polarity.toggled();
        self.set_polarity(next)?;
        Ok(next)
    }

    /// Set the brush radius, clamped to the brush range.
    pub fn set_radius(&mut self, radius: f64) -> Result<f64, ValidationError> {
        self.ensure_idle("radius")?;
        let applied = ToolConfig::clamp_radius(radius)?;
        self.config.radius = applied;
        Ok(applied)
    }

    pub fn grow_radius(&mut self) -> Result<f64, ValidationError> {
        self.set_radius((self.config.radius + 1.0).min(MAX_STROKE_RADIUS))
    }

    pub fn shrink_radius(&mut self) -> Result<f64, ValidationError> {
        self.set_radius((self.config.radius - 1.0).max(MIN_STROKE_RADIUS))
    }

    /// Feed one image-space event through the active tool.
    ///
    /// Only a gesture start without a selected class is an error; degenerate
    /// geometry is reported as [`CaptureOutcome::Discarded`].
    pub fn handle(
        &mut self,
        event: &GestureEvent,
        registry: &ToolRegistry,
    ) -> Result<CaptureOutcome, ValidationError> {
        let Some(tool) = registry.get(self.active_tool) else {
            return Ok(CaptureOutcome::Ignored);
        };

        let Some(mut working) = self.working.take() else {
            if !tool.starts_gesture(event) {
                return Ok(CaptureOutcome::Ignored);
            }
            let Some(class) = self.active_class else {
                log::warn!("⚠️ {} gesture rejected: no class selected", tool.id().name());
                return Err(ValidationError::NoClassSelected);
            };
            self.working = Some(tool.on_gesture_start(event, &self.config));
            self.gesture_class = Some(class);
            return Ok(CaptureOutcome::Started);
        };

        match tool.on_gesture_update(&mut working, event) {
            GestureStep::Continue => {
                self.working = Some(working);
                Ok(CaptureOutcome::Updated)
            }
            GestureStep::Cancel => {
                tool.on_cancel(&working);
                self.gesture_class = None;
                Ok(CaptureOutcome::Cancelled)
            }
            GestureStep::End { close } => {
                let class = self.gesture_class.take().or(self.active_class);
                match (tool.on_gesture_end(working, close), class) {
                    (Ok(shape), Some(class)) => {
                        let id = AnnotationId(self.next_id);
                        self.next_id += 1;
                        log::debug!(
                            "✅ Committed {} {} with {} points (class {})",
                            shape.kind(),
                            id,
                            shape.points().len(),
                            class.id
                        );
                        Ok(CaptureOutcome::Committed(Annotation::new(
                            id,
                            class.id,
                            class.color,
                            self.clock.now(),
                            shape,
                        )))
                    }
                    (Ok(_), None) => Ok(CaptureOutcome::Discarded(ValidationError::NoClassSelected)),
                    (Err(e), _) => {
                        log::debug!("🗑️ Gesture discarded: {}", e);
                        Ok(CaptureOutcome::Discarded(e))
                    }
                }
            }
        }
    }

    /// Discard any in-flight gesture. Returns whether one was discarded.
    pub fn cancel(&mut self, registry: &ToolRegistry) -> bool {
        let Some(working) = self.working.take() else {
            return false;
        };
        if let Some(tool) = registry.get(self.active_tool) {
            tool.on_cancel(&working);
        }
        self.gesture_class = None;
        true
    }

    /// Draw the in-flight geometry, if any.
    pub fn render(&self, registry: &ToolRegistry, canvas: &mut dyn Canvas, view: &ViewportTransform) {
        if let (Some(working), Some(tool)) = (&self.working, registry.get(self.active_tool)) {
            tool.render(working, canvas, view);
        }
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::Point;
    use crate::model::AnnotationShape;

    use crate::capture::PointerButton;

    const CLASS: ActiveClass = ActiveClass {
        id: 3,
        color: Color([0xff, 0x99, 0x00]),
    };

    fn session(tool: ToolId) -> CaptureSession {
        let mut s = CaptureSession::new();
        s.set_tool(tool).unwrap();
        s.set_class(Some(CLASS)).unwrap();
        s
    }

    fn down(x: f64, y: f64) -> GestureEvent {
        GestureEvent::PointerDown {
            pos: Point::new(x, y),
            button: PointerButton::Primary,
        }
    }

    fn drag(x: f64, y: f64) -> GestureEvent {
        GestureEvent::PointerMove {
            pos: Point::new(x, y),
            primary_held: true,
        }
    }

    fn up(x: f64, y: f64) -> GestureEvent {
        GestureEvent::PointerUp {
            pos: Point::new(x, y),
            button: PointerButton::Primary,
        }
    }

    fn click(x: f64, y: f64) -> GestureEvent {
        GestureEvent::Click {
            pos: Point::new(x, y),
            button: PointerButton::Primary,
        }
    }

    fn feed(
        s: &mut CaptureSession,
        registry: &ToolRegistry,
        events: &[GestureEvent],
    ) -> Vec<CaptureOutcome> {
        events
            .iter()
            .map(|e| s.handle(e, registry).unwrap())
            .collect()
    }

    #[test]
    fn test_stroke_with_three_moves() {
        let registry = ToolRegistry::new();
        let mut s = session(ToolId::Stroke);
        s.set_polarity(Polarity::Negative).unwrap();

        let outcomes = feed(
            &mut s,
            &registry,
            &[
                down(0.0, 0.0),
                drag(1.0, 1.0),
                drag(2.0, 3.0),
                drag(4.0, 5.0),
                up(4.0, 5.0),
            ],
        );
        assert_eq!(outcomes[0], CaptureOutcome::Started);
        assert_eq!(s.phase(), CapturePhase::Idle);

        let CaptureOutcome::Committed(annotation) = &outcomes[4] else {
            panic!("expected commit, got {:?}", outcomes[4]);
        };
        assert_eq!(annotation.class_id(), 3);
        assert_eq!(annotation.color(), CLASS.color);
        match annotation.shape() {
            AnnotationShape::Stroke(stroke) => {
                assert_eq!(
                    stroke.points(),
                    &[
                        Point::new(1.0, 1.0),
                        Point::new(2.0, 3.0),
                        Point::new(4.0, 5.0)
                    ]
                );
                assert_eq!(stroke.polarity(), Polarity::Negative);
                assert_eq!(stroke.radius(), 5.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_no_class_rejects_gesture_start() {
        let registry = ToolRegistry::new();
        for tool in [ToolId::Stroke, ToolId::Polyline] {
            let mut s = CaptureSession::new();
            s.set_tool(tool).unwrap();
            let start = if tool == ToolId::Stroke {
                down(1.0, 1.0)
            } else {
                click(1.0, 1.0)
            };
            assert_eq!(
                s.handle(&start, &registry),
                Err(ValidationError::NoClassSelected)
            );
            assert_eq!(s.phase(), CapturePhase::Idle);
            assert!(s.working().is_none());
        }
    }

    #[test]
    fn test_zero_movement_tap_is_discarded() {
        let registry = ToolRegistry::new();
        let mut s = session(ToolId::Stroke);
        let outcomes = feed(&mut s, &registry, &[down(1.0, 1.0), up(1.0, 1.0)]);
        assert!(matches!(outcomes[1], CaptureOutcome::Discarded(_)));
        assert_eq!(s.phase(), CapturePhase::Idle);
    }

    #[test]
    fn test_polyline_single_vertex_discarded() {
        let registry = ToolRegistry::new();
        let mut s = session(ToolId::Polyline);
        let outcomes = feed(
            &mut s,
            &registry,
            &[
                click(5.0, 5.0),
                GestureEvent::DoubleClick {
                    pos: Point::new(5.0, 5.0),
                },
            ],
        );
        assert_eq!(
            outcomes[1],
            CaptureOutcome::Discarded(ValidationError::degenerate("polyline", 1, 2))
        );
        assert_eq!(s.phase(), CapturePhase::Idle);
    }

    #[test]
    fn test_polyline_three_clicks_then_double_click() {
        let registry = ToolRegistry::new();
        let mut s = session(ToolId::Polyline);
        let outcomes = feed(
            &mut s,
            &registry,
            &[
                click(0.0, 0.0),
                click(10.0, 0.0),
                click(10.0, 10.0),
                GestureEvent::DoubleClick {
                    pos: Point::new(10.0, 10.0),
                },
            ],
        );
        let CaptureOutcome::Committed(annotation) = &outcomes[3] else {
            panic!("expected commit");
        };
        match annotation.shape() {
            AnnotationShape::Polyline(p) => {
                assert_eq!(p.points().len(), 3);
                assert!(!p.closed());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_selection_locked_while_active() {
        let registry = ToolRegistry::new();
        let mut s = session(ToolId::Stroke);
        s.handle(&down(0.0, 0.0), &registry).unwrap();
        assert!(s.is_active());

        assert_eq!(s.set_tool(ToolId::Polyline), Err(ValidationError::SelectionLocked));
        assert_eq!(s.set_class(None), Err(ValidationError::SelectionLocked));
        assert_eq!(
            s.set_polarity(Polarity::Negative),
            Err(ValidationError::SelectionLocked)
        );
        assert_eq!(s.grow_radius(), Err(ValidationError::SelectionLocked));
        assert_eq!(s.active_tool(), ToolId::Stroke);
        assert_eq!(s.active_class(), Some(CLASS));
        assert_eq!(s.config().polarity, Polarity::Positive);

        s.handle(&drag(1.0, 1.0), &registry).unwrap();
        s.handle(&up(1.0, 1.0), &registry).unwrap();
        assert!(s.set_tool(ToolId::Polyline).is_ok());
    }

    #[test]
    fn test_cancel_discards() {
        let registry = ToolRegistry::new();
        let mut s = session(ToolId::Polyline);
        feed(&mut s, &registry, &[click(0.0, 0.0), click(1.0, 1.0)]);
        assert_eq!(
            s.handle(&GestureEvent::Cancel, &registry),
            Ok(CaptureOutcome::Cancelled)
        );
        assert_eq!(s.phase(), CapturePhase::Idle);

        // Cancel from idle is a no-op
        assert_eq!(
            s.handle(&GestureEvent::Cancel, &registry),
            Ok(CaptureOutcome::Ignored)
        );
        assert!(!s.cancel(&registry));

        s.handle(&click(0.0, 0.0), &registry).unwrap();
        assert!(s.cancel(&registry));
        assert!(s.working().is_none());
    }

    #[test]
    fn test_radius_clamped() {
        let mut s = CaptureSession::new();
        assert_eq!(s.set_radius(50.0), Ok(20.0));
        assert_eq!(s.grow_radius(), Ok(20.0));
        assert_eq!(s.set_radius(0.0), Ok(1.0));
        assert_eq!(s.shrink_radius(), Ok(1.0));
        assert!(matches!(
            s.set_radius(f64::NAN),
            Err(ValidationError::InvalidRadius(_))
        ));
        assert_eq!(s.config().radius, 1.0);
    }

    #[test]
    fn test_ids_increase() {
        let registry = ToolRegistry::new();
        let mut s = session(ToolId::Stroke).with_next_id(10);
        let mut ids = Vec::new();
        for _ in 0..2 {
            let outcomes = feed(&mut s, &registry, &[down(0.0, 0.0), drag(1.0, 1.0), up(1.0, 1.0)]);
            if let CaptureOutcome::Committed(a) = &outcomes[2] {
                ids.push(a.id());
            }
        }
        assert_eq!(ids, vec![AnnotationId(10), AnnotationId(11)]);
    }

    #[test]
    fn test_view_tools_ignore_events() {
        let registry = ToolRegistry::new();
        let mut s = session(ToolId::Pan);
        assert_eq!(s.handle(&down(0.0, 0.0), &registry), Ok(CaptureOutcome::Ignored));
        assert_eq!(s.phase(), CapturePhase::Idle);
    }
}
