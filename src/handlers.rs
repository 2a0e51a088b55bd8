//! Input handlers for the viewer.
//!
//! Hosts translate their native events into [`InputEvent`]s in screen pixels
//! and pass them to [`handle_input`]. Drawing tools receive the event in image
//! space; view tools (pan, zoom, window/level) change the viewport directly.
//! Saving and completing are async and stay with the host: the handlers only
//! report them as [`Feedback::SaveRequested`] and [`Feedback::CompleteRequested`].

use crate::capture::{CaptureOutcome, GestureEvent, PointerButton, ToolId};
use crate::constants::{MAX_SCALE, MIN_SCALE, ZOOM_DRAG_RATE};
use crate::error::ValidationError;
use crate::geometry::Point;
use crate::keybindings::{Action, KeyChord};
use crate::session::ViewingSession;
use crate::viewport::ViewportPatch;

/// Screen-space input from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Point, button: PointerButton },
    PointerMove { pos: Point, primary_held: bool },
    PointerUp { pos: Point, button: PointerButton },
    Click { pos: Point, button: PointerButton },
    DoubleClick { pos: Point },
    /// Wheel steps, positive away from the user (zoom in)
    Wheel { pos: Point, delta: f64 },
    Key(KeyChord),
}

/// What an input changed, for the host to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Ignored,
    ViewChanged,
    Capture(CaptureOutcome),
    SelectionChanged,
    HistoryChanged,
    Rejected(ValidationError),
    SaveRequested,
    CompleteRequested,
}

/// Which view interaction a drag drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Pan,
    Zoom,
    WindowLevel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ViewDrag {
    mode: DragMode,
    /// Only this button's release ends the drag
    button: PointerButton,
    /// Where the drag started, the zoom anchor
    origin: Point,
    last: Point,
}

/// Drag tracking for view tools.
#[derive(Debug, Default)]
pub struct DragState {
    active: Option<ViewDrag>,
}

impl DragState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn mode(&self) -> Option<DragMode> {
        self.active.map(|d| d.mode)
    }

    /// Button that started the current drag.
    pub fn button(&self) -> Option<PointerButton> {
        self.active.map(|d| d.button)
    }

    fn start(&mut self, mode: DragMode, button: PointerButton, pos: Point) {
        self.active = Some(ViewDrag {
            mode,
            button,
            origin: pos,
            last: pos,
        });
    }

    /// Delta since the last update, `None` when not dragging.
    fn update(&mut self, pos: Point) -> Option<(ViewDrag, Point)> {
        let drag = self.active.as_mut()?;
        let delta = pos - drag.last;
        drag.last = pos;
        Some((*drag, delta))
    }

    fn end(&mut self) {
        self.active = None;
    }
}

fn drag_mode_for(tool: ToolId) -> Option<DragMode> {
    match tool {
        ToolId::Pan => Some(DragMode::Pan),
        ToolId::Zoom => Some(DragMode::Zoom),
        ToolId::WindowLevel => Some(DragMode::WindowLevel),
        _ => None,
    }
}

/// Handle one input event.
pub fn handle_input(
    session: &mut ViewingSession,
    drag: &mut DragState,
    event: InputEvent,
) -> Feedback {
    match event {
        InputEvent::Key(chord) => handle_key(session, chord),
        InputEvent::Wheel { pos, delta } => handle_wheel(session, pos, delta),
        _ => handle_pointer(session, drag, event),
    }
}

fn handle_pointer(session: &mut ViewingSession, drag: &mut DragState, event: InputEvent) -> Feedback {
    if session.transform().is_none() {
        return Feedback::Ignored;
    }

    let tool = session.capture().active_tool();
    match event {
        // Middle button pans with any tool
        InputEvent::PointerDown {
            pos,
            button: PointerButton::Middle,
        } => {
            drag.start(DragMode::Pan, PointerButton::Middle, pos);
            log::debug!("Pan drag started at ({:.1}, {:.1})", pos.x, pos.y);
            return Feedback::Ignored;
        }
        InputEvent::PointerDown {
            pos,
            button: PointerButton::Primary,
        } => {
            if let Some(mode) = drag_mode_for(tool) {
                drag.start(mode, PointerButton::Primary, pos);
                log::debug!("{:?} drag started at ({:.1}, {:.1})", mode, pos.x, pos.y);
                return Feedback::Ignored;
            }
        }
        InputEvent::PointerMove { pos, .. } if drag.is_dragging() => {
            return handle_view_drag(session, drag, pos);
        }
        InputEvent::PointerUp { button, .. } if drag.button() == Some(button) => {
            drag.end();
            log::debug!("View drag ended");
            return Feedback::Ignored;
        }
        _ => {}
    }

    if !tool.is_drawing_tool() {
        return Feedback::Ignored;
    }
    match to_gesture(session, event) {
        Some(gesture) => capture_feedback(session.handle_gesture(&gesture)),
        None => Feedback::Ignored,
    }
}

/// Map a screen-space pointer event into image space.
fn to_gesture(session: &ViewingSession, event: InputEvent) -> Option<GestureEvent> {
    let view = session.transform()?;
    let to_image = |p: Point| view.inverse(p);

    Some(match event {
        InputEvent::PointerDown { pos, button } => GestureEvent::PointerDown {
            pos: to_image(pos),
            button,
        },
        InputEvent::PointerMove { pos, primary_held } => GestureEvent::PointerMove {
            pos: to_image(pos),
            primary_held,
        },
        InputEvent::PointerUp { pos, button } => GestureEvent::PointerUp {
            pos: to_image(pos),
            button,
        },
        InputEvent::Click { pos, button } => GestureEvent::Click {
            pos: to_image(pos),
            button,
        },
        InputEvent::DoubleClick { pos } => GestureEvent::DoubleClick { pos: to_image(pos) },
        InputEvent::Wheel { .. } | InputEvent::Key(_) => return None,
    })
}

fn capture_feedback(result: Result<CaptureOutcome, ValidationError>) -> Feedback {
    match result {
        Ok(CaptureOutcome::Ignored) => Feedback::Ignored,
        Ok(outcome) => Feedback::Capture(outcome),
        Err(e) => Feedback::Rejected(e),
    }
}

/// Apply a view-tool drag move.
pub fn handle_view_drag(session: &mut ViewingSession, drag: &mut DragState, pos: Point) -> Feedback {
    let sensitivity = session.config().preferences.wl_sensitivity;
    let Some((state, delta)) = drag.update(pos) else {
        return Feedback::Ignored;
    };
    if delta.x == 0.0 && delta.y == 0.0 {
        return Feedback::Ignored;
    }
    let Some(view) = session.transform_mut() else {
        return Feedback::Ignored;
    };

    match state.mode {
        DragMode::Pan => {
            view.pan_by(delta.x, delta.y);
            log::trace!("🖐️ Panning by ({:.1}, {:.1})", delta.x, delta.y);
        }
        DragMode::Zoom => {
            // Dragging up zooms in
            let factor = (-delta.y * ZOOM_DRAG_RATE).exp();
            let scale = (view.state().scale * factor).clamp(MIN_SCALE, MAX_SCALE);
            view.zoom_at(state.origin, scale);
            log::trace!("🔍 Drag zoom: {:.2}x", view.state().scale);
        }
        DragMode::WindowLevel => {
            // Horizontal drag widens the window, vertical drag moves the level
            view.adjust_window(delta.x * sensitivity, delta.y * sensitivity);
            let voi = view.state().voi;
            log::trace!("🎚️ W/L {:.0}/{:.0}", voi.window_width, voi.window_center);
        }
    }
    Feedback::ViewChanged
}

fn handle_wheel(session: &mut ViewingSession, pos: Point, delta: f64) -> Feedback {
    let step = session.config().preferences.zoom_step;
    let Some(view) = session.transform_mut() else {
        return Feedback::Ignored;
    };
    if delta == 0.0 || !delta.is_finite() {
        return Feedback::Ignored;
    }

    let scale = (view.state().scale * step.powf(delta)).clamp(MIN_SCALE, MAX_SCALE);
    view.zoom_at(pos, scale);
    log::debug!("🔍 Zoom-to-cursor: {:.2}x at ({:.1}, {:.1})", scale, pos.x, pos.y);
    Feedback::ViewChanged
}

/// Handle a key chord through the configured keybindings.
pub fn handle_key(session: &mut ViewingSession, chord: KeyChord) -> Feedback {
    let Some(action) = session.config().keybindings.action_for(chord) else {
        log::trace!("Unbound key {}", chord);
        return Feedback::Ignored;
    };
    log::debug!("⌨️ {} -> {}", chord, action.description());
    handle_action(session, action)
}

/// Perform an action regardless of how it was triggered.
pub fn handle_action(session: &mut ViewingSession, action: Action) -> Feedback {
    match action {
        Action::SelectTool(tool) => selection(session.capture_mut().set_tool(tool)),
        Action::SelectClass(index) => match session.select_class_index(index) {
            Ok(Some(_)) => Feedback::SelectionChanged,
            Ok(None) => Feedback::Ignored,
            Err(e) => Feedback::Rejected(e),
        },
        Action::NoFinding => selection(session.select_class(None)),
        Action::GrowRadius => selection(session.capture_mut().grow_radius().map(|_| ())),
        Action::ShrinkRadius => selection(session.capture_mut().shrink_radius().map(|_| ())),
        Action::TogglePolarity => selection(session.capture_mut().toggle_polarity().map(|_| ())),
        Action::Undo => {
            let was_active = session.capture().is_active();
            if session.undo().is_some() {
                Feedback::HistoryChanged
            } else if was_active {
                Feedback::Capture(CaptureOutcome::Cancelled)
            } else {
                Feedback::Ignored
            }
        }
        Action::Redo => match session.redo() {
            Some(_) => Feedback::HistoryChanged,
            None => Feedback::Ignored,
        },
        Action::SaveDraft => Feedback::SaveRequested,
        Action::CompleteTask => Feedback::CompleteRequested,
        Action::CancelGesture => {
            if session.cancel_gesture() {
                Feedback::Capture(CaptureOutcome::Cancelled)
            } else {
                Feedback::Ignored
            }
        }
        Action::FinishGesture => capture_feedback(session.handle_gesture(&GestureEvent::Finish { close: false })),
        Action::ClosePolyline => capture_feedback(session.handle_gesture(&GestureEvent::Finish { close: true })),
        view_action => handle_view_action(session, view_action),
    }
}

fn selection(result: Result<(), ValidationError>) -> Feedback {
    match result {
        Ok(()) => Feedback::SelectionChanged,
        Err(e) => {
            log::debug!("Selection change refused: {}", e);
            Feedback::Rejected(e)
        }
    }
}

fn handle_view_action(session: &mut ViewingSession, action: Action) -> Feedback {
    let step = session.config().preferences.zoom_step;
    let preset = match action {
        Action::ApplyPreset(i) => session.config().presets.get(i).cloned(),
        _ => None,
    };
    let viewport_size = session.viewport_size();
    let Some(view) = session.transform_mut() else {
        return Feedback::Ignored;
    };

    match action {
        Action::RotateClockwise => {
            view.rotate_clockwise();
        }
        Action::FlipHorizontal => {
            view.toggle_hflip();
        }
        Action::FlipVertical => {
            view.toggle_vflip();
        }
        Action::ToggleInvert => {
            view.toggle_invert();
        }
        Action::ZoomIn | Action::ZoomOut => {
            let factor = if action == Action::ZoomIn { step } else { 1.0 / step };
            let scale = (view.state().scale * factor).clamp(MIN_SCALE, MAX_SCALE);
            view.zoom_at(view.viewport_size().center(), scale);
            log::debug!("🔍 Zoom: {:.2}x", scale);
        }
        Action::FitToWindow => {
            let image_size = view.image_size();
            view.fit_to_window(viewport_size, image_size);
        }
        Action::ResetView => {
            view.reset();
        }
        Action::ApplyPreset(_) => {
            let Some(preset) = preset else {
                return Feedback::Ignored;
            };
            view.set_partial(ViewportPatch::new().with_voi(preset.voi));
            log::debug!("🎚️ Preset '{}' applied", preset.name);
        }
        _ => return Feedback::Ignored,
    }
    Feedback::ViewChanged
}
