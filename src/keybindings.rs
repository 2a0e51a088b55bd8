//! Customizable keybindings.
//!
//! A binding maps a key chord (key plus modifiers) to an [`Action`]. The
//! bindings are stored in the config file and can be rebound at runtime;
//! [`KeyBindings::key_conflict`] reports which action already owns a chord.

use serde::{Deserialize, Serialize};

use crate::capture::ToolId;

/// Keys the viewer can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    F1,
    F2,
    F3,
    F4,
    F5,
    BracketLeft,
    BracketRight,
    Equals,
    Minus,
    Escape,
    Enter,
    Space,
    Backspace,
    Delete,
    Home,
}

impl Key {
    /// Digit keys 1-9 then 0, in on-screen order.
    pub const DIGITS: [Key; 10] = [
        Key::Key1,
        Key::Key2,
        Key::Key3,
        Key::Key4,
        Key::Key5,
        Key::Key6,
        Key::Key7,
        Key::Key8,
        Key::Key9,
        Key::Key0,
    ];
}

/// A key with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: Key,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
}

impl KeyChord {
    pub const fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
        }
    }

    pub const fn ctrl(key: Key) -> Self {
        Self {
            key,
            ctrl: true,
            shift: false,
        }
    }

    pub const fn ctrl_shift(key: Key) -> Self {
        Self {
            key,
            ctrl: true,
            shift: true,
        }
    }
}

impl std::fmt::Display for KeyChord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        write!(f, "{:?}", self.key)
    }
}

/// Something a key press can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SelectTool(ToolId),
    /// Class by position in the taxonomy (0-based)
    SelectClass(usize),
    /// Clear the class selection ("no finding")
    NoFinding,
    GrowRadius,
    ShrinkRadius,
    TogglePolarity,
    Undo,
    Redo,
    SaveDraft,
    CompleteTask,
    CancelGesture,
    FinishGesture,
    /// Finish the polyline and close it
    ClosePolyline,
    RotateClockwise,
    FlipHorizontal,
    FlipVertical,
    ToggleInvert,
    ZoomIn,
    ZoomOut,
    FitToWindow,
    ResetView,
    /// VOI preset by position in the preset list
    ApplyPreset(usize),
}

impl Action {
    pub fn description(&self) -> String {
        match self {
            Action::SelectTool(tool) => format!("{} tool", tool.name()),
            Action::SelectClass(i) => format!("Class {}", i + 1),
            Action::NoFinding => "No finding".to_string(),
            Action::GrowRadius => "Grow brush".to_string(),
            Action::ShrinkRadius => "Shrink brush".to_string(),
            Action::TogglePolarity => "Toggle polarity".to_string(),
            Action::Undo => "Undo".to_string(),
            Action::Redo => "Redo".to_string(),
            Action::SaveDraft => "Save".to_string(),
            Action::CompleteTask => "Complete task".to_string(),
            Action::CancelGesture => "Cancel".to_string(),
            Action::FinishGesture => "Finish".to_string(),
            Action::ClosePolyline => "Close polyline".to_string(),
            Action::RotateClockwise => "Rotate".to_string(),
            Action::FlipHorizontal => "Flip horizontal".to_string(),
            Action::FlipVertical => "Flip vertical".to_string(),
            Action::ToggleInvert => "Invert".to_string(),
            Action::ZoomIn => "Zoom in".to_string(),
            Action::ZoomOut => "Zoom out".to_string(),
            Action::FitToWindow => "Fit to window".to_string(),
            Action::ResetView => "Reset view".to_string(),
            Action::ApplyPreset(i) => format!("Window preset {}", i + 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub chord: KeyChord,
    pub action: Action,
}

/// Keybinding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    bindings: Vec<Binding>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use Key::*;

        let mut bindings = vec![
            (KeyChord::plain(P), Action::SelectTool(ToolId::Pointer)),
            (KeyChord::plain(B), Action::SelectTool(ToolId::Stroke)),
            (KeyChord::plain(L), Action::SelectTool(ToolId::Polyline)),
            (KeyChord::plain(M), Action::SelectTool(ToolId::Pan)),
            (KeyChord::plain(Z), Action::SelectTool(ToolId::Zoom)),
            (KeyChord::plain(W), Action::SelectTool(ToolId::WindowLevel)),
            (KeyChord::plain(BracketRight), Action::GrowRadius),
            (KeyChord::plain(BracketLeft), Action::ShrinkRadius),
            (KeyChord::plain(X), Action::TogglePolarity),
            (KeyChord::ctrl(Z), Action::Undo),
            (KeyChord::ctrl_shift(Z), Action::Redo),
            (KeyChord::ctrl(S), Action::SaveDraft),
            (KeyChord::ctrl(Enter), Action::CompleteTask),
            (KeyChord::plain(Escape), Action::CancelGesture),
            (KeyChord::plain(Enter), Action::FinishGesture),
            (KeyChord::plain(C), Action::ClosePolyline),
            (KeyChord::plain(R), Action::RotateClockwise),
            (KeyChord::plain(H), Action::FlipHorizontal),
            (KeyChord::plain(V), Action::FlipVertical),
            (KeyChord::plain(I), Action::ToggleInvert),
            (KeyChord::plain(Equals), Action::ZoomIn),
            (KeyChord::plain(Minus), Action::ZoomOut),
            (KeyChord::plain(F), Action::FitToWindow),
            (KeyChord::plain(Home), Action::ResetView),
        ];

        // 1-9 select classes, 0 clears the selection
        for (i, key) in Key::DIGITS[..9].iter().enumerate() {
            bindings.push((KeyChord::plain(*key), Action::SelectClass(i)));
        }
        bindings.push((KeyChord::plain(Key0), Action::NoFinding));

        for (i, key) in [F1, F2, F3, F4, F5].into_iter().enumerate() {
            bindings.push((KeyChord::plain(key), Action::ApplyPreset(i)));
        }

        Self {
            bindings: bindings
                .into_iter()
                .map(|(chord, action)| Binding { chord, action })
                .collect(),
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Action bound to a chord, if any.
    pub fn action_for(&self, chord: KeyChord) -> Option<Action> {
        self.bindings
            .iter()
            .find(|b| b.chord == chord)
            .map(|b| b.action)
    }

    /// Chord bound to an action, if any.
    pub fn chord_for(&self, action: Action) -> Option<KeyChord> {
        self.bindings
            .iter()
            .find(|b| b.action == action)
            .map(|b| b.chord)
    }

    /// Bind a chord to an action. Any previous chord for the action and any
    /// previous action on the chord are dropped.
    pub fn bind(&mut self, chord: KeyChord, action: Action) {
        self.bindings
            .retain(|b| b.chord != chord && b.action != action);
        self.bindings.push(Binding { chord, action });
        log::debug!("⌨️ Bound {} to {}", chord, action.description());
    }

    pub fn unbind(&mut self, action: Action) {
        self.bindings.retain(|b| b.action != action);
    }

    /// Check if a chord is already used by another action.
    pub fn key_conflict(&self, chord: KeyChord, exclude: Option<Action>) -> Option<Action> {
        self.bindings
            .iter()
            .find(|b| b.chord == chord && Some(b.action) != exclude)
            .map(|b| b.action)
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Reset all keybindings to defaults.
    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }
}
