//! Global constants for the NEOCXR viewer

/// Smallest allowed view scale
pub const MIN_SCALE: f64 = 0.1;

/// Largest allowed view scale
pub const MAX_SCALE: f64 = 10.0;

/// Multiplier applied by a zoom-in command (zoom-out uses its reciprocal)
pub const ZOOM_STEP: f64 = 1.25;

/// Smallest usable window width
pub const MIN_WINDOW_WIDTH: f64 = 1.0;

/// Stroke radius used until the user changes it
pub const DEFAULT_STROKE_RADIUS: f64 = 5.0;

/// Stroke radius range reachable from the bracket keys
pub const MIN_STROKE_RADIUS: f64 = 1.0;
pub const MAX_STROKE_RADIUS: f64 = 20.0;

/// Polyline line width in screen pixels
pub const POLYLINE_WIDTH: f32 = 2.0;

/// Polyline vertex handle radius in screen pixels
pub const POLYLINE_HANDLE_RADIUS: f32 = 4.0;

/// Alpha applied to committed stroke colors
pub const STROKE_ALPHA: u8 = 128;

/// Alpha applied to in-progress geometry
pub const WORKING_ALPHA: u8 = 160;

/// Dash pattern for in-progress geometry (on, off) in screen pixels
pub const WORKING_DASH: [f32; 2] = [6.0, 4.0];

/// Window/level change per dragged screen pixel
pub const DEFAULT_WL_SENSITIVITY: f64 = 1.0;

/// Zoom drag: scale multiplier per dragged screen pixel (exponent base)
pub const ZOOM_DRAG_RATE: f64 = 0.01;

/// Maximum number of undone annotations kept for redo
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Background fill for the viewport
pub const BACKGROUND_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Placeholder fill while no image is loaded
pub const PLACEHOLDER_COLOR: [u8; 4] = [24, 24, 28, 255];
