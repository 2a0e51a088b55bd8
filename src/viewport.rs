//! Image-to-screen viewport transform.
//!
//! The forward mapping applies, in this fixed order:
//! 1. horizontal/vertical flip about the image center
//! 2. rotation by a right angle about the image center (clockwise on a y-down screen)
//! 3. uniform scale about the origin
//! 4. translation
//!
//! `screen = s * (R·F·(p - c) + c) + t`
//!
//! The composed affine matrix and its inverse are recomputed on every
//! mutation, so `forward`/`inverse` never observe a stale state. All
//! mutations go through [`ViewportTransform::set_partial`] or the view
//! commands built on it.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_SCALE, MIN_SCALE, MIN_WINDOW_WIDTH, ZOOM_STEP};
use crate::error::TransformError;
use crate::geometry::{Point, Size};
use crate::intensity::Voi;

/// One of the four right-angle rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// Normalize any integer angle modulo 360 and snap it to the nearest right angle.
    /// Halfway angles (45, 135, ...) snap clockwise.
    pub fn from_degrees(degrees: i32) -> Rotation {
        let normalized = degrees.rem_euclid(360);
        match ((normalized + 45) / 90) % 4 {
            0 => Rotation::R0,
            1 => Rotation::R90,
            2 => Rotation::R180,
            _ => Rotation::R270,
        }
    }

    pub fn degrees(&self) -> i32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// The next rotation 90 degrees clockwise.
    pub fn clockwise(&self) -> Rotation {
        Rotation::from_degrees(self.degrees() + 90)
    }

    /// Whether the rotated image's width and height are exchanged.
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Rotation::R90 | Rotation::R270)
    }

    /// Rotation as a 2x2 matrix `[[m00, m01], [m10, m11]]`.
    fn matrix(&self) -> [[f64; 2]; 2] {
        match self {
            Rotation::R0 => [[1.0, 0.0], [0.0, 1.0]],
            Rotation::R90 => [[0.0, -1.0], [1.0, 0.0]],
            Rotation::R180 => [[-1.0, 0.0], [0.0, -1.0]],
            Rotation::R270 => [[0.0, 1.0], [-1.0, 0.0]],
        }
    }
}

/// A 2D affine map `p' = M·p + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub m: [[f64; 2]; 2],
    pub offset: Point,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        m: [[1.0, 0.0], [0.0, 1.0]],
        offset: Point::ORIGIN,
    };

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.m[0][0] * p.x + self.m[0][1] * p.y + self.offset.x,
            self.m[1][0] * p.x + self.m[1][1] * p.y + self.offset.y,
        )
    }

    /// Apply only the linear part (for directions and deltas).
    pub fn apply_vector(&self, v: Point) -> Point {
        Point::new(
            self.m[0][0] * v.x + self.m[0][1] * v.y,
            self.m[1][0] * v.x + self.m[1][1] * v.y,
        )
    }
}

/// The full view state of one loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub scale: f64,
    pub translation: Point,
    pub rotation: Rotation,
    pub hflip: bool,
    pub vflip: bool,
    pub voi: Voi,
    pub invert: bool,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translation: Point::ORIGIN,
            rotation: Rotation::R0,
            hflip: false,
            vflip: false,
            voi: Voi::default(),
            invert: false,
        }
    }
}

/// A partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportPatch {
    pub scale: Option<f64>,
    pub translation: Option<Point>,
    /// Degrees; normalized and snapped on apply
    pub rotation: Option<i32>,
    pub hflip: Option<bool>,
    pub vflip: Option<bool>,
    pub window_width: Option<f64>,
    pub window_center: Option<f64>,
    pub invert: Option<bool>,
}

impl ViewportPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_translation(mut self, translation: Point) -> Self {
        self.translation = Some(translation);
        self
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn with_hflip(mut self, hflip: bool) -> Self {
        self.hflip = Some(hflip);
        self
    }

    pub fn with_vflip(mut self, vflip: bool) -> Self {
        self.vflip = Some(vflip);
        self
    }

    pub fn with_voi(mut self, voi: Voi) -> Self {
        self.window_width = Some(voi.window_width);
        self.window_center = Some(voi.window_center);
        self
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = Some(invert);
        self
    }
}

/// Viewport transform for one loaded image.
#[derive(Debug, Clone)]
pub struct ViewportTransform {
    state: ViewportState,
    /// State right after load, restored by `reset`
    defaults: ViewportState,
    image_size: Size,
    viewport_size: Size,
    forward: Affine,
    inverse: Affine,
    revision: u64,
}

impl ViewportTransform {
    /// Create the transform for a freshly loaded image: fitted to the
    /// viewport, unrotated, unflipped, with the given window.
    pub fn for_image(image_size: Size, viewport_size: Size, voi: Voi) -> Self {
        let mut transform = Self {
            state: ViewportState::default(),
            defaults: ViewportState::default(),
            image_size,
            viewport_size,
            forward: Affine::IDENTITY,
            inverse: Affine::IDENTITY,
            revision: 0,
        };

        let mut corrections = transform.set_partial(ViewportPatch::new().with_voi(voi));
        corrections.extend(transform.fit_to_window(viewport_size, image_size));
        for c in &corrections {
            log::warn!("Initial view state corrected: {}", c);
        }

        transform.defaults = transform.state;
        log::debug!(
            "🖼️ Viewport for {}x{} image: scale {:.3}",
            image_size.width,
            image_size.height,
            transform.state.scale
        );
        transform
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn defaults(&self) -> &ViewportState {
        &self.defaults
    }

    pub fn image_size(&self) -> Size {
        self.image_size
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    /// Incremented on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn matrix(&self) -> &Affine {
        &self.forward
    }

    pub fn inverse_matrix(&self) -> &Affine {
        &self.inverse
    }

    /// Map an image-space point to screen space.
    pub fn forward(&self, image_point: Point) -> Point {
        self.forward.apply(image_point)
    }

    /// Map a screen-space point to image space.
    pub fn inverse(&self, screen_point: Point) -> Point {
        self.inverse.apply(screen_point)
    }

    /// Merge a partial update, clamping out-of-range values.
    ///
    /// Returns the corrections that were applied. Non-finite values leave the
    /// field unchanged.
    pub fn set_partial(&mut self, patch: ViewportPatch) -> Vec<TransformError> {
        let mut corrections = Vec::new();
        let mut next = self.state;

        if let Some(scale) = patch.scale {
            if !scale.is_finite() {
                corrections.push(TransformError::NonFinite { field: "scale" });
            } else {
                let applied = scale.clamp(MIN_SCALE, MAX_SCALE);
                if applied != scale {
                    corrections.push(TransformError::Clamped {
                        field: "scale",
                        requested: scale,
                        applied,
                    });
                }
                next.scale = applied;
            }
        }

        if let Some(t) = patch.translation {
            if t.is_finite() {
                next.translation = t;
            } else {
                corrections.push(TransformError::NonFinite {
                    field: "translation",
                });
            }
        }

        if let Some(degrees) = patch.rotation {
            let rotation = Rotation::from_degrees(degrees);
            if rotation.degrees() != degrees {
                corrections.push(TransformError::Clamped {
                    field: "rotation",
                    requested: degrees as f64,
                    applied: rotation.degrees() as f64,
                });
            }
            next.rotation = rotation;
        }

        if let Some(hflip) = patch.hflip {
            next.hflip = hflip;
        }
        if let Some(vflip) = patch.vflip {
            next.vflip = vflip;
        }

        if let Some(width) = patch.window_width {
            if !width.is_finite() {
                corrections.push(TransformError::NonFinite {
                    field: "window_width",
                });
            } else if width < MIN_WINDOW_WIDTH {
                corrections.push(TransformError::Clamped {
                    field: "window_width",
                    requested: width,
                    applied: MIN_WINDOW_WIDTH,
                });
                next.voi.window_width = MIN_WINDOW_WIDTH;
            } else {
                next.voi.window_width = width;
            }
        }

        if let Some(center) = patch.window_center {
            if center.is_finite() {
                next.voi.window_center = center;
            } else {
                corrections.push(TransformError::NonFinite {
                    field: "window_center",
                });
            }
        }

        if let Some(invert) = patch.invert {
            next.invert = invert;
        }

        for c in &corrections {
            log::warn!("Viewport change corrected: {}", c);
        }

        self.state = next;
        self.recompute();
        corrections
    }

    /// Restore the state captured right after the image was loaded.
    pub fn reset(&mut self) {
        self.state = self.defaults;
        self.recompute();
        log::debug!("🔄 Viewport reset");
    }

    /// Scale and center the image so it is fully visible in the viewport.
    /// Rotation, flips, window and invert are kept.
    pub fn fit_to_window(&mut self, viewport_size: Size, image_size: Size) -> Vec<TransformError> {
        self.viewport_size = viewport_size;
        self.image_size = image_size;

        if viewport_size.is_empty() || image_size.is_empty() {
            log::warn!(
                "Cannot fit {:?} into {:?}, keeping current scale",
                image_size,
                viewport_size
            );
            self.recompute();
            return Vec::new();
        }

        let rotated = if self.state.rotation.swaps_axes() {
            image_size.transposed()
        } else {
            image_size
        };
        let scale = (viewport_size.width / rotated.width).min(viewport_size.height / rotated.height);

        let mut corrections = self.set_partial(ViewportPatch::new().with_scale(scale));
        corrections.extend(self.center_image());
        corrections
    }

    /// Translate so the image center sits at the viewport center.
    fn center_image(&mut self) -> Vec<TransformError> {
        let translation =
            self.viewport_size.center() - self.image_size.center() * self.state.scale;
        self.set_partial(ViewportPatch::new().with_translation(translation))
    }

    /// Update the viewport size without refitting.
    pub fn set_viewport_size(&mut self, viewport_size: Size) {
        self.viewport_size = viewport_size;
        self.recompute();
    }

    /// Change scale while keeping the image point under `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, new_scale: f64) -> Vec<TransformError> {
        let anchor = self.inverse(screen_point);
        let mut corrections = self.set_partial(ViewportPatch::new().with_scale(new_scale));

        // Where the anchor lands with the new scale and the old translation
        let landed = self.forward(anchor);
        let translation = self.state.translation + (screen_point - landed);
        corrections.extend(self.set_partial(ViewportPatch::new().with_translation(translation)));
        corrections
    }

    /// Apply a pan delta in screen pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Vec<TransformError> {
        let translation = self.state.translation + Point::new(dx, dy);
        self.set_partial(ViewportPatch::new().with_translation(translation))
    }

    /// Zoom in one step about the viewport center.
    pub fn zoom_in(&mut self) -> Vec<TransformError> {
        let scale = (self.state.scale * ZOOM_STEP).min(MAX_SCALE);
        self.zoom_at(self.viewport_size.center(), scale)
    }

    /// Zoom out one step about the viewport center.
    pub fn zoom_out(&mut self) -> Vec<TransformError> {
        let scale = (self.state.scale / ZOOM_STEP).max(MIN_SCALE);
        self.zoom_at(self.viewport_size.center(), scale)
    }

    pub fn rotate_clockwise(&mut self) -> Vec<TransformError> {
        let next = self.state.rotation.clockwise();
        self.set_partial(ViewportPatch::new().with_rotation(next.degrees()))
    }

    pub fn toggle_hflip(&mut self) -> Vec<TransformError> {
        self.set_partial(ViewportPatch::new().with_hflip(!self.state.hflip))
    }

    pub fn toggle_vflip(&mut self) -> Vec<TransformError> {
        self.set_partial(ViewportPatch::new().with_vflip(!self.state.vflip))
    }

    pub fn toggle_invert(&mut self) -> Vec<TransformError> {
        self.set_partial(ViewportPatch::new().with_invert(!self.state.invert))
    }

    /// Shift the window by deltas (window/level drag).
    pub fn adjust_window(&mut self, d_width: f64, d_center: f64) -> Vec<TransformError> {
        let voi = Voi::new(
            self.state.voi.window_width + d_width,
            self.state.voi.window_center + d_center,
        );
        self.set_partial(ViewportPatch::new().with_voi(voi))
    }

    /// Move the image back to the viewport center without changing scale.
    pub fn reset_translation(&mut self) -> Vec<TransformError> {
        self.center_image()
    }

    fn recompute(&mut self) {
        let s = self.state.scale;
        let c = self.image_size.center();
        let r = self.state.rotation.matrix();
        let fx = if self.state.hflip { -1.0 } else { 1.0 };
        let fy = if self.state.vflip { -1.0 } else { 1.0 };

        // R·F
        let rf = [[r[0][0] * fx, r[0][1] * fy], [r[1][0] * fx, r[1][1] * fy]];
        let rf_c = Point::new(
            rf[0][0] * c.x + rf[0][1] * c.y,
            rf[1][0] * c.x + rf[1][1] * c.y,
        );

        self.forward = Affine {
            m: [
                [s * rf[0][0], s * rf[0][1]],
                [s * rf[1][0], s * rf[1][1]],
            ],
            offset: (c - rf_c) * s + self.state.translation,
        };

        // R·F is orthogonal, so its inverse is its transpose
        let inv_m = [
            [rf[0][0] / s, rf[1][0] / s],
            [rf[0][1] / s, rf[1][1] / s],
        ];
        let o = self.forward.offset;
        self.inverse = Affine {
            m: inv_m,
            offset: Point::new(
                -(inv_m[0][0] * o.x + inv_m[0][1] * o.y),
                -(inv_m[1][0] * o.x + inv_m[1][1] * o.y),
            ),
        };

        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn approx_pt(a: Point, b: Point) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
    }

    fn transform(w: f64, h: f64) -> ViewportTransform {
        ViewportTransform::for_image(
            Size::new(w, h),
            Size::new(800.0, 600.0),
            Voi::default(),
        )
    }

    #[test]
    fn test_fit_to_window_scenario() {
        let mut t = transform(10.0, 10.0);
        let corrections = t.fit_to_window(Size::new(800.0, 600.0), Size::new(2000.0, 1500.0));
        assert!(corrections.is_empty());
        assert!(approx_eq(t.state().scale, 0.4));
        assert!(approx_pt(t.forward(Point::new(0.0, 0.0)), Point::new(0.0, 0.0)));
        assert!(approx_pt(
            t.forward(Point::new(2000.0, 1500.0)),
            Point::new(800.0, 600.0)
        ));
        assert!(approx_pt(
            t.forward(Point::new(1000.0, 750.0)),
            Point::new(400.0, 300.0)
        ));
    }

    #[test]
    fn test_fit_to_window_accounts_for_rotation() {
        let mut t = transform(2000.0, 1500.0);
        t.rotate_clockwise();
        t.fit_to_window(Size::new(800.0, 600.0), Size::new(2000.0, 1500.0));
        // Rotated image is 1500 wide, 2000 tall
        assert!(approx_eq(t.state().scale, 0.3));
        assert!(approx_pt(
            t.forward(Point::new(1000.0, 750.0)),
            Point::new(400.0, 300.0)
        ));
        assert_eq!(t.state().rotation, Rotation::R90);
    }

    #[test]
    fn test_fit_keeps_view_flags() {
        let mut t = transform(100.0, 100.0);
        t.set_partial(
            ViewportPatch::new()
                .with_hflip(true)
                .with_invert(true)
                .with_voi(Voi::new(400.0, 40.0)),
        );
        t.fit_to_window(Size::new(300.0, 200.0), Size::new(100.0, 100.0));
        assert!(t.state().hflip);
        assert!(t.state().invert);
        assert_eq!(t.state().voi, Voi::new(400.0, 40.0));
        assert!(approx_eq(t.state().scale, 2.0));
    }

    #[test]
    fn test_forward_order_flip_then_rotate() {
        let mut t = transform(100.0, 50.0);
        t.set_partial(
            ViewportPatch::new()
                .with_scale(1.0)
                .with_translation(Point::ORIGIN),
        );

        // Plain identity
        assert!(approx_pt(t.forward(Point::new(3.0, 4.0)), Point::new(3.0, 4.0)));

        // Horizontal flip about the center x = 50
        t.set_partial(ViewportPatch::new().with_hflip(true));
        assert!(approx_pt(t.forward(Point::new(0.0, 0.0)), Point::new(100.0, 0.0)));

        // Rotation 90 clockwise about (50, 25): top-left corner goes to top-right
        t.set_partial(ViewportPatch::new().with_hflip(false).with_rotation(90));
        assert!(approx_pt(t.forward(Point::new(0.0, 0.0)), Point::new(75.0, -25.0)));

        // Flip is applied before rotation
        t.set_partial(ViewportPatch::new().with_hflip(true));
        assert!(approx_pt(t.forward(Point::new(0.0, 0.0)), Point::new(75.0, 75.0)));
    }

    #[test]
    fn test_round_trip_all_states() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(123.456, -78.9),
            Point::new(-5000.25, 2500.5),
            Point::new(511.0, 511.0),
        ];
        let mut t = transform(512.0, 384.0);

        for degrees in [0, 90, 180, 270] {
            for hflip in [false, true] {
                for vflip in [false, true] {
                    for scale in [0.1, 0.37, 1.0, 4.2, 10.0] {
                        t.set_partial(
                            ViewportPatch::new()
                                .with_rotation(degrees)
                                .with_hflip(hflip)
                                .with_vflip(vflip)
                                .with_scale(scale)
                                .with_translation(Point::new(-31.5, 217.25)),
                        );
                        for p in points {
                            assert!(approx_pt(t.inverse(t.forward(p)), p));
                            assert!(approx_pt(t.forward(t.inverse(p)), p));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_scale_clamping() {
        let mut t = transform(100.0, 100.0);
        for (requested, expected) in [(0.0, 0.1), (-3.0, 0.1), (0.01, 0.1), (25.0, 10.0)] {
            let corrections = t.set_partial(ViewportPatch::new().with_scale(requested));
            assert!(approx_eq(t.state().scale, expected));
            assert_eq!(
                corrections,
                vec![TransformError::Clamped {
                    field: "scale",
                    requested,
                    applied: expected
                }]
            );
        }

        let corrections = t.set_partial(ViewportPatch::new().with_scale(2.5));
        assert!(corrections.is_empty());
        assert!(approx_eq(t.state().scale, 2.5));
    }

    #[test]
    fn test_non_finite_values_keep_previous() {
        let mut t = transform(100.0, 100.0);
        let before = *t.state();
        let corrections = t.set_partial(
            ViewportPatch::new()
                .with_scale(f64::NAN)
                .with_translation(Point::new(f64::INFINITY, 0.0))
                .with_voi(Voi::new(f64::NAN, f64::NEG_INFINITY)),
        );
        assert_eq!(corrections.len(), 4);
        assert_eq!(*t.state(), before);
    }

    #[test]
    fn test_window_width_clamped() {
        let mut t = transform(100.0, 100.0);
        t.set_partial(ViewportPatch::new().with_voi(Voi::new(0.0, 40.0)));
        assert_eq!(t.state().voi, Voi::new(1.0, 40.0));
        t.set_partial(ViewportPatch::new().with_voi(Voi::new(-200.0, 40.0)));
        assert_eq!(t.state().voi.window_width, 1.0);
    }

    #[test]
    fn test_rotation_normalization() {
        let cases = [
            (0, Rotation::R0),
            (90, Rotation::R90),
            (-90, Rotation::R270),
            (450, Rotation::R90),
            (360, Rotation::R0),
            (720, Rotation::R0),
            (44, Rotation::R0),
            (45, Rotation::R90),
            (-45, Rotation::R0),
            (200, Rotation::R180),
            (314, Rotation::R270),
            (315, Rotation::R0),
            (i32::MIN, Rotation::R270),
        ];
        for (degrees, expected) in cases {
            assert_eq!(Rotation::from_degrees(degrees), expected, "{degrees}");
        }
    }

    #[test]
    fn test_rotate_clockwise_wraps() {
        let mut t = transform(100.0, 100.0);
        for expected in [Rotation::R90, Rotation::R180, Rotation::R270, Rotation::R0] {
            t.rotate_clockwise();
            assert_eq!(t.state().rotation, expected);
        }
    }

    #[test]
    fn test_reset_restores_post_load_state() {
        let mut t = ViewportTransform::for_image(
            Size::new(2000.0, 1500.0),
            Size::new(800.0, 600.0),
            Voi::new(400.0, 40.0),
        );
        let loaded = *t.state();

        t.zoom_in();
        t.pan_by(30.0, -12.0);
        t.rotate_clockwise();
        t.toggle_hflip();
        t.toggle_invert();
        t.adjust_window(100.0, -20.0);
        assert_ne!(*t.state(), loaded);

        t.reset();
        assert_eq!(*t.state(), loaded);
        assert_eq!(t.state().voi, Voi::new(400.0, 40.0));
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut t = transform(1000.0, 1000.0);
        t.set_partial(ViewportPatch::new().with_rotation(270).with_vflip(true));
        let cursor = Point::new(612.0, 143.0);
        let under_cursor = t.inverse(cursor);

        t.zoom_at(cursor, 3.0);
        assert!(approx_eq(t.state().scale, 3.0));
        assert!(approx_pt(t.forward(under_cursor), cursor));
    }

    #[test]
    fn test_zoom_steps_clamp() {
        let mut t = transform(100.0, 100.0);
        t.set_partial(ViewportPatch::new().with_scale(9.0));
        t.zoom_in();
        assert!(approx_eq(t.state().scale, 10.0));
        t.zoom_in();
        assert!(approx_eq(t.state().scale, 10.0));

        t.set_partial(ViewportPatch::new().with_scale(0.11));
        t.zoom_out();
        assert!(approx_eq(t.state().scale, 0.1));
    }

    #[test]
    fn test_pan_by() {
        let mut t = transform(100.0, 100.0);
        let before = t.forward(Point::new(10.0, 10.0));
        t.pan_by(5.0, -7.0);
        let after = t.forward(Point::new(10.0, 10.0));
        assert!(approx_pt(after - before, Point::new(5.0, -7.0)));

        t.reset_translation();
        assert!(approx_pt(t.forward(Point::new(50.0, 50.0)), Point::new(400.0, 300.0)));
    }

    #[test]
    fn test_revision_bumps_on_mutation() {
        let mut t = transform(100.0, 100.0);
        let r0 = t.revision();
        t.pan_by(1.0, 0.0);
        assert!(t.revision() > r0);
        let r1 = t.revision();
        t.reset();
        assert!(t.revision() > r1);
    }

    #[test]
    fn test_fit_with_empty_viewport_is_noop() {
        let mut t = transform(100.0, 100.0);
        let scale = t.state().scale;
        let corrections = t.fit_to_window(Size::new(0.0, 0.0), Size::new(100.0, 100.0));
        assert!(corrections.is_empty());
        assert_eq!(t.state().scale, scale);
    }
}
