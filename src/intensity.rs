//! Intensity windowing (VOI) math.
//!
//! Raw sample values are clamped into the window `[c - w/2, c + w/2]` and
//! rescaled linearly to `[0, 1]`, optionally inverted. The functions here are
//! pure and cheap enough to call per pixel.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_WINDOW_WIDTH;

/// Window width/center pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Voi {
    pub window_width: f64,
    pub window_center: f64,
}

impl Voi {
    pub fn new(window_width: f64, window_center: f64) -> Self {
        Self {
            window_width,
            window_center,
        }
    }

    /// Width actually used for mapping: at least 1, and 1 when not finite.
    pub fn effective_width(&self) -> f64 {
        effective_width(self.window_width)
    }

    /// Lowest raw value that still maps above 0.
    pub fn lower(&self) -> f64 {
        self.window_center - self.effective_width() / 2.0
    }

    /// Highest raw value that still maps below 1.
    pub fn upper(&self) -> f64 {
        self.window_center + self.effective_width() / 2.0
    }

    /// Window spanning the given sample range.
    pub fn from_range(min: f64, max: f64) -> Self {
        if !(min.is_finite() && max.is_finite()) || max < min {
            return Voi::default();
        }
        Self::new((max - min).max(MIN_WINDOW_WIDTH), (max + min) / 2.0)
    }

    pub fn map(&self, raw: f64, invert: bool) -> f64 {
        map_intensity(raw, self.window_width, self.window_center, invert)
    }
}

impl Default for Voi {
    fn default() -> Self {
        Self::new(255.0, 128.0)
    }
}

fn effective_width(window_width: f64) -> f64 {
    if window_width.is_finite() {
        window_width.max(MIN_WINDOW_WIDTH)
    } else {
        MIN_WINDOW_WIDTH
    }
}

/// Map a raw sample to a display value in `[0, 1]`.
///
/// Widths below 1 (including zero, negative and non-finite widths) are
/// treated as 1. A non-finite center is treated as 0. NaN samples map to the
/// window floor.
pub fn map_intensity(raw: f64, window_width: f64, window_center: f64, invert: bool) -> f64 {
    let w = effective_width(window_width);
    let c = if window_center.is_finite() {
        window_center
    } else {
        0.0
    };
    let lower = c - w / 2.0;

    let r = if raw.is_nan() {
        0.0
    } else {
        ((raw.clamp(lower, lower + w) - lower) / w).clamp(0.0, 1.0)
    };

    if invert { 1.0 - r } else { r }
}

/// Map a raw sample straight to an 8-bit gray level.
pub fn map_to_gray(raw: f64, voi: &Voi, invert: bool) -> u8 {
    (voi.map(raw, invert) * 255.0).round() as u8
}

/// A named window preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiPreset {
    pub name: String,
    pub voi: Voi,
}

impl VoiPreset {
    pub fn new(name: &str, window_width: f64, window_center: f64) -> Self {
        Self {
            name: name.to_string(),
            voi: Voi::new(window_width, window_center),
        }
    }
}

/// Built-in presets for chest radiographs.
pub fn default_presets() -> Vec<VoiPreset> {
    vec![
        VoiPreset::new("Chest", 400.0, 40.0),
        VoiPreset::new("Lungs", 1500.0, -600.0),
        VoiPreset::new("Bone", 1000.0, 400.0),
        VoiPreset::new("Soft Tissue", 350.0, 50.0),
        VoiPreset::new("Default", 255.0, 128.0),
    ]
}

/// Find a preset by name, ignoring case.
pub fn find_preset<'a>(presets: &'a [VoiPreset], name: &str) -> Option<&'a VoiPreset> {
    presets.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Fallback window used when an image carries no suggested VOI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DefaultVoi {
    /// Always use this window
    Fixed { voi: Voi },
    /// Span the sample range of the loaded image
    SampleRange,
}

impl Default for DefaultVoi {
    fn default() -> Self {
        DefaultVoi::Fixed { voi: Voi::default() }
    }
}

impl DefaultVoi {
    /// Pick the window for an image whose samples span `[min, max]`.
    pub fn resolve(&self, min: f64, max: f64) -> Voi {
        match self {
            DefaultVoi::Fixed { voi } => *voi,
            DefaultVoi::SampleRange => Voi::from_range(min, max),
        }
    }
}
