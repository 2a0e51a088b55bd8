//! CPU-side representation of one grayscale radiograph.

use ndarray::Array2;

use crate::geometry::Size;
use crate::intensity::{DefaultVoi, Voi};

/// Raw intensity samples for one image.
///
/// Samples are stored row-major as `(height, width)` and keep their original
/// units (stored values, Hounsfield units, 16-bit counts...). Nothing is
/// normalized here; the VOI decides what is visible.
#[derive(Debug, Clone)]
pub struct ImageFrame {
    /// Identifier the image was resolved from
    pub id: String,
    pub samples: Array2<f32>,
    /// Physical pixel spacing `(row, column)` in millimetres, if known
    pub pixel_spacing: Option<(f64, f64)>,
    /// Window the image itself suggests
    pub suggested_voi: Option<Voi>,
}

impl ImageFrame {
    pub fn new(id: impl Into<String>, samples: Array2<f32>) -> Self {
        Self {
            id: id.into(),
            samples,
            pixel_spacing: None,
            suggested_voi: None,
        }
    }

    pub fn with_pixel_spacing(mut self, row: f64, column: f64) -> Self {
        self.pixel_spacing = Some((row, column));
        self
    }

    pub fn with_suggested_voi(mut self, voi: Voi) -> Self {
        self.suggested_voi = Some(voi);
        self
    }

    pub fn width(&self) -> usize {
        self.samples.ncols()
    }

    pub fn height(&self) -> usize {
        self.samples.nrows()
    }

    pub fn size(&self) -> Size {
        Size::new(self.width() as f64, self.height() as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at integer pixel coordinates.
    pub fn sample(&self, x: usize, y: usize) -> Option<f32> {
        self.samples.get((y, x)).copied()
    }

    /// Smallest and largest finite sample.
    pub fn sample_range(&self) -> Option<(f32, f32)> {
        self.samples
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Window to open the image with: the image's own suggestion, else the fallback.
    pub fn initial_voi(&self, fallback: &DefaultVoi) -> Voi {
        if let Some(voi) = self.suggested_voi {
            return voi;
        }
        let (min, max) = self.sample_range().unwrap_or((0.0, 0.0));
        fallback.resolve(min as f64, max as f64)
    }
}
