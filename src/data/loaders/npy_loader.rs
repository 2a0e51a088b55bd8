//! Loader for NumPy `.npy` files.

use std::io::Cursor;

use ndarray::{Array2, ArrayD, Axis, Ix2};
use ndarray_npy::{ReadNpyExt, ReadableElement};

use crate::data::loader::{DecodedSamples, LoaderError, SampleLoader};

/// Loader for NumPy arrays holding raw intensities.
///
/// **Accepted shapes** (NumPy row-major convention):
/// - 2D `(H, W)`
/// - 3D `(1, H, W)` or `(H, W, 1)`, squeezed to 2D
///
/// Supported data types: `f32`, `f64`, `u8`, `u16`, `i16`, `i32`.
/// Values are kept as stored, so CT-style negative units survive.
pub struct NpyLoader;

impl NpyLoader {
    /// NumPy magic bytes: \x93NUMPY
    const MAGIC: &'static [u8] = &[0x93, b'N', b'U', b'M', b'P', b'Y'];

    fn read_as<T>(data: &[u8]) -> Option<ArrayD<f32>>
    where
        T: ReadableElement + Copy + Into<f64>,
    {
        ArrayD::<T>::read_npy(Cursor::new(data))
            .ok()
            .map(|a| a.mapv(|v| v.into() as f32))
    }

    fn to_grayscale(array: ArrayD<f32>) -> Result<Array2<f32>, LoaderError> {
        let shape = array.shape().to_vec();
        log::debug!("NpyLoader: array shape = {:?}", shape);

        let squeezed = match shape.as_slice() {
            [_, _] => array,
            [1, _, _] => array.index_axis_move(Axis(0), 0),
            [_, _, 1] => array.index_axis_move(Axis(2), 0),
            _ => {
                return Err(LoaderError::new(format!(
                    "Unsupported array shape {:?} (expected (H, W) or a single channel)",
                    shape
                )));
            }
        };

        squeezed
            .into_dimensionality::<Ix2>()
            .map_err(|e| LoaderError::new(format!("Shape error: {}", e)))
    }
}

impl SampleLoader for NpyLoader {
    fn id(&self) -> &'static str {
        "npy"
    }

    fn display_name(&self) -> &'static str {
        "NumPy Array (.npy)"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["npy"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        data.starts_with(Self::MAGIC)
    }

    fn load(&self, data: &[u8]) -> Result<DecodedSamples, LoaderError> {
        let array = Self::read_as::<f32>(data)
            .or_else(|| Self::read_as::<f64>(data))
            .or_else(|| Self::read_as::<u16>(data))
            .or_else(|| Self::read_as::<i16>(data))
            .or_else(|| Self::read_as::<u8>(data))
            .or_else(|| Self::read_as::<i32>(data))
            .ok_or_else(|| {
                LoaderError::new("Failed to read NumPy array: unsupported dtype or invalid format")
                    .with_loader(self.id())
            })?;

        let samples = Self::to_grayscale(array).map_err(|e| e.with_loader(self.id()))?;
        log::info!(
            "NpyLoader: loaded {}x{} raw samples",
            samples.ncols(),
            samples.nrows()
        );
        Ok(DecodedSamples::new(samples))
    }

    fn priority(&self) -> i32 {
        10
    }
}
