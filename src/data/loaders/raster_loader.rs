//! Loader for raster image files (PNG, TIFF, BMP, JPEG).
//!
//! Gray images keep their stored values: 8-bit files give 0-255 samples and
//! 16-bit files give 0-65535 samples. Color files are reduced to luma.

use image::DynamicImage;
use ndarray::Array2;

use crate::data::loader::{DecodedSamples, LoaderError, SampleLoader};
use crate::intensity::Voi;

pub struct RasterLoader;

impl RasterLoader {
    fn to_samples<T: Copy + Into<f32>>(
        width: u32,
        height: u32,
        raw: Vec<T>,
    ) -> Result<Array2<f32>, LoaderError> {
        let values = raw.into_iter().map(Into::into).collect();
        Array2::from_shape_vec((height as usize, width as usize), values)
            .map_err(|e| LoaderError::new(format!("Shape error: {}", e)))
    }
}

impl SampleLoader for RasterLoader {
    fn id(&self) -> &'static str {
        "raster"
    }

    fn display_name(&self) -> &'static str {
        "Raster Image"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png", "tif", "tiff", "bmp", "jpg", "jpeg"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        if data.len() < 8 {
            return false;
        }

        // PNG
        data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
            // JPEG
            || data.starts_with(&[0xFF, 0xD8, 0xFF])
            // BMP
            || data.starts_with(b"BM")
            // TIFF little / big endian
            || data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    }

    fn load(&self, data: &[u8]) -> Result<DecodedSamples, LoaderError> {
        let img = image::load_from_memory(data).map_err(|e| {
            LoaderError::new(format!("Failed to decode image: {}", e)).with_loader(self.id())
        })?;
        let (width, height) = (img.width(), img.height());

        let (samples, deep) = match img {
            DynamicImage::ImageLuma8(buf) => (Self::to_samples(width, height, buf.into_raw())?, false),
            DynamicImage::ImageLuma16(buf) => {
                (Self::to_samples(width, height, buf.into_raw())?, true)
            }
            other if other.color().bytes_per_pixel() / other.color().channel_count() > 1 => {
                (Self::to_samples(width, height, other.to_luma16().into_raw())?, true)
            }
            other => (Self::to_samples(width, height, other.to_luma8().into_raw())?, false),
        };

        let mut decoded = DecodedSamples::new(samples);
        if deep {
            // 16-bit files rarely use the full range; open on the occupied span
            let (lo, hi) = decoded
                .samples
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            if lo <= hi {
                decoded.suggested_voi = Some(Voi::from_range(lo as f64, hi as f64));
            }
        }

        log::trace!(
            "RasterLoader: loaded {}x{} ({}-bit)",
            width,
            height,
            if deep { 16 } else { 8 }
        );
        Ok(decoded)
    }
}
