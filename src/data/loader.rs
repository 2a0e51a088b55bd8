//! Trait-based sample loading.
//!
//! New file formats are added by implementing [`SampleLoader`] and registering
//! the loader with a [`LoaderRegistry`].
//!
//! ## Supported Formats
//!
//! - **NumPy Arrays**: 2D `.npy` files with raw intensities (`f32`, `f64`, `u8`, `u16`, `i16`, `i32`)
//! - **Raster Images**: PNG, TIFF, BMP, JPEG; 8/16-bit gray kept as stored values
//!
//! ```rust,ignore
//! let registry = LoaderRegistry::new();
//! let decoded = registry.load(&bytes, Some("chest.npy"))?;
//! ```

use std::path::Path;

use ndarray::Array2;

use crate::intensity::Voi;

/// A loader refused or failed to decode its input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}{message}", loader_prefix(.loader_id))]
pub struct LoaderError {
    pub message: String,
    /// Loader that reported the error, when known
    pub loader_id: Option<&'static str>,
}

fn loader_prefix(loader_id: &Option<&'static str>) -> String {
    loader_id.map(|id| format!("[{id}] ")).unwrap_or_default()
}

impl LoaderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            loader_id: None,
        }
    }

    pub fn with_loader(mut self, loader_id: &'static str) -> Self {
        self.loader_id = Some(loader_id);
        self
    }
}

/// Decoded samples before they are bound to an image identifier.
#[derive(Debug, Clone)]
pub struct DecodedSamples {
    /// `(height, width)` raw values
    pub samples: Array2<f32>,
    pub suggested_voi: Option<Voi>,
}

impl DecodedSamples {
    pub fn new(samples: Array2<f32>) -> Self {
        Self {
            samples,
            suggested_voi: None,
        }
    }
}

/// A decoder from file bytes to raw intensity samples.
pub trait SampleLoader: Send + Sync {
    /// Unique identifier (e.g. "npy", "raster").
    fn id(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// File extensions handled (lowercase, without dots).
    fn extensions(&self) -> &'static [&'static str];

    /// Magic-byte check used when the extension is unknown or wrong.
    fn can_load(&self, data: &[u8]) -> bool;

    fn load(&self, data: &[u8]) -> Result<DecodedSamples, LoaderError>;

    /// Higher is tried first.
    fn priority(&self) -> i32 {
        0
    }
}

/// Registry of available sample loaders.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn SampleLoader>>,
}

impl LoaderRegistry {
    /// Registry with the built-in loaders.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(super::loaders::RasterLoader));
        registry.register(Box::new(super::loaders::NpyLoader));
        registry
    }

    pub fn empty() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    pub fn register(&mut self, loader: Box<dyn SampleLoader>) {
        self.loaders.push(loader);
        // Stable sort keeps registration order for equal priorities
        self.loaders.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// All supported extensions, sorted and deduplicated.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = self
            .loaders
            .iter()
            .flat_map(|l| l.extensions().iter().copied())
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }

    /// Loaders in the order they should be tried for this input: extension
    /// matches first, then magic-byte matches, then everything else.
    fn candidates(
        &self,
        data: &[u8],
        extension: Option<&str>,
    ) -> Vec<(&dyn SampleLoader, &'static str)> {
        let by_extension = |l: &dyn SampleLoader| {
            extension.is_some_and(|ext| l.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
        };

        let mut ordered = Vec::with_capacity(self.loaders.len());
        let all = self.loaders.iter().map(|l| l.as_ref());
        ordered.extend(all.clone().filter(|l| by_extension(*l)).map(|l| (l, "extension")));
        ordered.extend(
            all.clone()
                .filter(|l| !by_extension(*l) && l.can_load(data))
                .map(|l| (l, "magic bytes")),
        );
        ordered.extend(
            all.filter(|l| !by_extension(*l) && !l.can_load(data))
                .map(|l| (l, "fallback")),
        );
        ordered
    }

    /// Decode bytes with the first loader that accepts them.
    pub fn load(&self, data: &[u8], filename: Option<&str>) -> Result<DecodedSamples, LoaderError> {
        let extension = filename
            .map(Path::new)
            .and_then(Path::extension)
            .and_then(|e| e.to_str());

        let mut attempted = Vec::new();
        for (loader, reason) in self.candidates(data, extension) {
            match loader.load(data) {
                Ok(decoded) => {
                    log::debug!(
                        "Decoded {}x{} samples with {} loader ({})",
                        decoded.samples.ncols(),
                        decoded.samples.nrows(),
                        loader.id(),
                        reason
                    );
                    return Ok(decoded);
                }
                Err(e) => {
                    log::trace!("{} loader rejected input: {}", loader.id(), e);
                    attempted.push(loader.id());
                }
            }
        }

        let name = filename.unwrap_or("<bytes>");
        Err(LoaderError::new(format!(
            "no loader accepted {} (tried: {})",
            name,
            attempted.join(", ")
        )))
    }

    pub fn is_supported_file(&self, filename: &str) -> bool {
        let Some(ext) = Path::new(filename).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.loaders
            .iter()
            .any(|l| l.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    pub fn loaders(&self) -> &[Box<dyn SampleLoader>] {
        &self.loaders
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.loaders.iter().map(|l| l.id()))
            .finish()
    }
}
