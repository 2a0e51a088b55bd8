//! Image sources: resolve an identifier into an [`ImageFrame`].

use std::collections::HashMap;
use std::future::Future;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::ImageLoadError;
use crate::intensity::Voi;

use super::frame::ImageFrame;
use super::loader::LoaderRegistry;

/// Resolves image identifiers to sample data.
pub trait ImageSource {
    fn resolve(&self, id: &str) -> impl Future<Output = Result<ImageFrame, ImageLoadError>>;
}

/// Optional `<image>.json` sidecar next to an image file.
///
/// ```json
/// {"pixel_spacing": [0.143, 0.143], "window_width": 400, "window_center": 40}
/// ```
#[derive(Debug, Default, Deserialize)]
struct Sidecar {
    pixel_spacing: Option<(f64, f64)>,
    window_width: Option<f64>,
    window_center: Option<f64>,
}

/// Reads images from files under a root directory.
///
/// Identifiers are relative paths; anything that would leave the root is
/// reported as not found.
#[derive(Debug)]
pub struct FileImageSource {
    root: PathBuf,
    registry: LoaderRegistry,
}

impl FileImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registry: LoaderRegistry::new(),
        }
    }

    pub fn with_registry(mut self, registry: LoaderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let relative = Path::new(id);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        (contained && !id.is_empty()).then(|| self.root.join(relative))
    }

    fn read_sidecar(path: &Path) -> Sidecar {
        let mut sidecar_path = path.as_os_str().to_owned();
        sidecar_path.push(".json");
        let Ok(json) = std::fs::read_to_string(&sidecar_path) else {
            return Sidecar::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed sidecar {:?}: {}", sidecar_path, e);
            Sidecar::default()
        })
    }
}

impl ImageSource for FileImageSource {
    async fn resolve(&self, id: &str) -> Result<ImageFrame, ImageLoadError> {
        let not_found = || ImageLoadError::NotFound { id: id.to_string() };
        let path = self.path_for(id).ok_or_else(not_found)?;

        let bytes = std::fs::read(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => not_found(),
            _ => ImageLoadError::Io {
                id: id.to_string(),
                source,
            },
        })?;

        let decoded = self
            .registry
            .load(&bytes, path.file_name().and_then(|n| n.to_str()))
            .map_err(|source| ImageLoadError::Decode {
                id: id.to_string(),
                source,
            })?;

        let mut frame = ImageFrame::new(id, decoded.samples);
        frame.suggested_voi = decoded.suggested_voi;

        let sidecar = Self::read_sidecar(&path);
        frame.pixel_spacing = sidecar.pixel_spacing;
        if let (Some(w), Some(c)) = (sidecar.window_width, sidecar.window_center) {
            frame.suggested_voi = Some(Voi::new(w, c));
        }

        log::info!(
            "🖼️ Loaded '{}' ({}x{}) from {:?}",
            id,
            frame.width(),
            frame.height(),
            path
        );
        Ok(frame)
    }
}

/// Serves frames held in memory.
#[derive(Debug, Default)]
pub struct MemoryImageSource {
    frames: HashMap<String, ImageFrame>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame: ImageFrame) {
        self.frames.insert(frame.id.clone(), frame);
    }

    pub fn with_frame(mut self, frame: ImageFrame) -> Self {
        self.insert(frame);
        self
    }
}

impl ImageSource for MemoryImageSource {
    async fn resolve(&self, id: &str) -> Result<ImageFrame, ImageLoadError> {
        self.frames
            .get(id)
            .cloned()
            .ok_or_else(|| ImageLoadError::NotFound { id: id.to_string() })
    }
}
