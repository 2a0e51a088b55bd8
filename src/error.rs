//! Error types for viewer operations.
//!
//! Nothing here is fatal: validation errors are absorbed by the capture
//! machine, transform errors are corrected in place and reported, and
//! load/persistence/export errors are handed back to the caller to surface.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::data::LoaderError;

/// A gesture or selection change that was refused. State is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A drawing gesture started with no pathology class selected
    #[error("No pathology class selected")]
    NoClassSelected,

    /// Not enough points to form the requested shape
    #[error("{kind} needs at least {required} points, got {found}")]
    DegenerateGeometry {
        /// Shape being built
        kind: &'static str,
        /// Points collected
        found: usize,
        /// Minimum for this shape
        required: usize,
    },

    /// Tool, class, polarity or radius change while a gesture is in flight
    #[error("Selection is locked while a gesture is active")]
    SelectionLocked,

    /// Pointer input while no image is loaded
    #[error("No image loaded")]
    NoImage,

    /// Stroke radius outside the usable range
    #[error("Invalid stroke radius {0}")]
    InvalidRadius(f64),

    /// Class id not present in the taxonomy
    #[error("Unknown pathology class {0}")]
    UnknownClass(u32),
}

impl ValidationError {
    pub fn degenerate(kind: &'static str, found: usize, required: usize) -> Self {
        Self::DegenerateGeometry {
            kind,
            found,
            required,
        }
    }
}

/// A viewport change request that had to be corrected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// Non-finite value; the previous value was kept
    #[error("Non-finite value for {field}, keeping previous value")]
    NonFinite { field: &'static str },

    /// Value clamped into its valid range
    #[error("{field} {requested} clamped to {applied}")]
    Clamped {
        field: &'static str,
        requested: f64,
        applied: f64,
    },
}

/// Failure to resolve an image identifier into samples.
#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("Image '{id}' not found")]
    NotFound { id: String },

    #[error("Failed to read image '{id}': {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image '{id}': {source}")]
    Decode {
        id: String,
        #[source]
        source: LoaderError,
    },
}

impl ImageLoadError {
    pub fn id(&self) -> &str {
        match self {
            Self::NotFound { id } | Self::Io { id, .. } | Self::Decode { id, .. } => id,
        }
    }
}

/// Failure to hand annotations to the persistence collaborator.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The collaborator refused the submission
    #[error("Submission for task '{task_id}' rejected: {reason}")]
    Rejected { task_id: String, reason: String },

    #[error("Task '{0}' not found")]
    TaskNotFound(String),
}

/// Failure while writing an export bundle.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Mask encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export target exists: {0:?}")]
    TargetExists(PathBuf),
}

/// Any error the viewer can report.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    ImageLoad(#[from] ImageLoadError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Raster(#[from] neocxr_raster::RasterError),
}

pub type Result<T> = std::result::Result<T, Error>;
