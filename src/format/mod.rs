//! Annotation persistence and export.
//!
//! ## Layers
//!
//! - [`wire`]: the JSON shape annotations take when they leave the viewer
//! - [`sink`]: where task submissions are stored ([`PersistenceSink`])
//! - [`mask`]: label mask rasterization
//! - [`export`]: zip bundle with manifest, annotations and mask
//!
//! ## Usage
//!
//! ```rust,ignore
//! use neocxr::format::{JsonDirectorySink, PersistenceSink, Submission, SubmissionMeta};
//!
//! let sink = JsonDirectorySink::new("tasks");
//! let submission = Submission::new("cxr-001", store.to_persistable_payload(), SubmissionMeta::new(90, ""));
//! pollster::block_on(sink.submit(&submission))?;
//! ```

pub mod export;
pub mod mask;
mod sink;
mod wire;

pub use export::{
    ExportManifest, ExportRequest, ManifestClass, export_bundle_to_path, read_bundle, write_bundle,
};
pub use mask::{mask_to_image, rasterize_label_mask};
pub use sink::{JsonDirectorySink, MemorySink, PersistenceSink, TaskStatus};
pub use wire::{
    MAX_CONFIDENCE, Submission, SubmissionMeta, WireAnnotation, WirePoint, annotations_from_wire,
};
