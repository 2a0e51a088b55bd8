//! NeoCXR - chest radiograph viewer and annotation engine
//!
//! Windowed display of raw radiograph samples with pan, zoom, rotation and
//! flips, freehand scribbles and polylines in image coordinates, and
//! submission of the results to a task store.
//!
//! The crate is host-agnostic: hosts feed [`handlers::InputEvent`]s to a
//! [`ViewingSession`] and give it a [`render::Canvas`] to draw into.

pub mod capture;
pub mod color;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod format;
pub mod geometry;
pub mod handlers;
pub mod intensity;
pub mod keybindings;
pub mod model;
pub mod render;
pub mod session;
pub mod store;
pub mod viewport;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use session::{ImageState, LoadOutcome, ViewingSession};
pub use store::AnnotationStore;
pub use viewport::{ViewportState, ViewportTransform};
