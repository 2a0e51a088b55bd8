//! Image data and loaders.
//!
//! This module provides:
//! - `ImageFrame`: raw intensity samples for one radiograph
//! - `LoaderRegistry`: extensible system for decoding file formats
//! - `ImageSource`: async resolution of image identifiers
//!
//! ## Adding New Formats
//!
//! 1. Create a new loader in `loaders/` implementing `SampleLoader`
//! 2. Register it in `LoaderRegistry::new()` (or at runtime with `register`)

mod frame;
mod loader;
pub mod loaders;
mod source;

pub use frame::ImageFrame;
pub use loader::{DecodedSamples, LoaderError, LoaderRegistry, SampleLoader};
pub use source::{FileImageSource, ImageSource, MemoryImageSource};
