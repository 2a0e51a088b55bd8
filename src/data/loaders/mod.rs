//! Built-in sample loaders.

mod npy_loader;
mod raster_loader;

pub use npy_loader::NpyLoader;
pub use raster_loader::RasterLoader;
