use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("Pixel buffer has {found} bytes, expected {expected}")]
    BufferSize { expected: usize, found: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RasterError>;
