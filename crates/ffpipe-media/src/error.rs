//! Error types for ffpipe-media.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Byte length or dimensions do not describe a valid pixel array.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// The operation does not apply to this kind of frame data.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// None of the known buffer formats could decode the data.
    #[error("cannot interpret buffer as image, compressed array or compressed blob")]
    Uninterpretable,

    /// Buffer does not carry the compressed-array header.
    #[error("not a compressed array")]
    NotCompressedArray,

    /// Image codec error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Array record serialization error.
    #[error("serialization error: {0}")]
    Serialize(#[from] bincode::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Refused to replace an existing file.
    #[error("file already exists: {}", path.display())]
    FileExists { path: PathBuf },

    /// The specified file was not found.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },
}

impl Error {
    /// Create an invalid shape error.
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::InvalidShape(message.into())
    }
}
