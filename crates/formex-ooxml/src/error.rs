//! Error types for OOXML packaging.

use thiserror::Error;

/// Errors that can occur while building an OOXML package.
#[derive(Debug, Error)]
pub enum OoxmlError {
    /// I/O error while writing the archive.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip container error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Package assembled without any content parts.
    #[error("empty package: {0}")]
    Empty(&'static str),
}

/// Result type for OOXML operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;
