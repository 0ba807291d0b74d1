//! Error types for export generation.

use thiserror::Error;

/// Errors raised while rendering an artifact.
///
/// These surface verbatim as the failed job's error message, so variants
/// carry enough context to diagnose a run from the job record alone.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Model(#[from] formex_model::ModelError),

    #[error("container error: {0}")]
    Ooxml(#[from] formex_ooxml::OoxmlError),

    #[error("chart rendering failed: {0}")]
    Chart(#[from] formex_analytics::ChartError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
