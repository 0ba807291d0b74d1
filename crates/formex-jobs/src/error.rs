//! Error types for job orchestration.

use thiserror::Error;

/// Errors raised while creating or processing export jobs.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Model(#[from] formex_model::ModelError),

    #[error(transparent)]
    Export(#[from] formex_export::ExportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("form not found: {0}")]
    FormNotFound(String),

    #[error("content not found at: {0}")]
    ContentNotFound(String),
}

/// Result type for job operations.
pub type Result<T> = std::result::Result<T, JobError>;
