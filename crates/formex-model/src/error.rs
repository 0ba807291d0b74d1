use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid job transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("export type {export_type} does not support format {format}")]
    UnsupportedFormat {
        export_type: String,
        format: String,
    },
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
