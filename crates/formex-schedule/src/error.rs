//! Error types for schedule management.

use thiserror::Error;

use crate::recurrence::RecurrenceError;

/// Errors raised while creating, listing, or executing schedules.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Job(#[from] formex_jobs::JobError),

    #[error(transparent)]
    Model(#[from] formex_model::ModelError),

    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),

    #[error("schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("schedule is inactive: {0}")]
    ScheduleInactive(String),

    #[error("missing schedule parameter: {0}")]
    MissingParameter(&'static str),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Result type for schedule operations.
pub type Result<T> = std::result::Result<T, ScheduleError>;
