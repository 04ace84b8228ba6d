//! Sweep error types

use thiserror::Error;

use crate::model::ModelError;

/// Errors from sweep construction and orchestration
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("empty domain for parameter: {0}")]
    EmptyDomain(String),

    #[error("parameter not found: {0}")]
    MissingParameter(String),

    #[error("invalid value for parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("sweep I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sweep serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;
