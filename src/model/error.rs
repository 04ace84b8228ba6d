//! Model construction and shape errors

use thiserror::Error;

/// Errors raised while assembling or feeding a model
#[derive(Debug, Error)]
pub enum ModelError {
    /// Regressor depth outside the supported 1..=2 range
    #[error("unsupported hidden layer count {0}, supported values are 1 and 2")]
    UnsupportedHiddenLayers(usize),

    /// Cell name that maps to no known recurrent cell
    #[error("unknown recurrent cell type: {0:?}")]
    UnknownCell(String),

    /// Data dimensions inconsistent with the model's declared input shape
    #[error("input shape mismatch: model expects {expected:?}, data provides {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
