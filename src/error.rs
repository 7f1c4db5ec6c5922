//! Error types for tmd-fit

use thiserror::Error;

/// Result type alias for tmd-fit operations
pub type Result<T> = std::result::Result<T, TmdError>;

/// Main error type
#[derive(Error, Debug)]
pub enum TmdError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid column pattern: {0}")]
    InvalidPattern(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl TmdError {
    /// Shape mismatch between two row or column counts
    pub(crate) fn shape(what: &str, expected: usize, actual: usize) -> Self {
        TmdError::ShapeError {
            expected: format!("{} = {}", what, expected),
            actual: format!("{} = {}", what, actual),
        }
    }
}

impl From<polars::error::PolarsError> for TmdError {
    fn from(err: polars::error::PolarsError) -> Self {
        TmdError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TmdError {
    fn from(err: serde_json::Error) -> Self {
        TmdError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TmdError {
    fn from(err: ndarray::ShapeError) -> Self {
        TmdError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<regex::Error> for TmdError {
    fn from(err: regex::Error) -> Self {
        TmdError::InvalidPattern(err.to_string())
    }
}
