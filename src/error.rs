//! Error types for the phenoboost pipeline

use thiserror::Error;

/// Result type alias for phenoboost operations
pub type Result<T> = std::result::Result<T, PhenoError>;

/// Main error type for the phenoboost pipeline
#[derive(Error, Debug)]
pub enum PhenoError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Search error: {0}")]
    SearchError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Explanation error: {0}")]
    ExplanationError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl From<polars::error::PolarsError> for PhenoError {
    fn from(err: polars::error::PolarsError) -> Self {
        PhenoError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PhenoError {
    fn from(err: serde_json::Error) -> Self {
        PhenoError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PhenoError {
    fn from(err: ndarray::ShapeError) -> Self {
        PhenoError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PhenoError::DataError("label column empty".to_string());
        assert_eq!(err.to_string(), "Data error: label column empty");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PhenoError = io_err.into();
        assert!(matches!(err, PhenoError::IoError(_)));
    }
}
