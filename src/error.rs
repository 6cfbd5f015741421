//! Error types for the solar efficiency pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, SolarError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum SolarError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl SolarError {
    /// True for errors caused by a missing file or column
    pub fn is_missing_input(&self) -> bool {
        matches!(self, SolarError::FileNotFound(_) | SolarError::ColumnNotFound(_))
    }
}

impl From<polars::error::PolarsError> for SolarError {
    fn from(err: polars::error::PolarsError) -> Self {
        match err {
            polars::error::PolarsError::ColumnNotFound(name) => {
                SolarError::ColumnNotFound(name.to_string())
            }
            other => SolarError::DataError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SolarError {
    fn from(err: serde_json::Error) -> Self {
        SolarError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for SolarError {
    fn from(err: serde_yaml::Error) -> Self {
        SolarError::ConfigError(err.to_string())
    }
}

impl From<bincode::Error> for SolarError {
    fn from(err: bincode::Error) -> Self {
        SolarError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for SolarError {
    fn from(err: ndarray::ShapeError) -> Self {
        SolarError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
