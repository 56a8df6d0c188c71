//! Error types for the HOG + SVM pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SVMError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Optimization failed: {0}")]
    OptimizationError(String),

    #[error("Model not trained")]
    ModelNotTrained,

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Invalid label: expected -1 or +1, got {0}")]
    InvalidLabel(f64),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("Cannot decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<csv::Error> for SVMError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => SVMError::IoError(io),
                other => SVMError::ParseError(format!("{other:?}")),
            }
        } else {
            SVMError::ParseError(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SVMError>;
