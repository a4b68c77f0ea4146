//! Error types for the analysis and modelling steps

use thiserror::Error;

/// Result type alias for pipeline steps
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures a pipeline step can report back to the UI
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error("Column '{0}' is not numeric; enable categorical encoding or pick another column")]
    NonNumericColumn(String),

    #[error("Column '{column}' has {count} missing values; handle missing values first")]
    MissingValues { column: String, count: usize },

    #[error("Target '{0}' holds continuous values; choose regression instead")]
    ContinuousTarget(String),

    #[error("Need at least {needed} rows, got {actual}")]
    NotEnoughRows { needed: usize, actual: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,
}
