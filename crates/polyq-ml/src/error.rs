//! Error types for the ML crate.

use polyq_hal::HalError;
use polyq_ir::IrError;
use thiserror::Error;

/// Errors raised by circuit execution, training and inference.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MlError {
    /// Shape or count mismatch between declared sizes and supplied data.
    #[error("Dimension mismatch: {0}")]
    Dimension(String),

    /// Operation not allowed in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The backend failed, timed out or returned a malformed result.
    #[error("Backend execution failed: {0}")]
    BackendExecution(#[from] HalError),

    /// Inference requested before any successful fit.
    #[error("Classifier is not fitted; call fit() or set_params() first")]
    NotFitted,

    /// Training was cancelled between two evaluations.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<IrError> for MlError {
    fn from(err: IrError) -> Self {
        match err {
            IrError::InvalidState(msg) => MlError::InvalidState(msg),
            other => MlError::Dimension(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for MlError {
    fn from(err: serde_json::Error) -> Self {
        MlError::Serialization(err.to_string())
    }
}

impl From<serde_yaml_ng::Error> for MlError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        MlError::Serialization(err.to_string())
    }
}

/// Result type for ML operations.
pub type MlResult<T> = Result<T, MlError>;
