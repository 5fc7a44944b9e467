//! Backend errors.
//!
//! `polyq-ml` wraps every variant in `MlError::BackendExecution`, so the
//! messages here are what a failed fit or predict ends up reporting.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// The backend is offline or refuses new batches.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend rejected the batch at submission.
    #[error("Batch submission failed: {0}")]
    SubmissionFailed(String),

    /// The batch was accepted but did not run to completion.
    #[error("Batch job failed: {0}")]
    JobFailed(String),

    #[error("Batch job was cancelled")]
    JobCancelled,

    /// Unknown or already collected job handle.
    #[error("No such job: {0}")]
    JobNotFound(String),

    /// Capability check failed; the reasons are joined with `; `.
    #[error("Circuit rejected: {0}")]
    InvalidCircuit(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bad `BackendConfig` value or unknown registry name.
    #[error("Backend configuration error: {0}")]
    Configuration(String),

    /// No answer within the allowed time.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// More qubits than the backend register holds.
    #[error("Circuit too large: {0}")]
    CircuitTooLarge(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Shot count outside what the backend accepts.
    #[error("Invalid shot count: {0}")]
    InvalidShots(String),

    /// Outcomes that do not line up with the submitted batch.
    #[error("Malformed backend result: {0}")]
    InvalidResult(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type HalResult<T> = Result<T, HalError>;
