//! Error types for checkpoint operations

use thiserror::Error;

/// Result type for checkpoint operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur while recording or querying checkpoints
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// No checkpoint exists for the requested thread
    #[error("No checkpoints recorded for thread '{0}'")]
    NotFound(String),

    /// State blob could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed request (empty thread id, corrupt row)
    #[error("Invalid checkpoint request: {0}")]
    Invalid(String),
}
