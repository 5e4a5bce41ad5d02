//! Error types for prebuilt workflows.
//!
//! Factory functions fail only through the engine (a graph that does not
//! validate) or the checkpoint store (for the conversation helpers); both
//! sources convert into [`PrebuiltError`] with `?`.

use thiserror::Error;

/// Result type for prebuilt operations
pub type Result<T> = std::result::Result<T, PrebuiltError>;

/// Errors surfaced by the prebuilt workflow factories and helpers.
#[derive(Error, Debug)]
pub enum PrebuiltError {
    /// Engine error: graph validation or a failed run.
    #[error("workflow error: {0}")]
    Workflow(#[from] agentflow_core::WorkflowError),

    /// Checkpoint store error from the conversation helpers.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] agentflow_checkpoint::CheckpointError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
