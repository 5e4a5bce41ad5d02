//! Error types for graph construction and execution.
//!
//! Every fallible operation in this crate returns [`WorkflowError`] (or a
//! `Result` alias over it). The taxonomy separates failures by *when* they can
//! occur:
//!
//! ```text
//! WorkflowError
//! ├── Structure               - graph malformed, rejected at compile time
//! ├── NodeExecution           - a node's work failed at runtime
//! ├── RecursionLimitExceeded  - the step bound was hit before reaching END
//! ├── Routing                 - a router returned a label with no branch
//! ├── State                   - a merge strategy could not be applied
//! ├── Checkpoint              - persistence failed
//! ├── Serialization           - state could not be encoded as JSON
//! └── Execution               - engine-level faults (task join, channels)
//! ```
//!
//! `Structure` is only ever produced by [`WorkflowGraph::compile`]; once a
//! graph compiles, no structural error can surface during a run. Conversely a
//! run that fails with `NodeExecution` or `RecursionLimitExceeded` leaves
//! every checkpoint written so far intact, so the thread stays resumable.
//!
//! [`WorkflowGraph::compile`]: crate::graph::WorkflowGraph::compile

use thiserror::Error;

/// Convenience result type using [`WorkflowError`].
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Error type covering graph construction, validation, and execution.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Graph structure validation failed during compilation.
    ///
    /// Raised before any state is touched: a graph that compiles cannot
    /// produce this error at runtime.
    #[error("invalid graph structure: {0}")]
    Structure(String),

    /// A node's executor returned an error during a run.
    ///
    /// The run aborts, but checkpoints written through the last completed
    /// step are preserved, so the thread can be resumed or inspected.
    #[error("node '{node}' failed: {cause}")]
    NodeExecution {
        /// Name of the node that failed.
        node: String,
        /// Error reported by the node's executor.
        cause: String,
    },

    /// The run executed its step limit without reaching [`END`].
    ///
    /// Terminal for the run; partial progress stays queryable through the
    /// checkpoint store.
    ///
    /// [`END`]: crate::graph::END
    #[error("recursion limit of {limit} steps exceeded without reaching the end of the graph")]
    RecursionLimitExceeded {
        /// The step bound that was exceeded.
        limit: usize,
    },

    /// A routing function returned a label with no mapped branch.
    ///
    /// Compilation checks every *declared* label against the branch map, so
    /// this only occurs when a router emits a label outside the set it
    /// declared.
    #[error("router after node '{node}' returned unmapped label '{label}'")]
    Routing {
        /// Node whose conditional edge was being evaluated.
        node: String,
        /// The label that had no matching branch.
        label: String,
    },

    /// A state merge could not be applied.
    #[error("state error: {0}")]
    State(String),

    /// Checkpoint persistence failed.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] agentflow_checkpoint::CheckpointError),

    /// State could not be serialized to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Engine-level failure outside any single node.
    #[error("execution failed: {0}")]
    Execution(String),
}

impl WorkflowError {
    /// Create a [`WorkflowError::Structure`] from anything string-like.
    pub fn structure(msg: impl Into<String>) -> Self {
        Self::Structure(msg.into())
    }

    /// Create a [`WorkflowError::NodeExecution`] with node context.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use agentflow_core::error::WorkflowError;
    ///
    /// let err = WorkflowError::node_execution("advise", "model unavailable");
    /// assert_eq!(err.to_string(), "node 'advise' failed: model unavailable");
    /// ```
    pub fn node_execution(node: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::NodeExecution {
            node: node.into(),
            cause: cause.into(),
        }
    }

    /// Create a [`WorkflowError::Routing`] for an unmapped label.
    pub fn routing(node: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Routing {
            node: node.into(),
            label: label.into(),
        }
    }

    /// Create a [`WorkflowError::State`] from anything string-like.
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = WorkflowError::structure("entry node 'missing' does not exist");
        assert_eq!(
            err.to_string(),
            "invalid graph structure: entry node 'missing' does not exist"
        );

        let err = WorkflowError::routing("evaluate", "undecided");
        assert_eq!(
            err.to_string(),
            "router after node 'evaluate' returned unmapped label 'undecided'"
        );

        let err = WorkflowError::RecursionLimitExceeded { limit: 25 };
        assert!(err.to_string().contains("25"));
    }

    #[test]
    fn test_checkpoint_error_converts() {
        let source = agentflow_checkpoint::CheckpointError::NotFound("t1".to_string());
        let err: WorkflowError = source.into();
        assert!(matches!(err, WorkflowError::Checkpoint(_)));
    }
}
