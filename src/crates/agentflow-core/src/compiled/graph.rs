//! The executable workflow and its builder methods.

use std::collections::HashMap;
use std::sync::Arc;

use agentflow_checkpoint::Checkpointer;

use crate::graph::{Edge, NodeId, NodeSpec};
use crate::state::StateSchema;

/// A validated workflow ready to run.
///
/// Produced by [`WorkflowGraph::compile`](crate::graph::WorkflowGraph::compile);
/// never constructed directly. Cloning is cheap (node executors are shared)
/// and each clone runs independently.
#[derive(Clone)]
pub struct CompiledWorkflow {
    pub(crate) nodes: HashMap<NodeId, NodeSpec>,
    pub(crate) edges: HashMap<NodeId, Vec<Edge>>,
    pub(crate) schema: StateSchema,
    pub(crate) checkpointer: Option<Arc<dyn Checkpointer>>,
}

impl CompiledWorkflow {
    pub(crate) fn new(
        nodes: HashMap<NodeId, NodeSpec>,
        edges: HashMap<NodeId, Vec<Edge>>,
        schema: StateSchema,
    ) -> Self {
        Self {
            nodes,
            edges,
            schema,
            checkpointer: None,
        }
    }

    /// Attach a checkpoint store.
    ///
    /// With a checkpointer attached, every run records its initial state and
    /// one checkpoint per completed step under the run's thread id.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use agentflow_checkpoint::MemorySaver;
    /// use agentflow_core::graph::WorkflowGraph;
    /// use std::sync::Arc;
    ///
    /// # fn build() -> WorkflowGraph { WorkflowGraph::new() }
    /// let compiled = build()
    ///     .compile()
    ///     .unwrap()
    ///     .with_checkpointer(Arc::new(MemorySaver::new()));
    /// ```
    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    /// The state schema node outputs are merged through.
    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    /// The attached checkpoint store, if any.
    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer>> {
        self.checkpointer.as_ref()
    }

    /// Names of all declared nodes, unordered.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for CompiledWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledWorkflow")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("checkpointer", &self.checkpointer.is_some())
            .finish()
    }
}
