//! The run loop: node invocation, schema merge, checkpointing, routing.

use std::sync::Arc;

use agentflow_checkpoint::{Checkpoint, CheckpointError, CheckpointMeta, Checkpointer};
use futures::TryStreamExt;
use serde_json::Value;

use super::types::RunOptions;
use super::CompiledWorkflow;
use crate::error::{Result, WorkflowError};
use crate::graph::{Edge, NodeId, END, START};
use crate::stream::FragmentSink;

impl CompiledWorkflow {
    /// Execute the workflow to completion and return the final state.
    ///
    /// `thread_id` names the conversation this run belongs to; with a
    /// checkpointer attached, the run's initial state and every completed
    /// step are recorded under it. Without one the id only appears in logs.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::NodeExecution`] when a node fails; checkpoints
    ///   written so far are preserved and the thread stays resumable
    /// - [`WorkflowError::RecursionLimitExceeded`] when `options.max_steps`
    ///   nodes executed without reaching [`END`]
    /// - [`WorkflowError::Routing`] when a router returns a label it never
    ///   declared
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use agentflow_core::compiled::RunOptions;
    /// use agentflow_core::graph::WorkflowGraph;
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let compiled = WorkflowGraph::new().compile()?;
    /// let final_state = compiled
    ///     .run(json!({"topic": "onboarding"}), "thread-1", &RunOptions::default())
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(
        &self,
        initial_state: Value,
        thread_id: &str,
        options: &RunOptions,
    ) -> Result<Value> {
        self.execute(initial_state, thread_id, options, FragmentSink::disconnected())
            .await
    }

    /// Shared run loop behind [`run`](Self::run) and
    /// [`stream`](Self::stream); the two differ only in the sink.
    #[tracing::instrument(
        skip(self, initial_state, options, sink),
        fields(run_id = %uuid::Uuid::new_v4(), max_steps = options.max_steps)
    )]
    pub(crate) async fn execute(
        &self,
        initial_state: Value,
        thread_id: &str,
        options: &RunOptions,
        sink: FragmentSink,
    ) -> Result<Value> {
        tracing::info!("starting workflow run");

        let mut state = initial_state;

        // The run's input is checkpointed up front, so a failure in the very
        // first node still leaves the thread inspectable.
        if let Some(checkpointer) = &self.checkpointer {
            checkpointer
                .put(thread_id, &state, CheckpointMeta::input(state.clone()))
                .await?;
        }

        let mut current = self.follow_edge(START, &state)?;
        let mut executed: usize = 0;

        while current != END {
            if executed >= options.max_steps {
                tracing::warn!(limit = options.max_steps, "step limit exceeded");
                return Err(WorkflowError::RecursionLimitExceeded {
                    limit: options.max_steps,
                });
            }

            let spec = self.nodes.get(&current).ok_or_else(|| {
                WorkflowError::Execution(format!(
                    "node '{current}' missing from compiled workflow"
                ))
            })?;

            tracing::debug!(node = %current, step = executed, "executing node");
            let partial = (spec.executor)(state.clone(), sink.clone())
                .await
                .map_err(|e| {
                    tracing::error!(node = %current, error = %e, "node execution failed");
                    WorkflowError::node_execution(current.as_str(), e.to_string())
                })?;

            self.schema.apply(&mut state, &partial)?;
            executed += 1;

            // Write-before-proceed: step N is durable before node N+1 runs.
            if let Some(checkpointer) = &self.checkpointer {
                checkpointer
                    .put(thread_id, &state, CheckpointMeta::step(current.as_str(), partial))
                    .await?;
            }

            current = self.follow_edge(&current, &state)?;
        }

        tracing::info!(steps = executed, "workflow run completed");
        Ok(state)
    }

    /// Resolve the node after `from` using the post-merge state.
    fn follow_edge(&self, from: &str, state: &Value) -> Result<NodeId> {
        let edge = self
            .edges
            .get(from)
            .and_then(|edges| edges.first())
            .ok_or_else(|| {
                WorkflowError::Execution(format!("node '{from}' has no outgoing edge"))
            })?;

        match edge {
            Edge::Direct(to) => Ok(to.clone()),
            Edge::Conditional { router, branches } => {
                let label = router.select(state);
                match branches.get(&label) {
                    Some(to) => Ok(to.clone()),
                    None => {
                        tracing::error!(node = %from, label = %label, "router returned unmapped label");
                        Err(WorkflowError::routing(from, label))
                    }
                }
            }
        }
    }

    /// Latest persisted state for a thread.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::NotFound`] (wrapped) when the thread has no
    /// checkpoints; an execution error when no checkpointer is attached.
    pub async fn get_state(&self, thread_id: &str) -> Result<Value> {
        let checkpointer = self.require_checkpointer()?;
        match checkpointer.latest(thread_id).await? {
            Some(checkpoint) => Ok(checkpoint.state),
            None => Err(CheckpointError::NotFound(thread_id.to_string()).into()),
        }
    }

    /// Full checkpoint history for a thread, oldest first.
    pub async fn list_checkpoints(&self, thread_id: &str) -> Result<Vec<Checkpoint>> {
        let checkpointer = self.require_checkpointer()?;
        let history = checkpointer.history(thread_id).await?;
        history.try_collect().await.map_err(Into::into)
    }

    /// Every thread id with at least one recorded checkpoint.
    pub async fn list_threads(&self) -> Result<Vec<String>> {
        let checkpointer = self.require_checkpointer()?;
        Ok(checkpointer.list_threads().await?)
    }

    fn require_checkpointer(&self) -> Result<&Arc<dyn Checkpointer>> {
        self.checkpointer.as_ref().ok_or_else(|| {
            WorkflowError::Execution("no checkpointer attached to this workflow".to_string())
        })
    }
}
