//! Execution engine for compiled workflows.
//!
//! A [`WorkflowGraph`](crate::graph::WorkflowGraph) compiles into a
//! [`CompiledWorkflow`], the runtime that actually walks the graph. One
//! compiled workflow is reusable across any number of runs and threads.
//!
//! # Execution model
//!
//! A run is single-threaded and cooperative: nodes execute strictly one
//! after another, and the only await points are node invocations themselves.
//! For each step the engine invokes the current node with a clone of the
//! accumulated state, merges the node's partial output through the graph's
//! schema, persists a checkpoint if a checkpointer is attached, and then
//! routes to the next node using the *post-merge* state. The run ends when
//! an edge reaches [`END`](crate::graph::END), or errors when the step
//! limit is exceeded first.
//!
//! Checkpointing is write-before-proceed: the checkpoint for step N is
//! durably recorded before node N+1 starts, so an interrupted run is
//! resumable exactly at its last completed step.
//!
//! # Modes
//!
//! - [`CompiledWorkflow::run`] executes to completion and returns the final
//!   state.
//! - [`CompiledWorkflow::stream`] additionally connects every node to a
//!   bounded fragment channel and returns a [`StreamingRun`] handle; the
//!   consumer reads fragments live while the run proceeds in a background
//!   task.

mod execution;
mod graph;
mod streaming;
mod types;
mod tests;

pub use graph::CompiledWorkflow;
pub use types::{FragmentStream, RunOptions, StreamingRun};
