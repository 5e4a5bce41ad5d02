//! # agentflow-core - Stateful LLM Workflow Graphs
//!
//! **Build multi-step, multi-agent LLM workflows as directed graphs** with
//! reducer-merged JSON state, durable per-thread checkpoints, and live
//! token streaming.
//!
//! ## Overview
//!
//! `agentflow-core` is the execution engine behind agentflow. It provides:
//!
//! - **Graph-shaped workflows** - Nodes are async functions, edges decide
//!   what runs next
//! - **Conditional routing** - Routers pick the next node from the state a
//!   node just produced, which is how loops and branches are built
//! - **Reducer-merged state** - Nodes return partial updates; a
//!   [`StateSchema`] merges them field by field (overwrite or append)
//! - **Checkpoint/resume** - With a [`Checkpointer`] attached, every step
//!   of every thread is persisted and any thread can be picked up later
//! - **Streaming execution** - Nodes emit [`Fragment`]s while they run;
//!   a [`Demultiplexer`] turns the interleaved feed into per-agent messages
//!
//! ## Core Concepts
//!
//! ### 1. WorkflowGraph - Primary API
//!
//! [`WorkflowGraph`] is the builder. Declare nodes, connect them with
//! direct or conditional edges from [`START`] towards [`END`], describe the
//! state with a [`StateSchema`], then [`compile`](WorkflowGraph::compile).
//! Compilation validates the structure up front: an entry edge must exist,
//! every node has exactly one outgoing edge, every edge and branch targets
//! a declared node, and every router label maps to a branch.
//!
//! ### 2. CompiledWorkflow - Runtime
//!
//! [`CompiledWorkflow`] executes one node at a time. Each step clones the
//! current state into the node, merges the node's partial update through
//! the schema, checkpoints the result, and follows the node's edge using
//! the freshly merged state. [`run`](CompiledWorkflow::run) returns the
//! final state; [`stream`](CompiledWorkflow::stream) does the same work on
//! a background task while fragments flow to the caller.
//!
//! ### 3. Threads and Checkpoints
//!
//! A thread id names a conversation. Runs against the same thread id
//! append to the same checkpoint history: one `input` row when a run
//! starts, one `step` row per executed node. The latest row is the
//! thread's current state, and folding the per-step writes in order
//! reproduces it ([`replay`](state::replay)).
//!
//! ## Quick Start
//!
//! ### Basic Graph
//!
//! ```rust,ignore
//! use agentflow_core::{RunOptions, WorkflowGraph, END};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut graph = WorkflowGraph::new();
//!
//!     graph.add_node("outline", |state| {
//!         Box::pin(async move {
//!             let topic = state["topic"].as_str().unwrap_or("").to_string();
//!             Ok(json!({"outline": format!("Outline for {topic}")}))
//!         })
//!     });
//!     graph.set_entry("outline");
//!     graph.add_edge("outline", END);
//!
//!     let compiled = graph.compile()?;
//!     let result = compiled
//!         .run(json!({"topic": "Rust"}), "thread-1", &RunOptions::default())
//!         .await?;
//!     println!("{}", result["outline"]);
//!     Ok(())
//! }
//! ```
//!
//! ### Conditional Routing
//!
//! ```rust,ignore
//! use agentflow_core::{Router, WorkflowGraph, END};
//! use std::collections::HashMap;
//!
//! let mut graph = WorkflowGraph::new();
//! // ... add "evaluate", "optimize" nodes ...
//!
//! let router = Router::new(["approved", "needs_improvement"], |state| {
//!     state["evaluation"].as_str().unwrap_or("approved").to_string()
//! });
//! let branches = HashMap::from([
//!     ("approved".to_string(), END.to_string()),
//!     ("needs_improvement".to_string(), "optimize".to_string()),
//! ]);
//! graph.add_conditional_edge("evaluate", router, branches);
//! graph.add_edge("optimize", "evaluate");
//! ```
//!
//! ### With Checkpointing
//!
//! ```rust,ignore
//! use agentflow_core::{MemorySaver, RunOptions};
//! use std::sync::Arc;
//!
//! let compiled = graph.compile()?.with_checkpointer(Arc::new(MemorySaver::new()));
//!
//! // First run creates the thread.
//! compiled.run(initial_state, "session-1", &RunOptions::default()).await?;
//!
//! // Later: read the thread back and keep going under the same id.
//! let state = compiled.get_state("session-1").await?;
//! compiled.run(state, "session-1", &RunOptions::default()).await?;
//! ```
//!
//! ### Streaming with Multiple Agents
//!
//! ```rust,ignore
//! use agentflow_core::{Demultiplexer, RunOptions};
//!
//! let mut run = compiled.stream(initial_state, "thread-1", &RunOptions::default());
//! let (fragments, handle) = run.into_parts();
//!
//! let mut demux = Demultiplexer::new("supervisor")
//!     .rule("call_researcher", "researcher")
//!     .rule("call_copywriter", "copywriter");
//! let messages = demux.collect(fragments).await;
//! let final_state = handle.await??;
//! ```
//!
//! ## Architecture
//!
//! ```text
//!        ┌───────────────────────────────────┐
//!        │         WorkflowGraph API         │
//!        │  add_node() / add_edge()          │
//!        │  add_conditional_edge() compile() │
//!        └────────────────┬──────────────────┘
//!                         ▼
//!        ┌───────────────────────────────────┐
//!        │     CompiledWorkflow (runtime)    │
//!        │  run() stream() get_state()       │
//!        └────────┬─────────────────┬────────┘
//!                 ▼                 ▼
//!     ┌─────────────────┐  ┌─────────────────┐
//!     │    Step loop    │─▶│   Checkpointer  │
//!     │  merge + route  │  │  (per thread)   │
//!     └────────┬────────┘  └─────────────────┘
//!              ▼
//!     ┌─────────────────┐  ┌─────────────────┐
//!     │  FragmentSink   │─▶│  Demultiplexer  │
//!     │  (node output)  │  │  (per source)   │
//!     └─────────────────┘  └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`graph`] - [`WorkflowGraph`] builder, nodes, edges, routers
//! - [`compiled`] - [`CompiledWorkflow`] runtime, run options, streaming
//! - [`state`] - [`StateSchema`], merge strategies, history replay
//! - [`stream`] - [`Fragment`] and the [`FragmentSink`] handed to nodes
//! - [`demux`] - Ordered fragment-to-message demultiplexing
//! - [`model`] - [`ModelClient`] abstraction over chat model backends
//! - [`error`] - [`WorkflowError`] and the crate [`Result`]
//!
//! ## See Also
//!
//! - `agentflow-checkpoint` - The [`Checkpointer`] trait and [`MemorySaver`]
//! - `agentflow-prebuilt` - Ready-made workflows built on this crate

pub mod compiled;
pub mod demux;
pub mod error;
pub mod graph;
pub mod model;
pub mod state;
pub mod stream;

// Re-export main types
pub use compiled::{CompiledWorkflow, FragmentStream, RunOptions, StreamingRun};
pub use demux::{AgentMessage, Demultiplexer};
pub use error::{Result, WorkflowError};
pub use graph::{
    Edge, NodeExecutor, NodeFuture, NodeId, NodeSpec, Router, WorkflowGraph, END, START,
};
pub use model::{ChunkStream, ModelChunk, ModelClient, ModelError};
pub use state::{replay, MergeStrategy, StateSchema};
pub use stream::{Fragment, FragmentSink, Namespace};

// Checkpointing surface, re-exported so most callers only need this crate.
pub use agentflow_checkpoint::{
    Checkpoint, CheckpointMeta, CheckpointSource, Checkpointer, MemorySaver,
};
