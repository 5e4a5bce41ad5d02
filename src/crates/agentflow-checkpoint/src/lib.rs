//! # agentflow-checkpoint - Durable state snapshots for workflow threads
//!
//! Trait-based checkpoint persistence for the agentflow execution engine.
//! A checkpoint is an immutable snapshot of workflow state written after the
//! initial input and after every executed node, keyed by a conversation
//! **thread id** and a store-assigned, monotonically increasing **step
//! number**. The store is the engine's only persistence path: if a run dies
//! after step N, the thread resumes exactly at N.
//!
//! ## What the store supports
//!
//! - **Resumption** - `latest(thread_id)` returns the state a failed or
//!   finished run left behind
//! - **History replay** - `history(thread_id)` streams every row oldest
//!   first; folding the recorded deltas reproduces the latest snapshot
//! - **Thread enumeration** - `list_threads()` backs conversation pickers
//! - **Isolation** - concurrent runs on different threads never block each
//!   other, while writes within one thread are strictly serialized
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use agentflow_checkpoint::{CheckpointMeta, Checkpointer, MemorySaver};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let saver = MemorySaver::new();
//!
//!     saver
//!         .put(
//!             "thread-1",
//!             &json!({"messages": ["hello"]}),
//!             CheckpointMeta::input(json!({"messages": ["hello"]})),
//!         )
//!         .await?;
//!
//!     let latest = saver.latest("thread-1").await?.expect("just written");
//!     assert_eq!(latest.step, 0);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`traits`] - [`Checkpointer`] trait and its concurrency contract
//! - [`checkpoint`] - [`Checkpoint`] row, [`CheckpointMeta`], [`CheckpointSource`]
//! - [`memory`] - [`MemorySaver`] reference implementation
//! - [`codec`] - [`StateCodec`] blob encoding ([`JsonCodec`] default)
//! - [`error`] - [`CheckpointError`]
//!
//! Production deployments implement [`Checkpointer`] over a real backend
//! (SQLite, PostgreSQL, a key-value store); the trait surface is four
//! methods and the row schema is plain.

pub mod checkpoint;
pub mod codec;
pub mod error;
pub mod memory;
pub mod traits;

// Re-export main types
pub use checkpoint::{Checkpoint, CheckpointMeta, CheckpointSource};
pub use codec::{JsonCodec, StateCodec};
pub use error::{CheckpointError, Result};
pub use memory::MemorySaver;
pub use traits::{CheckpointStream, Checkpointer};
