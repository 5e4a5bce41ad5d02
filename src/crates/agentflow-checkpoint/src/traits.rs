//! The checkpoint store abstraction
//!
//! [`Checkpointer`] is the only persistence path the execution engine has:
//! a snapshot is written after the initial input and after every node, and
//! the write completes before the engine proceeds. Anything that can append
//! rows keyed by `(thread_id, step)` can back it: the in-memory store in
//! this crate, an embedded file, a key-value store, or a relational table.
//!
//! # Concurrency contract
//!
//! Implementations must uphold two guarantees under concurrent access:
//!
//! - writes for the *same* thread are serialized, so step numbers stay
//!   dense and ordered;
//! - writes for *different* threads are independent and must not block
//!   each other.
//!
//! Reads may run concurrently with each other and with writes to other
//! threads.
//!
//! # Implementing a backend
//!
//! ```rust,ignore
//! use agentflow_checkpoint::{Checkpoint, CheckpointMeta, CheckpointStream, Checkpointer};
//! use async_trait::async_trait;
//! use serde_json::Value;
//!
//! struct SqliteCheckpointer { pool: sqlx::SqlitePool }
//!
//! #[async_trait]
//! impl Checkpointer for SqliteCheckpointer {
//!     async fn put(
//!         &self,
//!         thread_id: &str,
//!         state: &Value,
//!         meta: CheckpointMeta,
//!     ) -> agentflow_checkpoint::Result<Checkpoint> {
//!         // SELECT max(step) for the thread inside a transaction,
//!         // INSERT the new row with step + 1, commit, return the row.
//!         todo!()
//!     }
//!     // latest/history/list_threads follow the same keying.
//! #   async fn latest(&self, _: &str) -> agentflow_checkpoint::Result<Option<Checkpoint>> { todo!() }
//! #   async fn history(&self, _: &str) -> agentflow_checkpoint::Result<CheckpointStream> { todo!() }
//! #   async fn list_threads(&self) -> agentflow_checkpoint::Result<Vec<String>> { todo!() }
//! }
//! ```

use crate::{
    checkpoint::{Checkpoint, CheckpointMeta},
    error::Result,
};
use async_trait::async_trait;
use futures::stream::Stream;
use serde_json::Value;
use std::pin::Pin;

/// Async stream of checkpoint rows, oldest first.
pub type CheckpointStream = Pin<Box<dyn Stream<Item = Result<Checkpoint>> + Send + 'static>>;

/// Append-only store of per-thread state snapshots.
///
/// A thread comes into existence with its first `put` and is never
/// destroyed by the store; pruning old threads is external policy.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Append a snapshot for `thread_id`, assigning the next step number
    /// and a timestamp. Returns the recorded row.
    async fn put(&self, thread_id: &str, state: &Value, meta: CheckpointMeta) -> Result<Checkpoint>;

    /// The most recent checkpoint for the thread, or `None` if the thread
    /// has never been written.
    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// All checkpoints for the thread, oldest first. The stream is finite
    /// and a fresh call re-reads from the start. Unknown threads yield an
    /// empty stream.
    async fn history(&self, thread_id: &str) -> Result<CheckpointStream>;

    /// Every thread id that has at least one recorded checkpoint. Order is
    /// unspecified.
    async fn list_threads(&self) -> Result<Vec<String>>;
}
