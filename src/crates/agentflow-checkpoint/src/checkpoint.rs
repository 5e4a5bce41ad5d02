//! Checkpoint row types
//!
//! A checkpoint is an immutable snapshot of workflow state for one thread,
//! written after the initial input and after every executed node. Rows are
//! keyed by `(thread_id, step)` where `step` is assigned by the store,
//! dense and monotonically increasing per thread. The logical persisted
//! schema is store-agnostic: any backend that can keep
//! `(thread_id, step, state blob, timestamp)` rows plus the small metadata
//! record can implement [`Checkpointer`](crate::traits::Checkpointer).
//!
//! Alongside the full snapshot, each row records the partial update that
//! produced it ([`CheckpointMeta::writes`]). Folding those deltas in order
//! reproduces the latest snapshot, which is what makes a thread's history
//! replayable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What kind of write produced a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    /// The caller-supplied initial state, recorded when a run starts.
    Input,
    /// The post-merge state recorded after one node execution.
    Step,
}

/// Metadata stored with every checkpoint row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// Origin of this snapshot.
    pub source: CheckpointSource,

    /// Node that produced the write; `None` for input checkpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    /// The partial state merged at this step. For input checkpoints this is
    /// the full initial state.
    pub writes: Value,
}

impl CheckpointMeta {
    /// Metadata for the initial-state checkpoint of a run.
    pub fn input(state: Value) -> Self {
        Self {
            source: CheckpointSource::Input,
            node: None,
            writes: state,
        }
    }

    /// Metadata for a post-node checkpoint carrying the node's partial update.
    pub fn step(node: impl Into<String>, writes: Value) -> Self {
        Self {
            source: CheckpointSource::Step,
            node: Some(node.into()),
            writes,
        }
    }
}

/// An immutable state snapshot for one thread at one step.
///
/// Checkpoints are only ever appended. `step` starts at 0 for the first
/// write of a thread and increases by one with every subsequent write,
/// across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Opaque conversation/session identifier.
    pub thread_id: String,

    /// Store-assigned sequence number, monotonic per thread.
    pub step: u64,

    /// Full state snapshot after the write.
    pub state: Value,

    /// When the row was recorded.
    pub ts: DateTime<Utc>,

    /// Origin and delta for this row.
    pub meta: CheckpointMeta,
}

impl Checkpoint {
    /// Build a row stamped with the current time. Intended for store
    /// implementations; the engine never constructs checkpoints directly.
    pub fn new(thread_id: impl Into<String>, step: u64, state: Value, meta: CheckpointMeta) -> Self {
        Self {
            thread_id: thread_id.into(),
            step,
            state,
            ts: Utc::now(),
            meta,
        }
    }
}
