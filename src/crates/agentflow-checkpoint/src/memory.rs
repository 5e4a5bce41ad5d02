//! In-memory checkpoint store for development and testing
//!
//! [`MemorySaver`] is the reference [`Checkpointer`] implementation. Rows
//! live in a map of per-thread append logs:
//!
//! ```text
//! RwLock<HashMap<thread_id, Arc<Mutex<Vec<row>>>>>
//!          │                       │
//!          │                       └─ serializes writes within one thread,
//!          │                          keeping step numbers dense
//!          └─ held only long enough to resolve the thread's log, so
//!             writes to different threads never contend
//! ```
//!
//! State is stored encoded through a [`StateCodec`] (JSON by default), the
//! same shape a durable backend would persist. Everything is lost on drop;
//! use a database-backed `Checkpointer` when runs must survive restarts.

use crate::{
    checkpoint::{Checkpoint, CheckpointMeta},
    codec::{JsonCodec, StateCodec},
    error::{CheckpointError, Result},
    traits::{CheckpointStream, Checkpointer},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// One persisted row. The snapshot is kept encoded, as a real backend
/// would hold it.
struct StoredRow {
    step: u64,
    blob: Vec<u8>,
    ts: DateTime<Utc>,
    meta: CheckpointMeta,
}

type ThreadLog = Arc<Mutex<Vec<StoredRow>>>;

/// In-memory append-only checkpoint store.
///
/// Cloning is shallow: clones share the same storage, so a saver can be
/// handed to the engine and still be queried from the caller's side.
#[derive(Clone)]
pub struct MemorySaver {
    threads: Arc<RwLock<HashMap<String, ThreadLog>>>,
    codec: Arc<dyn StateCodec>,
}

impl std::fmt::Debug for MemorySaver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySaver")
            .field("codec", &self.codec.name())
            .finish()
    }
}

impl MemorySaver {
    /// Create a store using the default JSON codec.
    pub fn new() -> Self {
        Self::with_codec(Arc::new(JsonCodec::new()))
    }

    /// Create a store with a custom state codec.
    pub fn with_codec(codec: Arc<dyn StateCodec>) -> Self {
        Self {
            threads: Arc::new(RwLock::new(HashMap::new())),
            codec,
        }
    }

    /// Number of threads with at least one checkpoint.
    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }

    /// Total number of checkpoints across all threads.
    pub async fn checkpoint_count(&self) -> usize {
        let logs: Vec<ThreadLog> = self.threads.read().await.values().cloned().collect();
        let mut total = 0;
        for log in logs {
            total += log.lock().await.len();
        }
        total
    }

    /// Drop everything (useful for test isolation).
    pub async fn clear(&self) {
        self.threads.write().await.clear();
    }

    /// Resolve the append log for a thread, creating it on first write.
    async fn log_for(&self, thread_id: &str) -> ThreadLog {
        if let Some(log) = self.threads.read().await.get(thread_id) {
            return log.clone();
        }
        let mut threads = self.threads.write().await;
        threads
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    fn materialize(&self, thread_id: &str, row: &StoredRow) -> Result<Checkpoint> {
        Ok(Checkpoint {
            thread_id: thread_id.to_string(),
            step: row.step,
            state: self.codec.decode(&row.blob)?,
            ts: row.ts,
            meta: row.meta.clone(),
        })
    }
}

impl Default for MemorySaver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn put(&self, thread_id: &str, state: &Value, meta: CheckpointMeta) -> Result<Checkpoint> {
        if thread_id.is_empty() {
            return Err(CheckpointError::Invalid(
                "thread_id must not be empty".to_string(),
            ));
        }

        let blob = self.codec.encode(state)?;
        let log = self.log_for(thread_id).await;

        // Step assignment and append happen under the thread's own lock.
        let mut rows = log.lock().await;
        let step = rows.last().map(|row| row.step + 1).unwrap_or(0);
        let ts = Utc::now();
        rows.push(StoredRow {
            step,
            blob,
            ts,
            meta: meta.clone(),
        });

        Ok(Checkpoint {
            thread_id: thread_id.to_string(),
            step,
            state: state.clone(),
            ts,
            meta,
        })
    }

    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let log = match self.threads.read().await.get(thread_id) {
            Some(log) => log.clone(),
            None => return Ok(None),
        };

        let rows = log.lock().await;
        match rows.last() {
            Some(row) => Ok(Some(self.materialize(thread_id, row)?)),
            None => Ok(None),
        }
    }

    async fn history(&self, thread_id: &str) -> Result<CheckpointStream> {
        let log = match self.threads.read().await.get(thread_id) {
            Some(log) => log.clone(),
            None => return Ok(Box::pin(stream::iter(Vec::new()))),
        };

        let rows = log.lock().await;
        let checkpoints: Vec<Result<Checkpoint>> = rows
            .iter()
            .map(|row| self.materialize(thread_id, row))
            .collect();

        Ok(Box::pin(stream::iter(checkpoints)))
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        Ok(self.threads.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_assigns_monotonic_steps() {
        let saver = MemorySaver::new();

        for i in 0..3 {
            let cp = saver
                .put(
                    "thread-1",
                    &json!({"count": i}),
                    CheckpointMeta::step("tick", json!({"count": i})),
                )
                .await
                .unwrap();
            assert_eq!(cp.step, i);
        }
    }

    #[tokio::test]
    async fn test_latest_returns_last_snapshot() {
        let saver = MemorySaver::new();

        assert!(saver.latest("thread-1").await.unwrap().is_none());

        saver
            .put("thread-1", &json!({"v": 1}), CheckpointMeta::input(json!({"v": 1})))
            .await
            .unwrap();
        saver
            .put(
                "thread-1",
                &json!({"v": 2}),
                CheckpointMeta::step("bump", json!({"v": 2})),
            )
            .await
            .unwrap();

        let latest = saver.latest("thread-1").await.unwrap().unwrap();
        assert_eq!(latest.step, 1);
        assert_eq!(latest.state, json!({"v": 2}));
    }

    #[tokio::test]
    async fn test_history_oldest_first() {
        let saver = MemorySaver::new();

        for i in 0..4u64 {
            saver
                .put(
                    "thread-1",
                    &json!({"i": i}),
                    CheckpointMeta::step("tick", json!({"i": i})),
                )
                .await
                .unwrap();
        }

        let rows: Vec<Checkpoint> = saver
            .history("thread-1")
            .await
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
            .await;

        let steps: Vec<u64> = rows.iter().map(|cp| cp.step).collect();
        assert_eq!(steps, vec![0, 1, 2, 3]);
        assert_eq!(rows[3].state, json!({"i": 3}));
    }

    #[tokio::test]
    async fn test_history_of_unknown_thread_is_empty() {
        let saver = MemorySaver::new();
        let rows: Vec<_> = saver.history("missing").await.unwrap().collect().await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_list_threads() {
        let saver = MemorySaver::new();

        saver
            .put("a", &json!({}), CheckpointMeta::input(json!({})))
            .await
            .unwrap();
        saver
            .put("b", &json!({}), CheckpointMeta::input(json!({})))
            .await
            .unwrap();

        let mut threads = saver.list_threads().await.unwrap();
        threads.sort();
        assert_eq!(threads, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_threads_are_isolated() {
        let saver = MemorySaver::new();

        saver
            .put("a", &json!({"who": "a"}), CheckpointMeta::input(json!({"who": "a"})))
            .await
            .unwrap();
        saver
            .put("b", &json!({"who": "b"}), CheckpointMeta::input(json!({"who": "b"})))
            .await
            .unwrap();
        saver
            .put(
                "a",
                &json!({"who": "a2"}),
                CheckpointMeta::step("n", json!({"who": "a2"})),
            )
            .await
            .unwrap();

        assert_eq!(saver.latest("a").await.unwrap().unwrap().step, 1);
        assert_eq!(saver.latest("b").await.unwrap().unwrap().step, 0);
    }

    #[tokio::test]
    async fn test_concurrent_writers_keep_steps_dense() {
        let saver = MemorySaver::new();

        let mut handles = Vec::new();
        for i in 0..8 {
            let saver = saver.clone();
            handles.push(tokio::spawn(async move {
                let thread = if i % 2 == 0 { "even" } else { "odd" };
                saver
                    .put(
                        thread,
                        &json!({"writer": i}),
                        CheckpointMeta::step("write", json!({"writer": i})),
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for thread in ["even", "odd"] {
            let steps: Vec<u64> = saver
                .history(thread)
                .await
                .unwrap()
                .map(|r| r.unwrap().step)
                .collect()
                .await;
            assert_eq!(steps, vec![0, 1, 2, 3]);
        }
    }

    #[tokio::test]
    async fn test_rejects_empty_thread_id() {
        let saver = MemorySaver::new();
        let err = saver
            .put("", &json!({}), CheckpointMeta::input(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_clear() {
        let saver = MemorySaver::new();
        saver
            .put("a", &json!({}), CheckpointMeta::input(json!({})))
            .await
            .unwrap();
        assert_eq!(saver.checkpoint_count().await, 1);

        saver.clear().await;

        assert_eq!(saver.thread_count().await, 0);
        assert_eq!(saver.checkpoint_count().await, 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            /// Whatever order threads are written in, each thread's history
            /// comes back dense from zero.
            #[test]
            fn prop_steps_stay_dense_per_thread(ops in proptest::collection::vec(0usize..3, 1..40)) {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let saver = MemorySaver::new();
                    for (i, op) in ops.iter().enumerate() {
                        let thread = format!("t{op}");
                        saver
                            .put(
                                &thread,
                                &json!({"seq": i}),
                                CheckpointMeta::step("op", json!({"seq": i})),
                            )
                            .await
                            .unwrap();
                    }

                    for t in 0..3usize {
                        let thread = format!("t{t}");
                        let steps: Vec<u64> = saver
                            .history(&thread)
                            .await
                            .unwrap()
                            .map(|r| r.unwrap().step)
                            .collect()
                            .await;
                        let expected: Vec<u64> = (0..steps.len() as u64).collect();
                        assert_eq!(steps, expected);
                    }
                });
            }
        }
    }
}
