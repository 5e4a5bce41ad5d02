//! Options and handles for workflow runs.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{Result, WorkflowError};
use crate::stream::Fragment;

fn default_max_steps() -> usize {
    25
}

fn default_fragment_buffer() -> usize {
    100
}

/// Per-run execution options.
///
/// # Examples
///
/// ```rust
/// use agentflow_core::compiled::RunOptions;
///
/// let options = RunOptions::default().with_max_steps(50);
/// assert_eq!(options.max_steps, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    /// Maximum number of node executions before the run fails with
    /// [`RecursionLimitExceeded`](crate::error::WorkflowError::RecursionLimitExceeded).
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Capacity of the fragment channel in streaming runs. A full channel
    /// blocks the producing node until the consumer catches up.
    #[serde(default = "default_fragment_buffer")]
    pub fragment_buffer: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            fragment_buffer: default_fragment_buffer(),
        }
    }
}

impl RunOptions {
    /// Override the step limit.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Override the fragment channel capacity.
    pub fn with_fragment_buffer(mut self, capacity: usize) -> Self {
        self.fragment_buffer = capacity;
        self
    }
}

/// Boxed stream of [`Fragment`]s from a streaming run.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Fragment> + Send>>;

/// Handle to an in-flight streaming run.
///
/// The run itself executes in a background task; this handle is the
/// consumer's end of the fragment channel plus the task's join handle.
/// Fragments arrive in emission order and stop when the run finishes, after
/// which [`join`](Self::join) yields the run's final state or error.
pub struct StreamingRun {
    receiver: mpsc::Receiver<Fragment>,
    handle: JoinHandle<Result<Value>>,
}

impl StreamingRun {
    pub(crate) fn new(receiver: mpsc::Receiver<Fragment>, handle: JoinHandle<Result<Value>>) -> Self {
        Self { receiver, handle }
    }

    /// Receive the next fragment, or `None` once the run has finished and
    /// all fragments were consumed.
    pub async fn next_fragment(&mut self) -> Option<Fragment> {
        self.receiver.recv().await
    }

    /// Split into a boxed fragment stream and the background task handle.
    pub fn into_stream(self) -> (FragmentStream, JoinHandle<Result<Value>>) {
        (Box::pin(ReceiverStream::new(self.receiver)), self.handle)
    }

    /// Split into the raw channel receiver and the background task handle.
    pub fn into_parts(self) -> (mpsc::Receiver<Fragment>, JoinHandle<Result<Value>>) {
        (self.receiver, self.handle)
    }

    /// Stop consuming fragments and wait for the final state.
    ///
    /// Drops the receiver first, so a producer blocked on a full channel is
    /// released; fragments emitted after this point go nowhere.
    pub async fn join(self) -> Result<Value> {
        drop(self.receiver);
        self.handle
            .await
            .map_err(|e| WorkflowError::Execution(format!("streaming run task failed: {e}")))?
    }
}

impl std::fmt::Debug for StreamingRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingRun")
            .field("receiver", &"<channel>")
            .field("handle", &"<task>")
            .finish()
    }
}
