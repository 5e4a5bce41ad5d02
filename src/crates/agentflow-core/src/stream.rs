//! Incremental output fragments and the sink nodes emit them through.
//!
//! In a streaming run the engine hands every node a [`FragmentSink`]. As the
//! node's collaborator produces text it calls [`FragmentSink::emit`] (or
//! [`emit_tool`](FragmentSink::emit_tool) when a tool call begins) and each
//! piece travels over a bounded channel to the consumer, usually a
//! [`Demultiplexer`](crate::demux::Demultiplexer):
//!
//! ```text
//! node ── FragmentSink::emit ──> mpsc::channel ──> Demultiplexer ──> messages
//! ```
//!
//! The channel is bounded: a slow consumer blocks the producing node instead
//! of dropping or reordering fragments. Nested agents extend the namespace
//! with [`FragmentSink::scoped`], so every fragment carries the execution
//! path that produced it. In a non-streaming run nodes receive a
//! disconnected sink and emits cost nothing.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Execution path of nested sub-graphs, outermost first.
///
/// Empty for the top-level workflow; each nested agent appends one segment.
pub type Namespace = Vec<String>;

/// One unit of incremental output.
///
/// Fragments are ephemeral: they exist only for the lifetime of a streaming
/// run and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Execution path that produced this fragment (empty = top level).
    pub namespace: Namespace,

    /// Name of the tool being invoked, when this fragment starts a tool call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    /// Partial text payload. May be empty for a pure tool-call fragment.
    pub text: String,
}

impl Fragment {
    /// Create a text fragment.
    pub fn text(namespace: Namespace, text: impl Into<String>) -> Self {
        Self {
            namespace,
            tool: None,
            text: text.into(),
        }
    }

    /// Create a fragment announcing a tool invocation.
    pub fn tool(namespace: Namespace, tool: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            namespace,
            tool: Some(tool.into()),
            text: text.into(),
        }
    }
}

/// Handle through which a node emits [`Fragment`]s during a streaming run.
///
/// Cloneable; clones share the same channel. The sink owns its namespace, so
/// a node never spells out its own execution path: the engine scopes the
/// sink before handing it over.
#[derive(Debug, Clone)]
pub struct FragmentSink {
    tx: Option<mpsc::Sender<Fragment>>,
    namespace: Namespace,
}

impl FragmentSink {
    /// Sink connected to a channel, rooted at the top-level namespace.
    pub fn new(tx: mpsc::Sender<Fragment>) -> Self {
        Self {
            tx: Some(tx),
            namespace: Vec::new(),
        }
    }

    /// Sink that discards everything. Handed to nodes in non-streaming runs
    /// so node code is identical in both modes.
    pub fn disconnected() -> Self {
        Self {
            tx: None,
            namespace: Vec::new(),
        }
    }

    /// The execution path fragments from this sink will carry.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Whether emits actually go anywhere.
    pub fn is_connected(&self) -> bool {
        self.tx.is_some()
    }

    /// Derive a sink whose namespace is extended by one segment.
    ///
    /// This is how a nested agent acquires its execution path: the parent
    /// scopes its own sink and passes the child sink down.
    pub fn scoped(&self, segment: impl Into<String>) -> Self {
        let mut namespace = self.namespace.clone();
        namespace.push(segment.into());
        Self {
            tx: self.tx.clone(),
            namespace,
        }
    }

    /// Emit a piece of text.
    ///
    /// Blocks when the channel is full (backpressure). If the consumer has
    /// gone away the fragment is silently discarded; a node should not fail
    /// because nobody is listening anymore.
    pub async fn emit(&self, text: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let fragment = Fragment::text(self.namespace.clone(), text);
            if tx.send(fragment).await.is_err() {
                tracing::debug!("fragment consumer dropped, discarding output");
            }
        }
    }

    /// Emit a fragment that begins a named tool invocation.
    pub async fn emit_tool(&self, tool: impl Into<String>, text: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let fragment = Fragment::tool(self.namespace.clone(), tool, text);
            if tx.send(fragment).await.is_err() {
                tracing::debug!("fragment consumer dropped, discarding output");
            }
        }
    }
}
