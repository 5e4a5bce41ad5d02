//! Demultiplexes an interleaved fragment stream into per-agent messages.
//!
//! A streaming run produces one ordered sequence of [`Fragment`]s, but those
//! fragments come from different places: the top-level orchestrator and any
//! nested agents it delegates to. The [`Demultiplexer`] reconstructs message
//! boundaries from that single stream:
//!
//! - Each fragment is attributed to a *source* by matching configured tokens
//!   against its namespace segments. An empty namespace is the top level; a
//!   namespace matching no rule also falls back to the top level, so no
//!   fragment is ever dropped.
//! - When the source changes, the previous source's accumulated text is
//!   flushed as a completed [`AgentMessage`] and a fresh buffer starts.
//! - When a fragment announces a tool the source has not just used, a
//!   marker line is spliced into the buffer before accumulation continues.
//!
//! Concatenating the emitted messages' text reproduces every input
//! fragment's text exactly once, in arrival order (tool markers are the one
//! synthetic addition).
//!
//! # Examples
//!
//! ```rust
//! use agentflow_core::demux::Demultiplexer;
//! use agentflow_core::stream::Fragment;
//!
//! let mut demux = Demultiplexer::new("supervisor")
//!     .rule("call_researcher", "researcher")
//!     .rule("call_copywriter", "copywriter");
//!
//! let ns = vec!["call_researcher".to_string()];
//! assert!(demux.push(Fragment::text(ns.clone(), "Findings: ")).is_none());
//! assert!(demux.push(Fragment::text(ns, "3 trends.")).is_none());
//!
//! // Source transition flushes the researcher's message.
//! let msg = demux.push(Fragment::text(vec![], "Summary")).unwrap();
//! assert_eq!(msg.source, "researcher");
//! assert_eq!(msg.text, "Findings: 3 trends.");
//!
//! let last = demux.finish().unwrap();
//! assert_eq!(last.source, "supervisor");
//! ```

use std::collections::HashMap;

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::stream::{Fragment, Namespace};

/// A completed, source-attributed message reconstructed from fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Source the text is attributed to (a rule's source name or the
    /// top-level name).
    pub source: String,
    /// Accumulated text for one contiguous segment of this source's output.
    pub text: String,
}

/// Splits one interleaved fragment stream into per-source messages.
///
/// Build with [`new`](Self::new) and add `(token, source)` rules with
/// [`rule`](Self::rule). Feed fragments through [`push`](Self::push) and
/// close out with [`finish`](Self::finish), or drive a whole channel with
/// [`collect`](Self::collect).
#[derive(Debug, Clone)]
pub struct Demultiplexer {
    top_level: String,
    rules: Vec<(String, String)>,
    active: Option<String>,
    buffer: String,
    last_tool: HashMap<String, String>,
}

impl Demultiplexer {
    /// Create a demultiplexer whose unmatched fragments are attributed to
    /// `top_level`.
    pub fn new(top_level: impl Into<String>) -> Self {
        Self {
            top_level: top_level.into(),
            rules: Vec::new(),
            active: None,
            buffer: String::new(),
            last_tool: HashMap::new(),
        }
    }

    /// Attribute fragments whose namespace contains `token` to `source`.
    ///
    /// Matching is substring containment against each namespace segment, in
    /// rule registration order; the first match wins.
    pub fn rule(mut self, token: impl Into<String>, source: impl Into<String>) -> Self {
        self.rules.push((token.into(), source.into()));
        self
    }

    /// Resolve the source a namespace belongs to.
    pub fn source_for(&self, namespace: &Namespace) -> &str {
        if namespace.is_empty() {
            return &self.top_level;
        }
        for (token, source) in &self.rules {
            if namespace.iter().any(|segment| segment.contains(token.as_str())) {
                return source;
            }
        }
        &self.top_level
    }

    /// Consume one fragment.
    ///
    /// Returns the previous source's completed message when this fragment
    /// causes a source transition, `None` otherwise.
    pub fn push(&mut self, fragment: Fragment) -> Option<AgentMessage> {
        let source = self.source_for(&fragment.namespace).to_string();

        let flushed = if self.active.as_deref() != Some(source.as_str()) {
            let flushed = self.take_buffer();
            self.active = Some(source.clone());
            flushed
        } else {
            None
        };

        if let Some(tool) = &fragment.tool {
            if self.last_tool.get(&source).map(String::as_str) != Some(tool.as_str()) {
                self.buffer
                    .push_str(&format!("\n\n🔧 *Using tool: {tool}*\n\n"));
                self.last_tool.insert(source.clone(), tool.clone());
            }
        }

        self.buffer.push_str(&fragment.text);
        flushed
    }

    /// Flush the final active source's buffer at end of stream.
    pub fn finish(&mut self) -> Option<AgentMessage> {
        let flushed = self.take_buffer();
        self.active = None;
        flushed
    }

    /// Drain a fragment channel to completion, returning every reconstructed
    /// message in arrival order.
    pub async fn collect(&mut self, mut rx: mpsc::Receiver<Fragment>) -> Vec<AgentMessage> {
        let mut messages = Vec::new();
        while let Some(fragment) = rx.recv().await {
            if let Some(message) = self.push(fragment) {
                messages.push(message);
            }
        }
        if let Some(message) = self.finish() {
            messages.push(message);
        }
        messages
    }

    /// Turn a fragment channel into a stream of completed messages.
    ///
    /// Messages are yielded as soon as their source segment ends, so a UI
    /// can render each agent's reply without waiting for the whole run.
    pub fn into_message_stream(
        mut self,
        mut rx: mpsc::Receiver<Fragment>,
    ) -> impl Stream<Item = AgentMessage> + Send {
        async_stream::stream! {
            while let Some(fragment) = rx.recv().await {
                if let Some(message) = self.push(fragment) {
                    yield message;
                }
            }
            if let Some(message) = self.finish() {
                yield message;
            }
        }
    }

    fn take_buffer(&mut self) -> Option<AgentMessage> {
        if self.buffer.is_empty() {
            return None;
        }
        let source = self.active.clone()?;
        Some(AgentMessage {
            source,
            text: std::mem::take(&mut self.buffer),
        })
    }
}
