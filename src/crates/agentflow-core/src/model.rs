//! Contract for the external collaborator nodes call.
//!
//! This crate is an orchestration engine, not a model client library: it
//! defines the [`ModelClient`] trait and callers implement it for their
//! provider of choice (a hosted API, a local server, a scripted stub in
//! tests). Nodes receive an `Arc<dyn ModelClient>` at construction, never a
//! global instance, and treat every failure from it as an opaque error to
//! propagate.
//!
//! # Example Implementation
//!
//! ```rust,ignore
//! use agentflow_core::model::{ModelClient, ModelError};
//! use async_trait::async_trait;
//! use serde_json::Value;
//!
//! struct HttpModel { endpoint: String }
//!
//! #[async_trait]
//! impl ModelClient for HttpModel {
//!     async fn invoke(&self, input: &Value) -> Result<Value, ModelError> {
//!         // POST to self.endpoint, parse the body, map transport errors
//!         // to ModelError::Provider and bad payloads to ModelError::Malformed.
//!         todo!()
//!     }
//!
//!     fn clone_box(&self) -> Box<dyn ModelClient> {
//!         Box::new(Self { endpoint: self.endpoint.clone() })
//!     }
//! }
//! ```

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use thiserror::Error;

/// Failure surface of an external collaborator call.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The provider call itself failed (network, auth, rate limit).
    #[error("provider error: {0}")]
    Provider(String),

    /// The provider answered, but the payload was not usable.
    #[error("malformed model output: {0}")]
    Malformed(String),

    /// The implementation does not support incremental output.
    #[error("this model client does not support streaming")]
    StreamingUnsupported,
}

/// One incremental piece of a streamed model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChunk {
    /// Partial text content. May be empty for a pure tool-call chunk.
    pub text: String,
    /// Tool the model started invoking, when this chunk announces one.
    pub tool: Option<String>,
}

impl ModelChunk {
    /// Text-only chunk.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool: None,
        }
    }

    /// Chunk announcing a tool invocation.
    pub fn tool(tool: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool: Some(tool.into()),
        }
    }
}

/// Stream of incremental model output.
pub type ChunkStream = Pin<Box<dyn Stream<Item = ModelChunk> + Send + 'static>>;

/// Provider-agnostic interface to a language model or similar collaborator.
///
/// Implementations must be `Send + Sync`; share them across nodes as
/// `Arc<dyn ModelClient>`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Make one complete call.
    ///
    /// `input` is whatever the calling node assembled: a prompt string, a
    /// message list, a structured request. The result is likewise opaque to
    /// the engine; the node interprets it.
    async fn invoke(&self, input: &Value) -> Result<Value, ModelError>;

    /// Stream a response incrementally.
    ///
    /// Default implementation reports [`ModelError::StreamingUnsupported`];
    /// override it for providers that can emit partial output.
    async fn stream(&self, _input: &Value) -> Result<ChunkStream, ModelError> {
        Err(ModelError::StreamingUnsupported)
    }

    /// Clone this client into a boxed trait object.
    fn clone_box(&self) -> Box<dyn ModelClient>;
}

impl Clone for Box<dyn ModelClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Clone)]
    struct MockClient {
        reply: String,
    }

    #[async_trait]
    impl ModelClient for MockClient {
        async fn invoke(&self, _input: &Value) -> Result<Value, ModelError> {
            Ok(json!({"text": self.reply}))
        }

        fn clone_box(&self) -> Box<dyn ModelClient> {
            Box::new(self.clone())
        }
    }

    #[tokio::test]
    async fn test_trait_object_invoke() {
        let client: Arc<dyn ModelClient> = Arc::new(MockClient {
            reply: "hello".to_string(),
        });

        let out = client.invoke(&json!({"prompt": "hi"})).await.unwrap();
        assert_eq!(out["text"], "hello");
    }

    #[tokio::test]
    async fn test_default_stream_is_unsupported() {
        let client = MockClient {
            reply: "x".to_string(),
        };

        let err = client.stream(&json!({})).await.err().unwrap();
        assert!(matches!(err, ModelError::StreamingUnsupported));
    }

    #[tokio::test]
    async fn test_boxed_clone() {
        let boxed: Box<dyn ModelClient> = Box::new(MockClient {
            reply: "same".to_string(),
        });
        let cloned = boxed.clone();

        let out = cloned.invoke(&json!({})).await.unwrap();
        assert_eq!(out["text"], "same");
    }
}
