//! Serialization of the state blob stored with each checkpoint row
//!
//! Stores persist state as opaque bytes so that any backend (in-memory,
//! key-value, relational) can hold rows without understanding their content.
//! [`StateCodec`] is object-safe so stores can take `Arc<dyn StateCodec>`
//! and stay generic over the encoding.
//!
//! State is dynamic JSON, so codecs must be self-describing. A bincode
//! codec was considered and rejected: bincode cannot deserialize
//! `serde_json::Value` (no `deserialize_any` support), so it would fail on
//! the first read of any real state.

use crate::error::Result;
use serde_json::Value;

/// Encodes and decodes the persisted state blob.
pub trait StateCodec: Send + Sync {
    /// Serialize a state snapshot to bytes.
    fn encode(&self, state: &Value) -> Result<Vec<u8>>;

    /// Deserialize a state snapshot from bytes.
    fn decode(&self, blob: &[u8]) -> Result<Value>;

    /// Short codec name, recorded for diagnostics.
    fn name(&self) -> &'static str;
}

/// JSON codec (default).
#[derive(Debug, Clone, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl StateCodec for JsonCodec {
    fn encode(&self, state: &Value) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(state)?)
    }

    fn decode(&self, blob: &[u8]) -> Result<Value> {
        Ok(serde_json::from_slice(blob)?)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_roundtrip() {
        let codec = JsonCodec::new();
        let state = json!({
            "messages": [{"role": "user", "content": "hello"}],
            "iteration": 2,
            "score": 0.75,
        });

        let blob = codec.encode(&state).unwrap();
        let restored = codec.decode(&blob).unwrap();

        assert_eq!(state, restored);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let codec = JsonCodec::new();
        assert!(codec.decode(b"not json").is_err());
    }
}
