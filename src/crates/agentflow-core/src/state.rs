//! State schema with per-field merge strategies.
//!
//! Workflow state is a JSON object. Each node returns a *partial* state (the
//! fields it wants to change) and the engine merges that partial into the
//! accumulated state according to a [`StateSchema`] declared on the graph.
//!
//! Merge behavior is declared per field with a [`MergeStrategy`]:
//!
//! | Strategy | Behavior | Use case |
//! |----------|----------|----------|
//! | [`MergeStrategy::Overwrite`] | Last write wins | Scalars, status fields |
//! | [`MergeStrategy::Append`] | Concatenate into an array | Histories, logs |
//!
//! Fields without a declared strategy overwrite.
//!
//! # Examples
//!
//! ```rust
//! use agentflow_core::state::{MergeStrategy, StateSchema};
//! use serde_json::json;
//!
//! let schema = StateSchema::new()
//!     .field("messages", MergeStrategy::Append)
//!     .field("status", MergeStrategy::Overwrite);
//!
//! let mut state = json!({"messages": ["hello"], "status": "thinking"});
//! let update = json!({"messages": ["world"], "status": "done"});
//!
//! schema.apply(&mut state, &update).unwrap();
//!
//! assert_eq!(state["messages"], json!(["hello", "world"]));
//! assert_eq!(state["status"], "done");
//! ```

use std::collections::HashMap;

use agentflow_checkpoint::{Checkpoint, CheckpointSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WorkflowError};

/// How a node's write to a field combines with the accumulated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Replace the current value with the update. The default.
    #[default]
    Overwrite,
    /// Accumulate values into an array:
    ///
    /// - array + array concatenates
    /// - array + scalar pushes the scalar
    /// - missing/null + array initializes with the array
    /// - missing/null + scalar wraps it in a one-element array
    ///
    /// Any other current value is an error.
    Append,
}

impl MergeStrategy {
    /// Merge `update` into `current`, returning the combined value.
    pub fn merge(&self, current: &Value, update: &Value) -> Result<Value> {
        match self {
            MergeStrategy::Overwrite => Ok(update.clone()),
            MergeStrategy::Append => match (current, update) {
                (Value::Array(curr), Value::Array(upd)) => {
                    let mut merged = curr.clone();
                    merged.extend_from_slice(upd);
                    Ok(Value::Array(merged))
                }
                (Value::Null, Value::Array(upd)) => Ok(Value::Array(upd.clone())),
                (Value::Array(curr), single) => {
                    let mut merged = curr.clone();
                    merged.push(single.clone());
                    Ok(Value::Array(merged))
                }
                (Value::Null, single) => Ok(Value::Array(vec![single.clone()])),
                (other, _) => Err(WorkflowError::state(format!(
                    "append strategy requires the current value to be an array or null, got {}",
                    value_kind(other)
                ))),
            },
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Per-graph declaration of state fields and their merge strategies.
///
/// Built with the [`field`](Self::field) builder method and attached to a
/// graph via [`WorkflowGraph::schema`](crate::graph::WorkflowGraph::schema).
/// Undeclared fields fall back to [`MergeStrategy::Overwrite`].
#[derive(Debug, Clone, Default)]
pub struct StateSchema {
    fields: HashMap<String, MergeStrategy>,
}

impl StateSchema {
    /// Create a schema with no declared fields. Everything overwrites.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field's merge strategy.
    pub fn field(mut self, name: impl Into<String>, strategy: MergeStrategy) -> Self {
        self.fields.insert(name.into(), strategy);
        self
    }

    /// Strategy for a field, falling back to [`MergeStrategy::Overwrite`].
    pub fn strategy_for(&self, name: &str) -> MergeStrategy {
        self.fields.get(name).copied().unwrap_or_default()
    }

    /// Merge a node's partial state into the accumulated state in place.
    ///
    /// Both `state` and `update` must be JSON objects. Fields absent from
    /// `update` are left untouched.
    pub fn apply(&self, state: &mut Value, update: &Value) -> Result<()> {
        let state_obj = state
            .as_object_mut()
            .ok_or_else(|| WorkflowError::state("state must be a JSON object"))?;

        let update_obj = update
            .as_object()
            .ok_or_else(|| WorkflowError::state("node output must be a JSON object"))?;

        for (name, update_value) in update_obj {
            let current = state_obj.get(name).cloned().unwrap_or(Value::Null);
            let merged = self.strategy_for(name).merge(&current, update_value)?;
            state_obj.insert(name.clone(), merged);
        }

        Ok(())
    }
}

/// Rebuild the state a checkpoint history describes by folding each recorded
/// write in order.
///
/// A [`CheckpointSource::Input`] checkpoint resets the accumulator to its
/// recorded write (a new run's full initial state); a
/// [`CheckpointSource::Step`] checkpoint merges its node's partial state
/// through `schema`. Folding an entire `history()` this way reproduces the
/// state returned by `latest()`.
pub fn replay(schema: &StateSchema, history: &[Checkpoint]) -> Result<Value> {
    let mut state = Value::Null;
    for checkpoint in history {
        match checkpoint.meta.source {
            CheckpointSource::Input => {
                state = checkpoint.meta.writes.clone();
            }
            CheckpointSource::Step => {
                schema.apply(&mut state, &checkpoint.meta.writes)?;
            }
        }
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_checkpoint::CheckpointMeta;
    use serde_json::json;

    #[test]
    fn test_overwrite_replaces_value() {
        let strategy = MergeStrategy::Overwrite;
        let merged = strategy.merge(&json!("old"), &json!("new")).unwrap();
        assert_eq!(merged, json!("new"));
    }

    #[test]
    fn test_append_concatenates_arrays() {
        let strategy = MergeStrategy::Append;
        let merged = strategy.merge(&json!([1, 2]), &json!([3, 4])).unwrap();
        assert_eq!(merged, json!([1, 2, 3, 4]));
    }

    #[test]
    fn test_append_pushes_scalar_onto_array() {
        let strategy = MergeStrategy::Append;
        let merged = strategy.merge(&json!(["a"]), &json!("b")).unwrap();
        assert_eq!(merged, json!(["a", "b"]));
    }

    #[test]
    fn test_append_initializes_from_null() {
        let strategy = MergeStrategy::Append;
        assert_eq!(
            strategy.merge(&Value::Null, &json!([1])).unwrap(),
            json!([1])
        );
        assert_eq!(
            strategy.merge(&Value::Null, &json!("solo")).unwrap(),
            json!(["solo"])
        );
    }

    #[test]
    fn test_append_rejects_non_array_current() {
        let strategy = MergeStrategy::Append;
        let err = strategy.merge(&json!(42), &json!([1])).unwrap_err();
        assert!(matches!(err, WorkflowError::State(_)));
    }

    #[test]
    fn test_apply_merges_partial_update() {
        let schema = StateSchema::new()
            .field("messages", MergeStrategy::Append)
            .field("status", MergeStrategy::Overwrite);

        let mut state = json!({"messages": ["hi"], "status": "open", "untouched": 7});
        let update = json!({"messages": ["there"], "status": "closed"});

        schema.apply(&mut state, &update).unwrap();

        assert_eq!(state["messages"], json!(["hi", "there"]));
        assert_eq!(state["status"], "closed");
        assert_eq!(state["untouched"], 7);
    }

    #[test]
    fn test_apply_defaults_to_overwrite() {
        let schema = StateSchema::new();
        let mut state = json!({"score": [1, 2]});
        schema.apply(&mut state, &json!({"score": 3})).unwrap();
        assert_eq!(state["score"], 3);
    }

    #[test]
    fn test_apply_rejects_non_object_update() {
        let schema = StateSchema::new();
        let mut state = json!({});
        let err = schema.apply(&mut state, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, WorkflowError::State(_)));
    }

    #[test]
    fn test_append_contribution_order_preserved() {
        let schema = StateSchema::new().field("log", MergeStrategy::Append);
        let mut state = json!({});
        for i in 0..5 {
            schema.apply(&mut state, &json!({"log": [i]})).unwrap();
        }
        assert_eq!(state["log"], json!([0, 1, 2, 3, 4]));
    }

    #[test]
    fn test_replay_folds_history() {
        let schema = StateSchema::new().field("drafts", MergeStrategy::Append);

        let initial = json!({"topic": "rust", "drafts": []});
        let history = vec![
            Checkpoint::new("t1", 0, initial.clone(), CheckpointMeta::input(initial)),
            Checkpoint::new(
                "t1",
                1,
                json!({"topic": "rust", "drafts": ["v1"]}),
                CheckpointMeta::step("generate", json!({"drafts": ["v1"]})),
            ),
            Checkpoint::new(
                "t1",
                2,
                json!({"topic": "rust", "drafts": ["v1", "v2"], "approved": true}),
                CheckpointMeta::step("evaluate", json!({"drafts": ["v2"], "approved": true})),
            ),
        ];

        let replayed = replay(&schema, &history).unwrap();
        assert_eq!(replayed, history.last().unwrap().state);
    }

    #[test]
    fn test_replay_input_checkpoint_resets() {
        let schema = StateSchema::new().field("log", MergeStrategy::Append);

        // Two runs recorded on the same thread: the second input supersedes
        // everything the first run accumulated.
        let history = vec![
            Checkpoint::new(
                "t1",
                0,
                json!({"log": ["a"]}),
                CheckpointMeta::input(json!({"log": ["a"]})),
            ),
            Checkpoint::new(
                "t1",
                1,
                json!({"log": ["a", "b"]}),
                CheckpointMeta::step("n", json!({"log": ["b"]})),
            ),
            Checkpoint::new(
                "t1",
                2,
                json!({"log": ["fresh"]}),
                CheckpointMeta::input(json!({"log": ["fresh"]})),
            ),
        ];

        let replayed = replay(&schema, &history).unwrap();
        assert_eq!(replayed, json!({"log": ["fresh"]}));
    }

    #[test]
    fn test_strategy_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MergeStrategy::Append).unwrap(),
            "\"append\""
        );
        assert_eq!(
            serde_json::to_string(&MergeStrategy::Overwrite).unwrap(),
            "\"overwrite\""
        );
    }
}
