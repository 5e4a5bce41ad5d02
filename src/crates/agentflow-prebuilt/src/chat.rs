//! Persistent chat workflow - one responder node per turn
//!
//! The conversation lives in an append-strategy `messages` field of
//! `{role, content}` records. Each turn the caller appends the user
//! message to the thread's state and runs the workflow; the `respond` node
//! hands the whole transcript to the injected client and appends one
//! assistant message. Attached to a checkpointer, every turn of every
//! thread is durable, which is what the sidebar helpers below read.
//!
//! # Examples
//!
//! ```rust,ignore
//! use agentflow_prebuilt::chat::{conversation_state, create_chat_workflow, new_thread_id};
//! use agentflow_core::{MemorySaver, RunOptions};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let saver = Arc::new(MemorySaver::new());
//! let workflow = create_chat_workflow(client)?.with_checkpointer(saver.clone());
//!
//! let thread = new_thread_id();
//! let mut state = conversation_state(saver.as_ref(), &thread).await?;
//! state["messages"]
//!     .as_array_mut()
//!     .unwrap()
//!     .push(json!({"role": "user", "content": "hello"}));
//! let state = workflow.run(state, &thread, &RunOptions::default()).await?;
//! ```

use std::sync::Arc;

use agentflow_checkpoint::Checkpointer;
use agentflow_core::model::ModelClient;
use agentflow_core::state::{MergeStrategy, StateSchema};
use agentflow_core::{CompiledWorkflow, WorkflowGraph, END};
use serde_json::json;
use uuid::Uuid;

use crate::error::Result;
use crate::response_text;

/// Build the single-responder chat workflow around the given model client.
pub fn create_chat_workflow(client: Arc<dyn ModelClient>) -> Result<CompiledWorkflow> {
    let mut graph = WorkflowGraph::new();
    graph.schema(StateSchema::new().field("messages", MergeStrategy::Append));

    graph.add_node("respond", move |state| {
        let client = client.clone();
        Box::pin(async move {
            let prompt = json!({"messages": state["messages"]});
            let response = client.invoke(&prompt).await?;
            let content = response_text(&response);
            Ok(json!({"messages": [{"role": "assistant", "content": content}]}))
        })
    });

    graph.set_entry("respond");
    graph.add_edge("respond", END);

    Ok(graph.compile()?)
}

/// Fresh opaque thread id for a new conversation.
pub fn new_thread_id() -> String {
    Uuid::new_v4().to_string()
}

/// Latest persisted state of a conversation thread.
///
/// A thread with no checkpoints yet reads as an empty conversation, so the
/// same call serves both brand-new and resumed threads.
pub async fn conversation_state(
    checkpointer: &dyn Checkpointer,
    thread_id: &str,
) -> Result<serde_json::Value> {
    match checkpointer.latest(thread_id).await? {
        Some(checkpoint) => Ok(checkpoint.state),
        None => Ok(json!({"messages": []})),
    }
}

/// Every thread id the checkpointer has recorded, for a conversation picker.
pub async fn recorded_threads(checkpointer: &dyn Checkpointer) -> Result<Vec<String>> {
    Ok(checkpointer.list_threads().await?)
}
