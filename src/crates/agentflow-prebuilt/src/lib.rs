//! # agentflow-prebuilt - Ready-Made LLM Workflows
//!
//! **Complete, runnable workflow graphs** built on the agentflow engine. Each
//! factory here wires nodes, edges, routers, and a state schema into a
//! compiled workflow around a single injected [`ModelClient`]:
//!
//! - **[Chat](chat)** - Persistent multi-turn conversations with thread helpers
//! - **[Blogging](blogging)** - Outline, write, evaluate pipeline
//! - **[Sentiment](sentiment)** - Classify a review, diagnose and reply on the negative branch
//! - **[Refinement](refinement)** - Generate, evaluate, optimize loop with a bounded budget
//! - **[Wellness](wellness)** - BMI computation, banding, and model-written advice
//!
//! # Overview
//!
//! The engine crate gives you the pieces; this crate gives you finished
//! shapes. Every workflow takes its model behind the [`ModelClient`] trait,
//! so the same graph runs against a production backend or a scripted test
//! double without changes.
//!
//! **Use this crate when you want to:**
//! - Run a common workflow shape without wiring the graph yourself
//! - See how conditional routing, cycles, and append-merged state are meant to be used
//! - Start from a working graph and swap in your own prompts
//!
//! **Use agentflow-core directly when:**
//! - Your workflow shape is not covered here
//! - You need streaming nodes or custom merge strategies
//!
//! # Quick Start
//!
//! ## Persistent Chat
//!
//! ```rust,ignore
//! use agentflow_prebuilt::{conversation_state, create_chat_workflow, new_thread_id};
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
//!
//! ## Bounded Refinement Loop
//!
//! ```rust,ignore
//! use agentflow_prebuilt::create_refinement_workflow;
//! use agentflow_core::RunOptions;
//! use serde_json::json;
//!
//! let workflow = create_refinement_workflow(client)?;
//! let result = workflow
//!     .run(
//!         json!({"topic": "Rust async pitfalls", "max_iteration": 2}),
//!         "essay-1",
//!         &RunOptions::default(),
//!     )
//!     .await?;
//! println!("{}", result["draft"]);
//! ```
//!
//! # Workflow Comparison
//!
//! | Workflow | Shape | Key state fields |
//! |----------|-------|------------------|
//! | **Chat** | single node | `messages` (append) |
//! | **Blogging** | linear pipeline | `title`, `outline`, `content`, `review` |
//! | **Sentiment** | conditional branch | `review`, `sentiment`, `diagnosis`, `reply` |
//! | **Refinement** | cycle with budget | `draft`, `evaluation`, `iteration`, histories |
//! | **Wellness** | linear pipeline | `weight`, `height`, `result`, `category`, `advice` |
//!
//! # Module Organization
//!
//! - **[`chat`]** - Single-responder conversation workflow plus thread helpers
//! - **[`blogging`]** - Three-stage content pipeline
//! - **[`sentiment`]** - Review triage with structured classifier output
//! - **[`refinement`]** - Iterative draft improvement with an optimization budget
//! - **[`wellness`]** - BMI pipeline mixing pure computation with model advice
//! - **[`error`]** - Error types for the prebuilt crate
//!
//! # See Also
//!
//! - [agentflow-core](../agentflow_core) - Graph engine these workflows run on
//! - [agentflow-checkpoint](../agentflow_checkpoint) - Thread persistence behind the chat helpers
//!
//! [`ModelClient`]: agentflow_core::model::ModelClient

pub mod blogging;
pub mod chat;
pub mod error;
pub mod refinement;
pub mod sentiment;
pub mod wellness;

// Re-export main types
pub use blogging::create_blogging_workflow;
pub use chat::{conversation_state, create_chat_workflow, new_thread_id, recorded_threads};
pub use error::{PrebuiltError, Result};
pub use refinement::{create_refinement_workflow, Evaluation, Verdict};
pub use sentiment::{create_sentiment_workflow, Diagnosis, Sentiment};
pub use wellness::{bmi_category, create_wellness_workflow};

/// Model replies as plain text.
///
/// Clients return JSON values; string replies are taken as-is and anything
/// structured is serialized, so prompts built from a reply never lose content.
pub(crate) fn response_text(value: &serde_json::Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_text_unwraps_strings_and_serializes_the_rest() {
        assert_eq!(response_text(&json!("plain")), "plain");
        assert_eq!(response_text(&json!({"k": 1})), r#"{"k":1}"#);
        assert_eq!(response_text(&json!(42)), "42");
    }
}
