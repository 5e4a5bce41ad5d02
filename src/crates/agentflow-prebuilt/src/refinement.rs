//! Iterative refinement workflow - generate, evaluate, optimize
//!
//! A bounded improvement loop for drafting content against a critic:
//!
//! ```text
//! START -> generate -> evaluate -+- approved ----------> END
//!                        ^       `- needs_improvement -> optimize
//!                        |                                   |
//!                        `-----------------------------------'
//! ```
//!
//! The `iteration` field starts at 0 and counts completed optimization
//! passes; `max_iteration` bounds how many the run may perform. The router
//! approves either because the evaluator said so or because the bound is
//! reached, so with `max_iteration = 1` an always-rejecting evaluator still
//! ends the run after exactly one optimization, and `max_iteration = 0`
//! ends it at the very first evaluation.
//!
//! State fields: `topic`, `draft` (overwritten each revision), `evaluation`,
//! `feedback`, `iteration`, `max_iteration`, plus append-accumulated
//! `draft_history` and `feedback_history`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use agentflow_prebuilt::create_refinement_workflow;
//! use agentflow_core::RunOptions;
//! use serde_json::json;
//!
//! let workflow = create_refinement_workflow(client)?;
//! let result = workflow
//!     .run(
//!         json!({"topic": "AI engineers", "max_iteration": 3}),
//!         "tweet-1",
//!         &RunOptions::default(),
//!     )
//!     .await?;
//! println!("{}", result["draft"]);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use agentflow_core::model::{ModelClient, ModelError};
use agentflow_core::state::{MergeStrategy, StateSchema};
use agentflow_core::{CompiledWorkflow, Router, WorkflowGraph, END};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::response_text;

/// Evaluator verdict on the current draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    NeedsImprovement,
}

/// Structured evaluator reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// Whether the draft passes as is.
    pub evaluation: Verdict,
    /// One paragraph of strengths and weaknesses.
    pub feedback: String,
}

/// Build the refinement loop around the given model client.
///
/// Input state requires a string `topic` and a numeric `max_iteration`
/// (a missing bound reads as 0, which ends the loop at the first
/// evaluation). `iteration` may be omitted; it starts at 0.
pub fn create_refinement_workflow(client: Arc<dyn ModelClient>) -> Result<CompiledWorkflow> {
    let mut graph = WorkflowGraph::new();
    graph.schema(
        StateSchema::new()
            .field("draft_history", MergeStrategy::Append)
            .field("feedback_history", MergeStrategy::Append),
    );

    let draft_client = client.clone();
    graph.add_node("generate", move |state| {
        let client = draft_client.clone();
        Box::pin(async move {
            let prompt = json!({
                "task": "draft",
                "topic": state["topic"].as_str().unwrap_or(""),
            });
            let response = client.invoke(&prompt).await?;
            let draft = response_text(&response);
            Ok(json!({"draft": draft, "draft_history": [draft]}))
        })
    });

    let critic_client = client.clone();
    graph.add_node("evaluate", move |state| {
        let client = critic_client.clone();
        Box::pin(async move {
            let prompt = json!({
                "task": "evaluate",
                "draft": state["draft"].as_str().unwrap_or(""),
            });
            let response = client.invoke(&prompt).await?;
            let parsed: Evaluation = serde_json::from_value(response)
                .map_err(|e| ModelError::Malformed(format!("evaluator reply: {e}")))?;
            Ok(json!({
                "evaluation": parsed.evaluation,
                "feedback": parsed.feedback,
                "feedback_history": [parsed.feedback],
            }))
        })
    });

    let revise_client = client;
    graph.add_node("optimize", move |state| {
        let client = revise_client.clone();
        Box::pin(async move {
            let prompt = json!({
                "task": "revise",
                "topic": state["topic"].as_str().unwrap_or(""),
                "draft": state["draft"].as_str().unwrap_or(""),
                "feedback": state["feedback"].as_str().unwrap_or(""),
            });
            let response = client.invoke(&prompt).await?;
            let draft = response_text(&response);
            let iteration = state["iteration"].as_u64().unwrap_or(0) + 1;
            Ok(json!({
                "draft": draft,
                "iteration": iteration,
                "draft_history": [draft],
            }))
        })
    });

    graph.set_entry("generate");
    graph.add_edge("generate", "evaluate");

    // The bound is checked here, not in the engine: approval happens either
    // because the critic approved or because the optimization budget is
    // spent.
    let router = Router::new(["approved", "needs_improvement"], |state| {
        let verdict = state["evaluation"].as_str().unwrap_or("needs_improvement");
        let iteration = state["iteration"].as_u64().unwrap_or(0);
        let max_iteration = state["max_iteration"].as_u64().unwrap_or(0);
        if verdict == "approved" || iteration >= max_iteration {
            "approved".to_string()
        } else {
            "needs_improvement".to_string()
        }
    });
    let branches = HashMap::from([
        ("approved".to_string(), END.to_string()),
        ("needs_improvement".to_string(), "optimize".to_string()),
    ]);
    graph.add_conditional_edge("evaluate", router, branches);
    graph.add_edge("optimize", "evaluate");

    Ok(graph.compile()?)
}
