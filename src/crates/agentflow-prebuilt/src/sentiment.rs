//! Review triage workflow - sentiment routing with diagnosis
//!
//! Classifies a product review and branches on the result:
//!
//! ```text
//! START -> find_sentiment -+- positive -> positive_reply -> END
//!                          `- negative -> run_diagnosis -> negative_reply -> END
//! ```
//!
//! The classifier and the diagnosis are structured client calls: the reply
//! is deserialized into a typed schema and a malformed reply aborts the run
//! as a node failure. The router's two labels are declared up front, so a
//! missing branch is a compile error rather than a runtime surprise.

use std::collections::HashMap;
use std::sync::Arc;

use agentflow_core::model::{ModelClient, ModelError};
use agentflow_core::{CompiledWorkflow, Router, WorkflowGraph, END};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::response_text;

/// Review polarity returned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

#[derive(Debug, Deserialize)]
struct SentimentReply {
    sentiment: Sentiment,
}

/// Structured triage of a negative review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Issue category, e.g. "UX", "Performance", "Bug", "Support".
    pub issue_type: String,
    /// Emotional tone expressed by the reviewer.
    pub tone: String,
    /// How urgent the issue appears: "low", "medium", or "high".
    pub urgency: String,
}

/// Build the review triage workflow around the given model client.
///
/// Input state requires a string `review`; depending on polarity the run
/// adds `sentiment` and `reply`, and for negative reviews a `diagnosis`.
pub fn create_sentiment_workflow(client: Arc<dyn ModelClient>) -> Result<CompiledWorkflow> {
    let mut graph = WorkflowGraph::new();

    let classify_client = client.clone();
    graph.add_node("find_sentiment", move |state| {
        let client = classify_client.clone();
        Box::pin(async move {
            let prompt = json!({
                "task": "classify_sentiment",
                "labels": ["positive", "negative"],
                "review": state["review"].as_str().unwrap_or(""),
            });
            let response = client.invoke(&prompt).await?;
            let reply: SentimentReply = serde_json::from_value(response)
                .map_err(|e| ModelError::Malformed(format!("sentiment reply: {e}")))?;
            Ok(json!({"sentiment": reply.sentiment}))
        })
    });

    let diagnose_client = client.clone();
    graph.add_node("run_diagnosis", move |state| {
        let client = diagnose_client.clone();
        Box::pin(async move {
            let prompt = json!({
                "task": "diagnose_review",
                "review": state["review"].as_str().unwrap_or(""),
            });
            let response = client.invoke(&prompt).await?;
            let diagnosis: Diagnosis = serde_json::from_value(response)
                .map_err(|e| ModelError::Malformed(format!("diagnosis reply: {e}")))?;
            Ok(json!({"diagnosis": diagnosis}))
        })
    });

    let thanks_client = client.clone();
    graph.add_node("positive_reply", move |state| {
        let client = thanks_client.clone();
        Box::pin(async move {
            let review = state["review"].as_str().unwrap_or("").to_string();
            let prompt = json!(format!(
                "Write a warm thank-you message in response to this review, \
                 and kindly ask the user to leave feedback on our website:\n\
                 \"{review}\""
            ));
            let response = client.invoke(&prompt).await?;
            Ok(json!({"reply": response_text(&response)}))
        })
    });

    let resolve_client = client;
    graph.add_node("negative_reply", move |state| {
        let client = resolve_client.clone();
        Box::pin(async move {
            let diagnosis = &state["diagnosis"];
            let prompt = json!(format!(
                "You are a support assistant. The user had a '{}' issue, \
                 sounded '{}', and marked urgency as '{}'. Write an \
                 empathetic, helpful resolution message.",
                diagnosis["issue_type"].as_str().unwrap_or("Other"),
                diagnosis["tone"].as_str().unwrap_or("calm"),
                diagnosis["urgency"].as_str().unwrap_or("low"),
            ));
            let response = client.invoke(&prompt).await?;
            Ok(json!({"reply": response_text(&response)}))
        })
    });

    graph.set_entry("find_sentiment");

    let router = Router::new(["positive", "negative"], |state| {
        state["sentiment"].as_str().unwrap_or("positive").to_string()
    });
    let branches = HashMap::from([
        ("positive".to_string(), "positive_reply".to_string()),
        ("negative".to_string(), "run_diagnosis".to_string()),
    ]);
    graph.add_conditional_edge("find_sentiment", router, branches);
    graph.add_edge("run_diagnosis", "negative_reply");
    graph.add_edge("negative_reply", END);
    graph.add_edge("positive_reply", END);

    Ok(graph.compile()?)
}
