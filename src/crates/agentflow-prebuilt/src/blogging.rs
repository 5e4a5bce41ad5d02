//! Blog drafting workflow - outline, report, review
//!
//! A linear LLM pipeline: `create_outline -> write_report -> evaluate`.
//! Every step calls the injected client; the state starts as `{title}` and
//! accumulates `outline`, `content`, and `review` in order.

use std::sync::Arc;

use agentflow_core::model::ModelClient;
use agentflow_core::{CompiledWorkflow, WorkflowGraph, END};
use serde_json::json;

use crate::error::Result;
use crate::response_text;

/// Build the blog drafting workflow around the given model client.
pub fn create_blogging_workflow(client: Arc<dyn ModelClient>) -> Result<CompiledWorkflow> {
    let mut graph = WorkflowGraph::new();

    let outline_client = client.clone();
    graph.add_node("create_outline", move |state| {
        let client = outline_client.clone();
        Box::pin(async move {
            let title = state["title"].as_str().unwrap_or("").to_string();
            let prompt = json!(format!(
                "Generate an outline for a blog post titled '{title}'."
            ));
            let response = client.invoke(&prompt).await?;
            Ok(json!({"outline": response_text(&response)}))
        })
    });

    let report_client = client.clone();
    graph.add_node("write_report", move |state| {
        let client = report_client.clone();
        Box::pin(async move {
            let outline = state["outline"].as_str().unwrap_or("").to_string();
            let prompt = json!(format!(
                "Write a detailed report following this outline:\n{outline}"
            ));
            let response = client.invoke(&prompt).await?;
            Ok(json!({"content": response_text(&response)}))
        })
    });

    let review_client = client;
    graph.add_node("evaluate", move |state| {
        let client = review_client.clone();
        Box::pin(async move {
            let title = state["title"].as_str().unwrap_or("").to_string();
            let content = state["content"].as_str().unwrap_or("").to_string();
            let prompt = json!(format!(
                "Evaluate how well the following report covers the title \
                 '{title}':\n{content}"
            ));
            let response = client.invoke(&prompt).await?;
            Ok(json!({"review": response_text(&response)}))
        })
    });

    graph.set_entry("create_outline");
    graph.add_edge("create_outline", "write_report");
    graph.add_edge("write_report", "evaluate");
    graph.add_edge("evaluate", END);

    Ok(graph.compile()?)
}
