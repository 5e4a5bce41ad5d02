//! Wellness check workflow - BMI calculation with advice
//!
//! A three-step sequential pipeline over `{height, weight}`:
//!
//! ```text
//! START -> calculate_bmi -> categorize -> advise -> END
//! ```
//!
//! - **calculate_bmi** computes `weight / height²` (metres and kilograms),
//!   rounded to two decimals, into the `result` field
//! - **categorize** maps the value onto a band: below 18 `Underweight`,
//!   below 25 `Normal`, below 30 `Overweight`, otherwise `Obese`
//! - **advise** asks the injected [`ModelClient`] for a short piece of
//!   advice for that band and stores it under `advice`
//!
//! Only the last step touches the model; the first two are pure, so a
//! malformed input fails fast before any model call is made.
//!
//! # Examples
//!
//! ```rust,ignore
//! use agentflow_prebuilt::create_wellness_workflow;
//! use agentflow_core::RunOptions;
//! use serde_json::json;
//!
//! let workflow = create_wellness_workflow(client)?;
//! let result = workflow
//!     .run(json!({"height": 1.65, "weight": 50.0}), "checkup-1", &RunOptions::default())
//!     .await?;
//! assert_eq!(result["category"], json!("Normal"));
//! ```

use std::sync::Arc;

use agentflow_core::model::ModelClient;
use agentflow_core::{CompiledWorkflow, WorkflowGraph, END};
use serde_json::json;

use crate::error::Result;
use crate::response_text;

/// Band label for a BMI value.
pub fn bmi_category(bmi: f64) -> &'static str {
    if bmi < 18.0 {
        "Underweight"
    } else if bmi < 25.0 {
        "Normal"
    } else if bmi < 30.0 {
        "Overweight"
    } else {
        "Obese"
    }
}

/// Build the wellness workflow around the given model client.
///
/// Input state requires numeric `height` (metres) and `weight` (kilograms);
/// the run adds `result`, `category`, and `advice`.
pub fn create_wellness_workflow(client: Arc<dyn ModelClient>) -> Result<CompiledWorkflow> {
    let mut graph = WorkflowGraph::new();

    graph.add_node("calculate_bmi", |state| {
        Box::pin(async move {
            let weight = state["weight"]
                .as_f64()
                .ok_or("state field 'weight' must be a number")?;
            let height = state["height"]
                .as_f64()
                .ok_or("state field 'height' must be a number")?;
            if height <= 0.0 {
                return Err("height must be positive".into());
            }
            let bmi = weight / (height * height);
            Ok(json!({"result": (bmi * 100.0).round() / 100.0}))
        })
    });

    graph.add_node("categorize", |state| {
        Box::pin(async move {
            let bmi = state["result"]
                .as_f64()
                .ok_or("state field 'result' must be a number")?;
            Ok(json!({"category": bmi_category(bmi)}))
        })
    });

    let advise_client = client;
    graph.add_node("advise", move |state| {
        let client = advise_client.clone();
        Box::pin(async move {
            let category = state["category"].as_str().unwrap_or("Normal").to_string();
            let prompt = json!(format!(
                "You are a health expert. Give brief, practical advice for a \
                 person whose BMI category is '{category}'."
            ));
            let response = client.invoke(&prompt).await?;
            Ok(json!({"advice": response_text(&response)}))
        })
    });

    graph.set_entry("calculate_bmi");
    graph.add_edge("calculate_bmi", "categorize");
    graph.add_edge("categorize", "advise");
    graph.add_edge("advise", END);

    Ok(graph.compile()?)
}
