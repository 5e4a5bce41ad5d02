//! Tests for CompiledWorkflow
//!
//! Execution, routing, checkpointing, streaming, and the step limit are
//! all exercised here against small in-memory graphs.

#[cfg(test)]
mod tests {
    use crate::compiled::RunOptions;
    use crate::error::WorkflowError;
    use crate::graph::{Router, WorkflowGraph, END};
    use crate::state::{replay, MergeStrategy, StateSchema};
    use agentflow_checkpoint::{CheckpointError, CheckpointSource, MemorySaver};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_linear_run_visits_nodes_in_order() {
        let mut graph = WorkflowGraph::new();
        graph.schema(StateSchema::new().field("visited", MergeStrategy::Append));
        graph.add_node("first", |_state| {
            Box::pin(async move { Ok(json!({"visited": ["first"], "topic": "graphs"})) })
        });
        graph.add_node("second", |_state| {
            Box::pin(async move { Ok(json!({"visited": ["second"]})) })
        });
        graph.set_entry("first");
        graph.add_edge("first", "second");
        graph.add_edge("second", END);

        let compiled = graph.compile().unwrap();
        let result = compiled
            .run(json!({"visited": [], "keep": true}), "t", &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(result["visited"], json!(["first", "second"]));
        // Overwrite merge lands new fields and untouched fields survive.
        assert_eq!(result["topic"], json!("graphs"));
        assert_eq!(result["keep"], json!(true));
    }

    #[tokio::test]
    async fn test_conditional_edge_routes_on_post_merge_state() {
        let mut graph = WorkflowGraph::new();
        graph.add_node("classify", |_state| {
            Box::pin(async move { Ok(json!({"sentiment": "negative"})) })
        });
        graph.add_node("thank", |_state| {
            Box::pin(async move { Ok(json!({"handled": "thank"})) })
        });
        graph.add_node("diagnose", |_state| {
            Box::pin(async move { Ok(json!({"handled": "diagnose"})) })
        });
        graph.set_entry("classify");

        // The router must see the sentiment written by the node that just ran.
        let router = Router::new(["positive", "negative"], |state| {
            state["sentiment"].as_str().unwrap_or("positive").to_string()
        });
        let branches = HashMap::from([
            ("positive".to_string(), "thank".to_string()),
            ("negative".to_string(), "diagnose".to_string()),
        ]);
        graph.add_conditional_edge("classify", router, branches);
        graph.add_edge("thank", END);
        graph.add_edge("diagnose", END);

        let compiled = graph.compile().unwrap();
        let result = compiled
            .run(json!({}), "t", &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(result["handled"], json!("diagnose"));
    }

    #[tokio::test]
    async fn test_cycle_runs_until_router_approves() {
        let mut graph = WorkflowGraph::new();
        graph.schema(StateSchema::new().field("drafts", MergeStrategy::Append));
        graph.add_node("revise", |state| {
            Box::pin(async move {
                let round = state["round"].as_u64().unwrap_or(0) + 1;
                Ok(json!({"round": round, "drafts": [format!("draft {round}")]}))
            })
        });
        graph.set_entry("revise");

        let router = Router::new(["approved", "again"], |state| {
            if state["round"].as_u64().unwrap_or(0) >= 3 {
                "approved".to_string()
            } else {
                "again".to_string()
            }
        });
        let branches = HashMap::from([
            ("approved".to_string(), END.to_string()),
            ("again".to_string(), "revise".to_string()),
        ]);
        graph.add_conditional_edge("revise", router, branches);

        let compiled = graph.compile().unwrap();
        let result = compiled
            .run(json!({}), "t", &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(result["round"], json!(3));
        assert_eq!(
            result["drafts"],
            json!(["draft 1", "draft 2", "draft 3"])
        );
    }

    #[tokio::test]
    async fn test_step_limit_counts_executed_nodes() {
        let executions = Arc::new(AtomicUsize::new(0));
        let seen = executions.clone();

        let mut graph = WorkflowGraph::new();
        graph.add_node("spin", move |_state| {
            let seen = seen.clone();
            Box::pin(async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(json!({}))
            })
        });
        graph.set_entry("spin");
        graph.add_edge("spin", "spin");

        let compiled = graph.compile().unwrap();
        let err = compiled
            .run(json!({}), "t", &RunOptions::default().with_max_steps(4))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::RecursionLimitExceeded { limit: 4 }
        ));
        // The limit bounds executions exactly: step 5 is never started.
        assert_eq!(executions.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_node_failure_names_the_failing_node() {
        let mut graph = WorkflowGraph::new();
        graph.add_node("explode", |_state| {
            Box::pin(async move { Err("boom".into()) })
        });
        graph.set_entry("explode");
        graph.add_edge("explode", END);

        let compiled = graph.compile().unwrap();
        let err = compiled
            .run(json!({}), "t", &RunOptions::default())
            .await
            .unwrap_err();

        match err {
            WorkflowError::NodeExecution { node, cause } => {
                assert_eq!(node, "explode");
                assert!(cause.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_router_unmapped_label_is_routing_error() {
        let mut graph = WorkflowGraph::new();
        graph.add_node("work", |_state| Box::pin(async move { Ok(json!({})) }));
        graph.set_entry("work");

        // Declared labels are mapped, but the function misbehaves at runtime.
        let router = Router::new(["again"], |_state| "elsewhere".to_string());
        let branches = HashMap::from([("again".to_string(), "work".to_string())]);
        graph.add_conditional_edge("work", router, branches);

        let compiled = graph.compile().unwrap();
        let err = compiled
            .run(json!({}), "t", &RunOptions::default())
            .await
            .unwrap_err();

        match err {
            WorkflowError::Routing { node, label } => {
                assert_eq!(node, "work");
                assert_eq!(label, "elsewhere");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_checkpoints_recorded_per_step() {
        let mut graph = WorkflowGraph::new();
        graph.schema(StateSchema::new().field("visited", MergeStrategy::Append));
        graph.add_node("a", |_state| {
            Box::pin(async move { Ok(json!({"visited": ["a"]})) })
        });
        graph.add_node("b", |_state| {
            Box::pin(async move { Ok(json!({"visited": ["b"]})) })
        });
        graph.set_entry("a");
        graph.add_edge("a", "b");
        graph.add_edge("b", END);

        let compiled = graph
            .compile()
            .unwrap()
            .with_checkpointer(Arc::new(MemorySaver::new()));

        let final_state = compiled
            .run(json!({"visited": []}), "t", &RunOptions::default())
            .await
            .unwrap();

        let history = compiled.list_checkpoints("t").await.unwrap();
        assert_eq!(history.len(), 3);

        assert_eq!(history[0].meta.source, CheckpointSource::Input);
        assert!(history[0].meta.node.is_none());
        assert_eq!(history[0].state, json!({"visited": []}));

        assert_eq!(history[1].meta.source, CheckpointSource::Step);
        assert_eq!(history[1].meta.node.as_deref(), Some("a"));
        assert_eq!(history[1].meta.writes, json!({"visited": ["a"]}));

        assert_eq!(history[2].meta.node.as_deref(), Some("b"));
        assert_eq!(history[2].state, final_state);

        let steps: Vec<u64> = history.iter().map(|c| c.step).collect();
        assert_eq!(steps, vec![0, 1, 2]);

        assert_eq!(compiled.get_state("t").await.unwrap(), final_state);
        assert_eq!(compiled.list_threads().await.unwrap(), vec!["t".to_string()]);
    }

    #[tokio::test]
    async fn test_input_checkpoint_written_before_first_step() {
        let mut graph = WorkflowGraph::new();
        graph.add_node("explode", |_state| {
            Box::pin(async move { Err("boom".into()) })
        });
        graph.set_entry("explode");
        graph.add_edge("explode", END);

        let compiled = graph
            .compile()
            .unwrap()
            .with_checkpointer(Arc::new(MemorySaver::new()));

        let err = compiled
            .run(json!({"q": 1}), "t", &RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NodeExecution { .. }));

        // The failed run still left the thread inspectable.
        let history = compiled.list_checkpoints("t").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].meta.source, CheckpointSource::Input);
        assert_eq!(history[0].state, json!({"q": 1}));
    }

    #[tokio::test]
    async fn test_replay_reproduces_latest_state_across_runs() {
        let mut graph = WorkflowGraph::new();
        graph.schema(StateSchema::new().field("messages", MergeStrategy::Append));
        graph.add_node("respond", |_state| {
            Box::pin(async move { Ok(json!({"messages": ["reply"]})) })
        });
        graph.set_entry("respond");
        graph.add_edge("respond", END);

        let compiled = graph
            .compile()
            .unwrap()
            .with_checkpointer(Arc::new(MemorySaver::new()));

        let first = compiled
            .run(json!({"messages": ["hi"]}), "chat", &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(first["messages"], json!(["hi", "reply"]));

        // Second turn: continue the thread from its persisted state.
        let mut resumed = compiled.get_state("chat").await.unwrap();
        resumed["messages"]
            .as_array_mut()
            .unwrap()
            .push(json!("more"));
        let second = compiled
            .run(resumed, "chat", &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(second["messages"], json!(["hi", "reply", "more", "reply"]));

        // Folding the full history reproduces the latest snapshot, with the
        // second run's input checkpoint acting as the reset point.
        let history = compiled.list_checkpoints("chat").await.unwrap();
        assert_eq!(history.len(), 4);
        let replayed = replay(compiled.schema(), &history).unwrap();
        assert_eq!(replayed, second);
        assert_eq!(compiled.get_state("chat").await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_get_state_requires_checkpointer() {
        let mut graph = WorkflowGraph::new();
        graph.add_node("noop", |state| Box::pin(async move { Ok(state) }));
        graph.set_entry("noop");
        graph.add_edge("noop", END);

        let compiled = graph.compile().unwrap();
        let err = compiled.get_state("t").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Execution(_)));
    }

    #[tokio::test]
    async fn test_get_state_unknown_thread_is_not_found() {
        let mut graph = WorkflowGraph::new();
        graph.add_node("noop", |state| Box::pin(async move { Ok(state) }));
        graph.set_entry("noop");
        graph.add_edge("noop", END);

        let compiled = graph
            .compile()
            .unwrap()
            .with_checkpointer(Arc::new(MemorySaver::new()));

        let err = compiled.get_state("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Checkpoint(CheckpointError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_yields_fragments_and_final_state() {
        let mut graph = WorkflowGraph::new();
        graph.add_streaming_node("talk", |_state, sink| {
            Box::pin(async move {
                sink.emit("Hel").await;
                sink.emit("lo").await;
                Ok(json!({"done": true}))
            })
        });
        graph.set_entry("talk");
        graph.add_edge("talk", END);

        let compiled = graph.compile().unwrap();
        let mut run = compiled.stream(json!({}), "t", &RunOptions::default());

        let mut collected = String::new();
        while let Some(fragment) = run.next_fragment().await {
            assert!(fragment.namespace.is_empty());
            collected.push_str(&fragment.text);
        }
        assert_eq!(collected, "Hello");

        let final_state = run.join().await.unwrap();
        assert_eq!(final_state["done"], json!(true));
    }

    #[tokio::test]
    async fn test_streaming_node_under_plain_run_discards_output() {
        let mut graph = WorkflowGraph::new();
        graph.add_streaming_node("talk", |_state, sink| {
            Box::pin(async move {
                sink.emit("ignored").await;
                Ok(json!({"done": true}))
            })
        });
        graph.set_entry("talk");
        graph.add_edge("talk", END);

        let compiled = graph.compile().unwrap();
        let result = compiled
            .run(json!({}), "t", &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(result["done"], json!(true));
    }

    #[tokio::test]
    async fn test_stream_reports_run_error_on_join() {
        let mut graph = WorkflowGraph::new();
        graph.add_node("explode", |_state| {
            Box::pin(async move { Err("boom".into()) })
        });
        graph.set_entry("explode");
        graph.add_edge("explode", END);

        let compiled = graph.compile().unwrap();
        let run = compiled.stream(json!({}), "t", &RunOptions::default());

        let err = run.join().await.unwrap_err();
        assert!(matches!(err, WorkflowError::NodeExecution { .. }));
    }

    #[test]
    fn test_run_options_defaults() {
        let options = RunOptions::default();
        assert_eq!(options.max_steps, 25);
        assert_eq!(options.fragment_buffer, 100);

        let parsed: RunOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.max_steps, 25);
        assert_eq!(parsed.fragment_buffer, 100);
    }
}
