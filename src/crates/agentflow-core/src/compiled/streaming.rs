//! Streaming execution: the run loop on a background task, fragments out
//! through a bounded channel.

use serde_json::Value;
use tokio::sync::mpsc;

use super::types::{RunOptions, StreamingRun};
use super::CompiledWorkflow;
use crate::stream::FragmentSink;

impl CompiledWorkflow {
    /// Execute the workflow on a background task, surfacing node output as
    /// it is produced.
    ///
    /// Nodes added with
    /// [`add_streaming_node`](crate::graph::WorkflowGraph::add_streaming_node)
    /// receive a connected [`FragmentSink`] and their fragments arrive on the
    /// returned [`StreamingRun`] while the run is still in flight. Execution
    /// semantics are identical to [`run`](Self::run): same merge, same
    /// checkpoints, same final state.
    ///
    /// The fragment channel is bounded at `options.fragment_buffer`; a
    /// producer behind a slow consumer waits rather than buffering without
    /// limit. Dropping the `StreamingRun` receiver does not abort the run,
    /// it only discards output.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use agentflow_core::compiled::RunOptions;
    /// use agentflow_core::graph::WorkflowGraph;
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let compiled = WorkflowGraph::new().compile()?;
    /// let mut run = compiled.stream(json!({}), "thread-1", &RunOptions::default());
    /// while let Some(fragment) = run.next_fragment().await {
    ///     print!("{}", fragment.text);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn stream(
        &self,
        initial_state: Value,
        thread_id: &str,
        options: &RunOptions,
    ) -> StreamingRun {
        let (tx, rx) = mpsc::channel(options.fragment_buffer.max(1));
        let sink = FragmentSink::new(tx);

        let workflow = self.clone();
        let thread_id = thread_id.to_string();
        let options = options.clone();

        let handle = tokio::spawn(async move {
            let result = workflow
                .execute(initial_state, &thread_id, &options, sink)
                .await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "streaming run failed");
            }
            result
        });

        StreamingRun::new(rx, handle)
    }
}
