//! Workflow graph definition: nodes, edges, routers, and validation.
//!
//! A [`WorkflowGraph`] is built imperatively (add nodes, connect edges, set
//! the schema) and then [`compile`](WorkflowGraph::compile)d into a
//! [`CompiledWorkflow`](crate::compiled::CompiledWorkflow) for execution.
//! Compilation validates the whole structure up front, so a graph that
//! compiles cannot hit a structural error mid-run.
//!
//! # Structure
//!
//! - Every node is a named async transformation from state to *partial*
//!   state (the fields it wants merged).
//! - Every reachable node has exactly one outgoing [`Edge`], either direct
//!   or conditional. Conditional edges carry a [`Router`] whose declared
//!   labels are checked exhaustively against the branch map at compile time.
//! - Execution starts at [`START`] and finishes when an edge reaches
//!   [`END`]. Cycles are legal; the engine bounds them with a step limit.
//!
//! # Examples
//!
//! ```rust,no_run
//! use agentflow_core::graph::{Router, WorkflowGraph, END, START};
//! use agentflow_core::state::{MergeStrategy, StateSchema};
//! use std::collections::HashMap;
//!
//! let mut graph = WorkflowGraph::new();
//! graph.schema(StateSchema::new().field("drafts", MergeStrategy::Append));
//!
//! graph.add_node("generate", |_state| {
//!     Box::pin(async move { Ok(serde_json::json!({"drafts": ["first cut"]})) })
//! });
//! graph.add_node("evaluate", |_state| {
//!     Box::pin(async move { Ok(serde_json::json!({"verdict": "approved"})) })
//! });
//!
//! graph.set_entry("generate");
//! graph.add_edge("generate", "evaluate");
//! graph.add_conditional_edge(
//!     "evaluate",
//!     Router::new(["approved", "needs_improvement"], |state| {
//!         state["verdict"].as_str().unwrap_or("approved").to_string()
//!     }),
//!     HashMap::from([
//!         ("approved".to_string(), END.to_string()),
//!         ("needs_improvement".to_string(), "generate".to_string()),
//!     ]),
//! );
//!
//! let compiled = graph.compile().unwrap();
//! ```

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::compiled::CompiledWorkflow;
use crate::error::{Result, WorkflowError};
use crate::state::StateSchema;
use crate::stream::FragmentSink;

/// Virtual entry node. Execution begins by following its single edge.
pub const START: &str = "__start__";

/// Virtual exit node. An edge reaching it ends the run.
pub const END: &str = "__end__";

/// Unique node identifier within a graph.
pub type NodeId = String;

/// Future returned by a node executor.
///
/// The error is intentionally opaque: whatever a node's collaborator fails
/// with is carried as the cause of a
/// [`NodeExecution`](crate::error::WorkflowError::NodeExecution) error.
pub type NodeFuture = Pin<
    Box<
        dyn Future<Output = std::result::Result<Value, Box<dyn std::error::Error + Send + Sync>>>
            + Send,
    >,
>;

/// Executor shared by plain and streaming nodes.
///
/// Plain nodes ignore the [`FragmentSink`]; it is disconnected in
/// non-streaming runs either way.
pub type NodeExecutor = Arc<dyn Fn(Value, FragmentSink) -> NodeFuture + Send + Sync>;

/// A named node and its executor.
#[derive(Clone)]
pub struct NodeSpec {
    /// Node name, also its identifier in the graph.
    pub name: NodeId,
    /// The node's async transformation.
    pub executor: NodeExecutor,
}

impl std::fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeSpec")
            .field("name", &self.name)
            .field("executor", &"<function>")
            .finish()
    }
}

/// Routing function with its declared label set.
///
/// A router looks at the post-merge state and returns one of its declared
/// labels. Declaring the labels up front lets
/// [`compile`](WorkflowGraph::compile) verify that every label has a mapped
/// branch, so a well-behaved router can never produce an unmapped label at
/// runtime.
#[derive(Clone)]
pub struct Router {
    labels: Vec<String>,
    select: Arc<dyn Fn(&Value) -> String + Send + Sync>,
}

impl Router {
    /// Create a router from its label set and selection function.
    pub fn new<I, S, F>(labels: I, select: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            select: Arc::new(select),
        }
    }

    /// The labels this router declared it can return.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Evaluate the router against a state.
    pub fn select(&self, state: &Value) -> String {
        (self.select)(state)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("labels", &self.labels)
            .field("select", &"<function>")
            .finish()
    }
}

/// Outgoing connection from a node.
#[derive(Clone)]
pub enum Edge {
    /// Unconditional transition to a target node.
    Direct(NodeId),

    /// Routed transition: the router picks a label, the branch map turns the
    /// label into a target node.
    Conditional {
        /// Label selection function with its declared labels.
        router: Router,
        /// Label to target-node mapping. Must cover every declared label.
        branches: HashMap<String, NodeId>,
    },
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Direct(target) => f.debug_tuple("Direct").field(target).finish(),
            Edge::Conditional { router, branches } => f
                .debug_struct("Conditional")
                .field("router", router)
                .field("branches", branches)
                .finish(),
        }
    }
}

/// Mutable workflow graph under construction.
///
/// Finish with [`compile`](Self::compile); the graph itself is never
/// executed directly.
#[derive(Debug, Default)]
pub struct WorkflowGraph {
    nodes: HashMap<NodeId, NodeSpec>,
    edges: HashMap<NodeId, Vec<Edge>>,
    schema: StateSchema,
}

impl WorkflowGraph {
    /// Create an empty graph with a default (all-overwrite) schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state schema nodes' partial outputs are merged through.
    pub fn schema(&mut self, schema: StateSchema) -> &mut Self {
        self.schema = schema;
        self
    }

    /// Add a node whose executor only returns a final partial state.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # let mut graph = agentflow_core::graph::WorkflowGraph::new();
    /// graph.add_node("compute_bmi", |state| {
    ///     Box::pin(async move {
    ///         let weight = state["weight"].as_f64().ok_or("missing weight")?;
    ///         let height = state["height"].as_f64().ok_or("missing height")?;
    ///         Ok(serde_json::json!({"bmi": weight / (height * height)}))
    ///     })
    /// });
    /// ```
    pub fn add_node<F>(&mut self, id: impl Into<NodeId>, executor: F) -> &mut Self
    where
        F: Fn(Value) -> NodeFuture + Send + Sync + 'static,
    {
        let id = id.into();
        let executor: NodeExecutor = Arc::new(move |state, _sink| executor(state));
        self.nodes.insert(
            id.clone(),
            NodeSpec {
                name: id,
                executor,
            },
        );
        self
    }

    /// Add a node that can emit incremental output through a
    /// [`FragmentSink`] while it works.
    ///
    /// In a non-streaming run the sink is disconnected and emits are no-ops,
    /// so the executor needs no mode awareness.
    pub fn add_streaming_node<F>(&mut self, id: impl Into<NodeId>, executor: F) -> &mut Self
    where
        F: Fn(Value, FragmentSink) -> NodeFuture + Send + Sync + 'static,
    {
        let id = id.into();
        self.nodes.insert(
            id.clone(),
            NodeSpec {
                name: id,
                executor: Arc::new(executor),
            },
        );
        self
    }

    /// Add an unconditional edge.
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> &mut Self {
        self.edges
            .entry(from.into())
            .or_default()
            .push(Edge::Direct(to.into()));
        self
    }

    /// Add a conditional edge routed by `router` through `branches`.
    pub fn add_conditional_edge(
        &mut self,
        from: impl Into<NodeId>,
        router: Router,
        branches: HashMap<String, NodeId>,
    ) -> &mut Self {
        self.edges
            .entry(from.into())
            .or_default()
            .push(Edge::Conditional { router, branches });
        self
    }

    /// Connect [`START`] to the given node.
    pub fn set_entry(&mut self, node: impl Into<NodeId>) -> &mut Self {
        self.add_edge(START, node)
    }

    /// Validate the structure and produce an executable workflow.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Structure`] when:
    ///
    /// - [`START`] has no outgoing edge, or more than one
    /// - any node has more than one outgoing edge
    /// - an edge source is not a declared node
    /// - an edge or branch target is neither a declared node nor [`END`]
    /// - a router declares a label with no mapped branch
    /// - a reachable node has no outgoing edge
    ///
    /// Branch keys beyond the router's declared labels are tolerated;
    /// unreachable nodes are tolerated.
    pub fn compile(self) -> Result<CompiledWorkflow> {
        self.validate()?;
        Ok(CompiledWorkflow::new(self.nodes, self.edges, self.schema))
    }

    fn validate(&self) -> Result<()> {
        if self.edges.get(START).map_or(0, Vec::len) == 0 {
            return Err(WorkflowError::structure(
                "no entry edge: connect __start__ to a node with set_entry or add_edge",
            ));
        }

        for (from, edges) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(WorkflowError::structure(format!(
                    "edge source '{from}' is not a declared node"
                )));
            }
            if edges.len() > 1 {
                return Err(WorkflowError::structure(format!(
                    "node '{from}' has {} outgoing edges; exactly one is allowed",
                    edges.len()
                )));
            }
            for edge in edges {
                match edge {
                    Edge::Direct(to) => self.check_target(from, to)?,
                    Edge::Conditional { router, branches } => {
                        for to in branches.values() {
                            self.check_target(from, to)?;
                        }
                        for label in router.labels() {
                            if !branches.contains_key(label) {
                                return Err(WorkflowError::structure(format!(
                                    "router after '{from}' declares label '{label}' with no mapped branch"
                                )));
                            }
                        }
                    }
                }
            }
        }

        for node in self.reachable_nodes() {
            if node != END && !self.edges.contains_key(&node) {
                return Err(WorkflowError::structure(format!(
                    "node '{node}' is reachable but has no outgoing edge"
                )));
            }
        }

        Ok(())
    }

    fn check_target(&self, from: &str, to: &str) -> Result<()> {
        if to != END && !self.nodes.contains_key(to) {
            return Err(WorkflowError::structure(format!(
                "edge from '{from}' targets undeclared node '{to}'"
            )));
        }
        Ok(())
    }

    /// Nodes reachable from [`START`], excluding the sentinels.
    fn reachable_nodes(&self) -> HashSet<NodeId> {
        let mut seen = HashSet::new();
        let mut frontier = vec![START.to_string()];
        while let Some(current) = frontier.pop() {
            for edge in self.edges.get(&current).into_iter().flatten() {
                let targets: Vec<&NodeId> = match edge {
                    Edge::Direct(to) => vec![to],
                    Edge::Conditional { branches, .. } => branches.values().collect(),
                };
                for to in targets {
                    if to != END && seen.insert(to.clone()) {
                        frontier.push(to.clone());
                    }
                }
            }
        }
        seen
    }
}
