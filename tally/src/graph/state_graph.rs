//! State graph: nodes + explicit edges (from → to) and optional conditional edges.
//!
//! Add nodes with `add_node`, define the chain with `add_edge(from, to)` using
//! `START` and `END` for graph entry/exit. Use `add_conditional_edges` to route
//! to the next node based on state. Then `compile` to get a `CompiledStateGraph`.
//!
//! # Conditional edges
//!
//! From a source node, a routing function `(state) -> key` is called; the key is
//! used as the next node id, or looked up in an optional path map. A node must have
//! either one outgoing `add_edge` or `add_conditional_edges`, not both.
//!
//! # Termination
//!
//! Graphs with conditional edges may loop. The compiled graph counts node executions
//! and fails with `AgentError::StepLimitExceeded` once `step_limit` is exceeded.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::CompiledStateGraph;
use crate::graph::conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// Node executions allowed per invoke unless overridden with `with_step_limit`.
pub const DEFAULT_STEP_LIMIT: usize = 25;

/// State graph: nodes plus explicit edges and optional conditional edges.
///
/// Generic over state type `S`. Build with `add_node` / `add_edge(from, to)` (use
/// `START` and `END` for entry/exit), and optionally `add_conditional_edges` for
/// state-based routing. Then `compile()` to obtain an executable graph.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces `CompiledStateGraph<S>`.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// Edges (from_id, to_id). A node may have one outgoing edge or conditional_edges, not both.
    edges: Vec<(String, String)>,
    /// Conditional edges: source node id -> (router, path_map).
    conditional_edges: HashMap<String, ConditionalRouter<S>>,
    /// Optional node middleware; when set, `compile()` wraps every node run with it.
    middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    /// Maximum node executions per invoke.
    step_limit: usize,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
            middleware: None,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Attaches node middleware for fluent API. When set, `compile()` will use it.
    /// Chain with `compile()`: `graph.with_middleware(m).compile()?`.
    pub fn with_middleware(self, middleware: Arc<dyn NodeMiddleware<S>>) -> Self {
        Self {
            middleware: Some(middleware),
            ..self
        }
    }

    /// Sets the maximum number of node executions per invoke.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tally::graph::StateGraph;
    ///
    /// let graph = StateGraph::<String>::new().with_step_limit(10);
    /// # let _ = graph;
    /// ```
    pub fn with_step_limit(self, step_limit: usize) -> Self {
        Self { step_limit, ..self }
    }

    /// Adds a node; id must be unique. Replaces if same id.
    ///
    /// Returns `&mut Self` for method chaining. Use `add_edge` to include it in the chain.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds an edge from `from_id` to `to_id`.
    ///
    /// Use `START` for graph entry and `END` for graph exit. Both ids (except
    /// START/END) must be registered via `add_node` before `compile()`.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds conditional edges from `source` node: next node is determined by `path(state)`.
    ///
    /// After the source node runs, `path` is called with the updated state; its return value
    /// is used as the next node id, or looked up in `path_map` when provided.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use std::sync::Arc;
    /// use async_trait::async_trait;
    /// use tally::graph::{Next, Node, StateGraph, END, START};
    /// use tally::AgentError;
    ///
    /// struct Bump(&'static str);
    ///
    /// #[async_trait]
    /// impl Node<i32> for Bump {
    ///     fn id(&self) -> &str {
    ///         self.0
    ///     }
    ///     async fn run(&self, n: i32) -> Result<(i32, Next), AgentError> {
    ///         Ok((n + 1, Next::Continue))
    ///     }
    /// }
    ///
    /// let mut graph = StateGraph::<i32>::new();
    /// graph
    ///     .add_node("check", Arc::new(Bump("check")))
    ///     .add_node("bump", Arc::new(Bump("bump")))
    ///     .add_edge(START, "check")
    ///     .add_edge("bump", END);
    /// let map: BTreeMap<String, String> = [
    ///     ("more".to_string(), "bump".to_string()),
    ///     ("done".to_string(), END.to_string()),
    /// ]
    /// .into_iter()
    /// .collect();
    /// graph.add_conditional_edges(
    ///     "check",
    ///     Arc::new(|n: &i32| if *n < 3 { "more".into() } else { "done".into() }),
    ///     Some(map),
    /// );
    /// assert!(graph.compile().is_ok());
    /// ```
    pub fn add_conditional_edges(
        &mut self,
        source: impl Into<String>,
        path: ConditionalRouterFn<S>,
        path_map: Option<BTreeMap<String, String>>,
    ) -> &mut Self {
        self.conditional_edges
            .insert(source.into(), ConditionalRouter::new(path, path_map));
        self
    }

    /// Builds the executable graph: validates that all edge node ids exist, that there is
    /// one entry from START and some way to reach END, and that no node mixes a static
    /// edge with conditional edges.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        for (from, to) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(CompilationError::NodeNotFound(to.clone()));
            }
        }
        for (source, router) in &self.conditional_edges {
            if !self.nodes.contains_key(source) {
                return Err(CompilationError::NodeNotFound(source.clone()));
            }
            if let Some(path_map) = router.path_map() {
                for target in path_map.values() {
                    if target != END && !self.nodes.contains_key(target) {
                        return Err(CompilationError::InvalidConditionalPathMap(target.clone()));
                    }
                }
            }
        }

        let mut start_edges = self
            .edges
            .iter()
            .filter(|(f, _)| f == START)
            .map(|(_, t)| t.clone());
        let first = match (start_edges.next(), start_edges.next()) {
            (None, _) => return Err(CompilationError::MissingStart),
            (Some(first), None) => first,
            (Some(_), Some(_)) => {
                return Err(CompilationError::InvalidChain(
                    "multiple edges from START (branch)".into(),
                ))
            }
        };

        let has_end = self.edges.iter().any(|(_, t)| t == END)
            || self.conditional_edges.values().any(|r| {
                r.path_map()
                    .map_or(true, |m| m.values().any(|v| v == END))
            });
        if !has_end {
            return Err(CompilationError::MissingEnd);
        }

        let static_edges: Vec<&(String, String)> =
            self.edges.iter().filter(|(f, _)| f.as_str() != START).collect();
        let edge_froms: HashSet<&String> = static_edges.iter().map(|(f, _)| f).collect();
        if edge_froms.len() != static_edges.len() {
            return Err(CompilationError::InvalidChain(
                "duplicate from (branch)".into(),
            ));
        }
        for source in self.conditional_edges.keys() {
            if edge_froms.contains(source) {
                return Err(CompilationError::NodeHasBothEdgeAndConditional(
                    source.clone(),
                ));
            }
        }

        if self.conditional_edges.is_empty() {
            let linear_next: HashMap<&str, &str> = static_edges
                .iter()
                .map(|(f, t)| (f.as_str(), t.as_str()))
                .collect();
            let mut current = first.as_str();
            let mut visited = HashSet::from([current]);
            while let Some(&next) = linear_next.get(current) {
                if next == END {
                    break;
                }
                if !visited.insert(next) {
                    return Err(CompilationError::InvalidChain("cycle detected".into()));
                }
                current = next;
            }
        }

        let mut next_map: HashMap<String, NextEntry<S>> = static_edges
            .iter()
            .map(|(f, t)| (f.clone(), NextEntry::Unconditional(t.clone())))
            .collect();
        for (source, router) in self.conditional_edges {
            next_map.insert(source, NextEntry::Conditional(router));
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            first_node_id: first,
            next_map,
            middleware: self.middleware,
            step_limit: self.step_limit,
        })
    }
}
