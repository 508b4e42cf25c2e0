//! Compiled state graph: immutable, supports invoke only.
//!
//! Built by `StateGraph::compile`. Holds nodes, the entry node, and the next map
//! (static edge or conditional router per node). The run loop moves the state
//! through one node at a time and stops at END.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use tracing::debug;

use crate::error::AgentError;

use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_node_state,
};
use super::node_middleware::NodeMiddleware;
use super::state_graph::END;
use super::{Next, NextEntry, Node};

/// Compiled graph: immutable structure, supports invoke only.
///
/// Created by `StateGraph::compile()`. Runs from the first node; uses the conditional
/// router (when present) or each node's returned `Next` to choose the next node.
/// Cheap to share: one compiled graph serves any number of concurrent invocations,
/// each with its own state value.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// First node to run (from START).
    pub(super) first_node_id: String,
    /// Map from node id to how to get next: Unconditional(to_id) or Conditional(router).
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    /// Optional node middleware; set when built with `with_middleware`.
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    /// Maximum node executions per invoke.
    pub(super) step_limit: usize,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Id of the entry node.
    pub fn first_node_id(&self) -> &str {
        &self.first_node_id
    }

    /// Registered node ids, sorted.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// How the node `id` chooses its successor, if it has an outgoing edge.
    pub fn next_entry(&self, id: &str) -> Option<&NextEntry<S>> {
        self.next_map.get(id)
    }

    /// Maximum node executions per invoke.
    pub fn step_limit(&self) -> usize {
        self.step_limit
    }

    async fn execute_node(&self, node: Arc<dyn Node<S>>, state: S) -> Result<(S, Next), AgentError> {
        match &self.middleware {
            Some(middleware) => {
                let node_id = node.id().to_string();
                middleware
                    .around_run(
                        &node_id,
                        state,
                        Box::new(move |s| Box::pin(async move { node.run(s).await })),
                    )
                    .await
            }
            None => node.run(state).await,
        }
    }

    /// Picks the successor of `current_id` given the updated state and the node's `Next`.
    ///
    /// Returns `None` when the run should stop.
    fn resolve_next(&self, current_id: &str, state: &S, next: Next) -> Option<String> {
        if let Some(NextEntry::Conditional(router)) = self.next_map.get(current_id) {
            let target = router.resolve_next(state);
            debug!(from = %current_id, to = %target, "conditional routing");
            return Some(target);
        }
        match next {
            Next::End => None,
            Next::Node(id) => Some(id),
            Next::Continue => match self.next_map.get(current_id) {
                Some(NextEntry::Unconditional(id)) => Some(id.clone()),
                _ => None,
            },
        }
    }

    /// Runs the graph with the given state, starting at the entry node.
    ///
    /// - `Next::Continue`: follow the node's static edge, or end if it has none.
    /// - `Next::Node(id)`: run the node with that id next.
    /// - `Next::End`: stop and return current state.
    ///
    /// Nodes with conditional edges are routed by their router regardless of `Next`.
    /// Fails when a node returns `Err`, when routing names an unknown node, or when
    /// more than `step_limit` nodes have run.
    pub async fn invoke(&self, state: S) -> Result<S, AgentError> {
        if !self.nodes.contains_key(&self.first_node_id) {
            return Err(AgentError::ExecutionFailed("empty graph".into()));
        }
        log_graph_start();

        let mut state = state;
        let mut current_id = self.first_node_id.clone();
        let mut steps = 0usize;
        loop {
            if steps >= self.step_limit {
                let err = AgentError::StepLimitExceeded(self.step_limit);
                log_graph_error(&err);
                return Err(err);
            }
            steps += 1;

            let node = match self.nodes.get(&current_id) {
                Some(node) => Arc::clone(node),
                None => {
                    let err = AgentError::ExecutionFailed(format!("unknown node: {}", current_id));
                    log_graph_error(&err);
                    return Err(err);
                }
            };

            log_node_start(&current_id);
            log_node_state(&current_id, &state);

            let (new_state, next) = match self.execute_node(node, state).await {
                Ok(output) => output,
                Err(e) => {
                    log_graph_error(&e);
                    return Err(e);
                }
            };
            state = new_state;
            log_node_complete(&current_id, &next);

            match self.resolve_next(&current_id, &state, next) {
                Some(id) if id != END => current_id = id,
                _ => break,
            }
        }

        log_graph_complete(steps);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;

    use super::*;
    use crate::graph::test_support::PassNode;
    use crate::graph::{StateGraph, START};

    #[derive(Clone, Debug, Default)]
    struct Counter {
        visits: Vec<String>,
        value: i32,
    }

    struct Bump;

    #[async_trait]
    impl Node<Counter> for Bump {
        fn id(&self) -> &str {
            "bump"
        }
        async fn run(&self, mut state: Counter) -> Result<(Counter, Next), AgentError> {
            state.value += 1;
            state.visits.push("bump".into());
            Ok((state, Next::Continue))
        }
    }

    struct Fails;

    #[async_trait]
    impl Node<Counter> for Fails {
        fn id(&self) -> &str {
            "fails"
        }
        async fn run(&self, _state: Counter) -> Result<(Counter, Next), AgentError> {
            Err(AgentError::ExecutionFailed("boom".into()))
        }
    }

    /// Records its id in `visits`, then returns the configured `Next`.
    struct Visit(&'static str, Next);

    #[async_trait]
    impl Node<Counter> for Visit {
        fn id(&self) -> &str {
            self.0
        }
        async fn run(&self, mut state: Counter) -> Result<(Counter, Next), AgentError> {
            state.visits.push(self.0.into());
            Ok((state, self.1.clone()))
        }
    }

    fn chain_abc(first: Next) -> CompiledStateGraph<Counter> {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("a", Arc::new(Visit("a", first)))
            .add_node("b", Arc::new(Visit("b", Next::Continue)))
            .add_node("c", Arc::new(Visit("c", Next::Continue)))
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", "c")
            .add_edge("c", END);
        graph.compile().unwrap()
    }

    fn looping_graph(limit: i32, step_limit: usize) -> CompiledStateGraph<Counter> {
        let mut graph = StateGraph::<Counter>::new().with_step_limit(step_limit);
        let map: BTreeMap<String, String> = [
            ("again".to_string(), "bump".to_string()),
            ("done".to_string(), END.to_string()),
        ]
        .into_iter()
        .collect();
        graph
            .add_node("bump", Arc::new(Bump))
            .add_edge(START, "bump")
            .add_conditional_edges(
                "bump",
                Arc::new(move |s: &Counter| {
                    if s.value < limit {
                        "again".into()
                    } else {
                        "done".into()
                    }
                }),
                Some(map),
            );
        graph.compile().unwrap()
    }

    #[tokio::test]
    async fn invoke_linear_chain_runs_every_node() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("noop", Arc::new(PassNode("noop")))
            .add_node("bump", Arc::new(Bump))
            .add_edge(START, "noop")
            .add_edge("noop", "bump")
            .add_edge("bump", END);
        let compiled = graph.compile().unwrap();
        let out = compiled.invoke(Counter::default()).await.unwrap();
        assert_eq!(out.value, 1);
        assert_eq!(compiled.first_node_id(), "noop");
        assert_eq!(compiled.node_ids(), vec!["bump", "noop"]);
    }

    /// **Scenario**: A node returning `Next::Node` skips its static edge and jumps.
    #[tokio::test]
    async fn invoke_jumps_to_node_named_by_next() {
        let compiled = chain_abc(Next::Node("c".into()));
        let out = compiled.invoke(Counter::default()).await.unwrap();
        assert_eq!(out.visits, vec!["a", "c"]);
    }

    /// **Scenario**: A node returning `Next::End` stops the run before its static successor.
    #[tokio::test]
    async fn invoke_stops_when_node_returns_end() {
        let compiled = chain_abc(Next::End);
        let out = compiled.invoke(Counter::default()).await.unwrap();
        assert_eq!(out.visits, vec!["a"]);
    }

    #[tokio::test]
    async fn invoke_fails_on_jump_to_unknown_node() {
        let compiled = chain_abc(Next::Node("ghost".into()));
        match compiled.invoke(Counter::default()).await {
            Err(AgentError::ExecutionFailed(msg)) => assert!(msg.contains("unknown node: ghost")),
            other => panic!("expected unknown node error, got {:?}", other.map(|s| s.visits)),
        }
    }

    /// **Scenario**: A conditional router overrides whatever `Next` the node returned.
    #[tokio::test]
    async fn conditional_router_takes_precedence_over_next() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("a", Arc::new(Visit("a", Next::End)))
            .add_node("b", Arc::new(Visit("b", Next::Continue)))
            .add_edge(START, "a")
            .add_edge("b", END)
            .add_conditional_edges(
                "a",
                Arc::new(|_: &Counter| "b".to_string()),
                Some([("b".to_string(), "b".to_string())].into_iter().collect()),
            );
        let out = graph.compile().unwrap().invoke(Counter::default()).await.unwrap();
        assert_eq!(out.visits, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn invoke_follows_conditional_loop_until_router_ends() {
        let compiled = looping_graph(3, 10);
        let out = compiled.invoke(Counter::default()).await.unwrap();
        assert_eq!(out.value, 3);
        assert_eq!(out.visits.len(), 3);
    }

    #[tokio::test]
    async fn invoke_stops_at_step_limit() {
        let compiled = looping_graph(100, 5);
        match compiled.invoke(Counter::default()).await {
            Err(AgentError::StepLimitExceeded(n)) => assert_eq!(n, 5),
            other => panic!("expected StepLimitExceeded, got {:?}", other.map(|s| s.value)),
        }
    }

    #[tokio::test]
    async fn invoke_propagates_node_error() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("fails", Arc::new(Fails))
            .add_edge(START, "fails")
            .add_edge("fails", END);
        let compiled = graph.compile().unwrap();
        let err = compiled.invoke(Counter::default()).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn invoke_with_middleware_wraps_each_node() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        use crate::graph::{NodeFuture, NodeMiddleware};

        struct CountingMiddleware(Arc<AtomicUsize>);

        #[async_trait]
        impl NodeMiddleware<Counter> for CountingMiddleware {
            async fn around_run(
                &self,
                _node_id: &str,
                state: Counter,
                inner: Box<dyn FnOnce(Counter) -> NodeFuture<Counter> + Send>,
            ) -> Result<(Counter, Next), AgentError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                inner(state).await
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let mut graph = StateGraph::<Counter>::new()
            .with_middleware(Arc::new(CountingMiddleware(Arc::clone(&calls))));
        graph
            .add_node("a", Arc::new(PassNode("a")))
            .add_node("bump", Arc::new(Bump))
            .add_edge(START, "a")
            .add_edge("a", "bump")
            .add_edge("bump", END);
        let compiled = graph.compile().unwrap();
        compiled.invoke(Counter::default()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
