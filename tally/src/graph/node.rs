//! Graph node trait: one step in a StateGraph.
//!
//! Receives state `S` by value, returns updated `S` and `Next` (continue, jump, or end).
//! Used by `StateGraph` and `CompiledStateGraph`.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;

use super::Next;

/// One step in a graph: state in, (state out, next step).
///
/// The node owns the state for the duration of the call; no other node runs
/// concurrently within one invocation. Returning `Err` aborts the whole run, so
/// nodes that must stay total capture their failures into `S` instead.
///
/// **Interaction**: Registered via `StateGraph::add_node`; driven by `CompiledStateGraph::invoke`.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"generate_query"`). Must be unique within a graph.
    fn id(&self) -> &str;

    /// One step: state in, (state out, next step).
    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;
}
