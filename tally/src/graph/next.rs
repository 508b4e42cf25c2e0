//! Next-step result from a graph node: continue along the static edge, jump to a node, or end.
//!
//! The graph runner uses this to decide the next node or to stop.

/// Next step after running a node.
///
/// - **Continue**: follow the node's static edge (or END if it has none).
/// - **Node(id)**: jump to the given node.
/// - **End**: stop; return current state as final result.
///
/// Ignored for nodes that have conditional edges: the router decides instead.
///
/// **Interaction**: Returned by `Node::run`; consumed by `CompiledStateGraph::invoke`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Next {
    /// Follow the static edge; if the node has none, equivalent to End.
    Continue,
    /// Run the node with the given id next.
    Node(String),
    /// Stop and return the current state.
    End,
}
