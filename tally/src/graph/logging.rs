//! Logging utilities for graph execution.
//!
//! Structured `tracing` events for graph start/complete/error and per-node execution.

use std::fmt::Debug;

/// Log node execution start.
pub fn log_node_start(node_id: &str) {
    tracing::debug!(node_id = node_id, "Starting node execution");
}

/// Log the input state of a node.
pub fn log_node_state<S: Debug>(node_id: &str, state: &S) {
    tracing::trace!(node_id = node_id, state = ?state, "Node execution: state");
}

/// Log node execution completion.
pub fn log_node_complete(node_id: &str, next: &crate::graph::Next) {
    tracing::debug!(node_id = node_id, ?next, "Node execution complete");
}

/// Log graph execution start.
pub fn log_graph_start() {
    tracing::info!("Starting graph execution");
}

/// Log graph execution completion.
pub fn log_graph_complete(steps: usize) {
    tracing::info!(steps, "Graph execution complete");
}

/// Log graph execution error.
pub fn log_graph_error(error: &crate::error::AgentError) {
    tracing::error!(?error, "Graph execution error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_functions() {
        // These should not panic
        log_node_start("test_node");
        log_node_state("test_node", &());
        log_node_complete("test_node", &crate::graph::Next::End);
        log_graph_start();
        log_graph_complete(3);
        log_graph_error(&crate::error::AgentError::ExecutionFailed(
            "test".to_string(),
        ));
    }
}
