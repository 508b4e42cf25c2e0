//! Engine and capability error types.
//!
//! Returned by `Node::run` when a node hits an unexpected internal fault, by the
//! graph run loop, and by the text-completion port (`LlmClient::invoke`).

use std::time::Duration;

use thiserror::Error;

/// Agent execution error.
///
/// Analysis nodes never return this for ordinary step failures; those are captured
/// into the state as a `StepFailure`. It surfaces from capability calls (before a node
/// converts it) and from the graph engine itself.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed, unknown node).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// An external call did not finish before its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The run executed more nodes than the compiled graph allows.
    #[error("step limit exceeded: more than {0} node executions")]
    StepLimitExceeded(usize),
}
