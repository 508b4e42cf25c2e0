//! Node middleware: wrap node.run with external async logic (around pattern).
//!
//! Set via `StateGraph::with_middleware`.

use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use crate::error::AgentError;

use super::Next;

/// Boxed future returned by the wrapped node call.
pub type NodeFuture<S> = Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>>;

/// Async middleware that wraps node.run; implemented externally.
///
/// Can wrap `inner` calls; decide when to call, modify results, log, etc.
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Wraps node.run.
    ///
    /// - `node_id`: current node id
    /// - `state`: state passed to the node
    /// - `inner`: actual node.run logic, must be called to execute the node
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: Box<dyn FnOnce(S) -> NodeFuture<S> + Send>,
    ) -> Result<(S, Next), AgentError>;
}
