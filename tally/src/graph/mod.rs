//! State graph: nodes + static and conditional edges, compile and invoke.
//!
//! StateGraph: add nodes and edges, compile, then invoke with state. The compiled
//! graph moves the state into each node in turn and routes on the returned state.

mod compile_error;
mod compiled;
mod conditional;
mod logging;
mod logging_middleware;
mod next;
mod node;
mod node_middleware;
mod state_graph;
mod visualization;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_node_state,
};
pub use logging_middleware::LoggingNodeMiddleware;
pub use next::Next;
pub use node::Node;
pub use node_middleware::{NodeFuture, NodeMiddleware};
pub use state_graph::{StateGraph, DEFAULT_STEP_LIMIT, END, START};
pub use visualization::{generate_dot, generate_text};
