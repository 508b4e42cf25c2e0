//! E-commerce analysis workflow: nodes, routers, the workflow table and the `Analyzer`.
//!
//! ```text
//! classify_intent -> fetch_schema -> generate_query -[execute]-> execute_query -[insights]-> generate_insights -> END
//!                                          |  ^                        |
//!                                   [error]|  |[retry]          [error]|
//!                                          v  |                        v
//!                                        handle_error <----------------+
//!                                          |
//!                                     [end]+-> END
//! ```

mod analyzer;
pub mod nodes;
pub mod prompt;
mod retry;
pub mod routes;
pub mod workflow;

pub use analyzer::{AnalysisReport, Analyzer, AnalyzerConfig, BuildError, DEFAULT_CALL_TIMEOUT};
pub use retry::RetryCeiling;
pub use routes::{AfterExecuteQuery, AfterGenerateQuery, AfterHandleError};
pub use workflow::{build_graph, Capabilities, EdgeSpec, NodeId, Target, WorkflowEntry, ENTRY, WORKFLOW};
