//! # Tally
//!
//! Answers natural-language analytics questions over a fixed set of e-commerce tables
//! (`orders`, `order_items`, `products`, `users`). A question flows through a small
//! **state-in, state-out** graph: classify intent, fetch schema, generate SQL, execute it,
//! summarize the results as business insights. Failed generation or execution routes to
//! an error handler that retries up to a fixed ceiling.
//!
//! ## Design principles
//!
//! - **Single state type**: one [`AnalysisState`] per run, moved into each node and returned.
//! - **Total nodes**: step failures are recorded in the state as a [`StepFailure`]; routers
//!   branch on its [`FailureKind`]. Nodes never abort the run.
//! - **Bounded retry**: an explicit [`RetryCeiling`] plus an engine step limit.
//! - **Injected capabilities**: [`LlmClient`], [`SchemaSource`] and [`QueryEngine`] are
//!   traits held as `Arc<dyn _>`; swap [`ChatOpenAI`] / [`SqliteWarehouse`] for the mocks in tests.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Next`], conditional
//!   edges, middleware, [`generate_dot`] / [`generate_text`].
//! - [`analysis`]: the six nodes, routers, the [`WORKFLOW`] table and the [`Analyzer`].
//! - [`state`]: [`AnalysisState`], [`QueryResults`], [`StepFailure`].
//! - [`llm`]: [`LlmClient`], [`MockLlm`], [`ChatOpenAI`].
//! - [`warehouse`]: [`SchemaSource`], [`QueryEngine`], [`ResultSet`], [`SqliteWarehouse`], mocks.
//! - [`catalog`]: the table catalog and [`AnalysisType`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tally::{Analyzer, AnalyzerConfig, ChatOpenAI, SqliteWarehouse};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let warehouse = Arc::new(SqliteWarehouse::open("tally.db")?);
//! let analyzer = Analyzer::new(
//!     Arc::new(ChatOpenAI::new("gpt-4o-mini")),
//!     warehouse.clone(),
//!     warehouse,
//!     AnalyzerConfig::default(),
//! )?;
//! let report = analyzer.analyze("Which product categories bring the most revenue?").await;
//! for insight in &report.insights {
//!     println!("{}", insight);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod catalog;
pub mod error;
pub mod graph;
pub mod llm;
pub mod message;
pub mod state;
pub mod warehouse;

pub use analysis::{
    AnalysisReport, Analyzer, AnalyzerConfig, BuildError, NodeId, RetryCeiling, WORKFLOW,
};
pub use catalog::{AnalysisType, TABLES};
pub use error::AgentError;
pub use graph::{
    generate_dot, generate_text, CompilationError, CompiledStateGraph, LoggingNodeMiddleware,
    Next, Node, NodeMiddleware, StateGraph, END, START,
};
pub use llm::{ChatOpenAI, LlmClient, LlmResponse, LlmUsage, MockLlm};
pub use message::Message;
pub use state::{AnalysisState, FailureKind, QueryResults, StepFailure, Termination};
pub use warehouse::{
    ColumnStats, FieldSchema, MockQueryEngine, MockSchemaSource, QueryEngine, ResultSet, Row,
    SchemaSource, SqliteWarehouse, WarehouseError,
};

#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::EnvFilter;

    #[ctor]
    fn init_test_logging() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}
