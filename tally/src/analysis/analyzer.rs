//! `Analyzer`: the public entry point. Owns the capability ports and the compiled
//! workflow; each `analyze` call runs the graph on a fresh state.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::catalog::{self, AnalysisType};
use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph};
use crate::llm::LlmClient;
use crate::state::{AnalysisState, QueryResults, StepFailure, Termination};
use crate::warehouse::{FieldSchema, QueryEngine, SchemaSource};

use super::nodes::call_with_deadline;
use super::workflow::{build_graph, Capabilities};
use super::RetryCeiling;

/// Default deadline for one capability call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Tunables of an `Analyzer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub retry_ceiling: RetryCeiling,
    /// Deadline for each LLM, schema or query call.
    pub call_timeout: Duration,
    /// Print node enter/exit to stderr.
    pub verbose: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            retry_ceiling: RetryCeiling::DEFAULT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            verbose: false,
        }
    }
}

/// Error building an `Analyzer`.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("workflow graph: {0}")]
    Graph(#[from] CompilationError),
}

/// Outcome of one `analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// True only when the run ended with insights.
    pub success: bool,
    pub user_query: String,
    pub analysis_type: Option<AnalysisType>,
    pub generated_sql: String,
    pub query_results: Option<QueryResults>,
    pub insights: Vec<String>,
    pub error_count: u32,
    pub last_error: Option<StepFailure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<StepFailure>,
    pub termination: Option<Termination>,
    /// Set only when the engine itself failed (e.g. step limit).
    pub error: Option<String>,
}

impl AnalysisReport {
    fn from_state(state: AnalysisState) -> Self {
        Self {
            success: state.is_success(),
            user_query: state.user_query,
            analysis_type: state.analysis_type,
            generated_sql: state.generated_sql,
            query_results: state.query_results,
            insights: state.insights,
            error_count: state.error_count,
            last_error: state.last_error,
            failures: state.failures,
            termination: state.termination,
            error: None,
        }
    }

    fn engine_failure(user_query: &str, error: &AgentError) -> Self {
        Self {
            success: false,
            user_query: user_query.to_string(),
            analysis_type: None,
            generated_sql: String::new(),
            query_results: None,
            insights: Vec::new(),
            error_count: 0,
            last_error: None,
            failures: Vec::new(),
            termination: None,
            error: Some(error.to_string()),
        }
    }

    /// Why the run did not succeed: the engine error, else the last step failure.
    pub fn failure_reason(&self) -> Option<String> {
        if self.success {
            return None;
        }
        self.error
            .clone()
            .or_else(|| self.last_error.as_ref().map(ToString::to_string))
            .or_else(|| Some("analysis did not complete".to_string()))
    }
}

/// Answers analytics questions by running the workflow graph.
///
/// `Send + Sync`; concurrent `analyze` calls share the ports but each works on its
/// own state.
///
/// **Interaction**: Built by the CLI from settings; tests build it over the mocks.
pub struct Analyzer {
    capabilities: Capabilities,
    config: AnalyzerConfig,
    graph: CompiledStateGraph<AnalysisState>,
}

impl Analyzer {
    /// Compiles the workflow over the given ports. No port is called.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        schema: Arc<dyn SchemaSource>,
        engine: Arc<dyn QueryEngine>,
        config: AnalyzerConfig,
    ) -> Result<Self, BuildError> {
        let capabilities = Capabilities {
            llm,
            schema,
            engine,
        };
        let graph = build_graph(&capabilities, &config)?;
        Ok(Self {
            capabilities,
            config,
            graph,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// The compiled workflow (for rendering).
    pub fn graph(&self) -> &CompiledStateGraph<AnalysisState> {
        &self.graph
    }

    /// Runs the workflow and returns the final state, or the engine error.
    pub async fn run(&self, user_query: &str) -> Result<AnalysisState, AgentError> {
        self.graph.invoke(AnalysisState::new(user_query)).await
    }

    /// Runs one analysis. Never fails: engine errors come back in `AnalysisReport::error`.
    pub async fn analyze(&self, user_query: &str) -> AnalysisReport {
        info!(query = %user_query, "starting analysis");
        match self.run(user_query).await {
            Ok(state) => {
                let report = AnalysisReport::from_state(state);
                info!(
                    success = report.success,
                    error_count = report.error_count,
                    "analysis finished"
                );
                report
            }
            Err(e) => {
                error!(error = %e, "analysis aborted");
                AnalysisReport::engine_failure(user_query, &e)
            }
        }
    }

    /// Schema of `table`, or of every catalog table when `None`.
    pub async fn schema_info(
        &self,
        table: Option<&str>,
    ) -> BTreeMap<String, Result<Vec<FieldSchema>, String>> {
        let tables: Vec<&str> = match table {
            Some(t) => vec![t],
            None => catalog::table_names().collect(),
        };
        let mut out = BTreeMap::new();
        for name in tables {
            let fields = call_with_deadline(
                self.config.call_timeout,
                self.capabilities.schema.table_schema(name),
            )
            .await;
            out.insert(name.to_string(), fields);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::warehouse::{MockQueryEngine, MockSchemaSource, ResultSet};

    fn analyzer(llm: MockLlm, engine: MockQueryEngine) -> Analyzer {
        let schema = MockSchemaSource::new()
            .with_table("orders", vec![FieldSchema::new("order_id", "INTEGER")]);
        Analyzer::new(
            Arc::new(llm),
            Arc::new(schema),
            Arc::new(engine),
            AnalyzerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn analyzer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Analyzer>();
    }

    #[tokio::test]
    async fn schema_info_reports_each_table() {
        let a = analyzer(MockLlm::scripted(), MockQueryEngine::scripted());
        let all = a.schema_info(None).await;
        assert_eq!(all.len(), 4);
        assert_eq!(all["orders"].as_ref().unwrap()[0].name, "order_id");
        assert!(all["users"].as_ref().unwrap_err().contains("unknown table"));

        let one = a.schema_info(Some("orders")).await;
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn failure_reason_prefers_engine_error() {
        let report = AnalysisReport::engine_failure("q", &AgentError::StepLimitExceeded(17));
        assert!(report.failure_reason().unwrap().contains("step limit"));
        assert!(!report.success);
    }

    #[tokio::test]
    async fn report_serializes_with_expected_keys() {
        let llm = MockLlm::scripted()
            .then_reply("general")
            .then_reply("SELECT 1 AS n")
            .then_reply("- one");
        let a = analyzer(llm, MockQueryEngine::with_result(ResultSet::default()));
        let report = a.analyze("anything").await;
        let json = serde_json::to_value(&report).unwrap();
        for key in [
            "success",
            "user_query",
            "analysis_type",
            "generated_sql",
            "query_results",
            "insights",
            "error_count",
            "last_error",
            "error",
        ] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(json["success"], true);
        assert_eq!(json["analysis_type"], "general");
    }
}
