use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::analysis::NodeId;
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::{AnalysisState, QueryResults, StepFailure};
use crate::warehouse::QueryEngine;

use super::call_with_deadline;

/// Runs `generated_sql` and stores the condensed result.
///
/// Refuses to run an empty statement (counted as an execution failure). On failure
/// `query_results` keeps its previous value.
pub struct ExecuteQueryNode {
    engine: Arc<dyn QueryEngine>,
    deadline: Duration,
}

impl ExecuteQueryNode {
    pub fn new(engine: Arc<dyn QueryEngine>, deadline: Duration) -> Self {
        Self { engine, deadline }
    }
}

#[async_trait]
impl Node<AnalysisState> for ExecuteQueryNode {
    fn id(&self) -> &str {
        NodeId::ExecuteQuery.as_str()
    }

    async fn run(&self, mut state: AnalysisState) -> Result<(AnalysisState, Next), AgentError> {
        let outcome = if state.generated_sql.is_empty() {
            Err("no query to execute".to_string())
        } else {
            call_with_deadline(self.deadline, self.engine.execute(&state.generated_sql)).await
        };

        match outcome {
            Ok(result) => {
                let results = QueryResults::from(result);
                info!(rows = results.row_count, "query executed");
                state.query_results = Some(results);
                state.clear_failure();
            }
            Err(message) => {
                error!(error = %message, "query execution failed");
                state.record_failure(StepFailure::execution(message));
            }
        }
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::FailureKind;
    use crate::warehouse::{MockQueryEngine, ResultSet, Row};

    fn one_row() -> ResultSet {
        let mut row = Row::new();
        row.insert("revenue".into(), json!(12.5));
        ResultSet::new(vec!["revenue".into()], vec![row])
    }

    #[tokio::test]
    async fn empty_sql_fails_fast_without_calling_engine() {
        let engine = Arc::new(MockQueryEngine::with_result(one_row()));
        let node = ExecuteQueryNode::new(engine.clone(), Duration::from_secs(5));
        let (state, _) = node.run(AnalysisState::new("q")).await.unwrap();
        assert_eq!(engine.call_count(), 0);
        assert_eq!(state.error_count, 1);
        assert_eq!(state.last_error.unwrap().kind, FailureKind::Execution);
        assert!(state.query_results.is_none());
    }

    #[tokio::test]
    async fn success_stores_results_and_clears_last_error() {
        let engine = Arc::new(MockQueryEngine::with_result(one_row()));
        let node = ExecuteQueryNode::new(engine.clone(), Duration::from_secs(5));
        let mut state = AnalysisState::new("q");
        state.generated_sql = "SELECT revenue FROM t".into();
        state.record_failure(StepFailure::classification("flaky"));

        let (state, _) = node.run(state).await.unwrap();
        assert_eq!(engine.executed(), vec!["SELECT revenue FROM t"]);
        let results = state.query_results.unwrap();
        assert_eq!(results.row_count, 1);
        assert_eq!(results.summary_stats["revenue"].mean, Some(12.5));
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn engine_error_is_counted() {
        let engine = Arc::new(MockQueryEngine::scripted().then_fail("no such column: revnue"));
        let node = ExecuteQueryNode::new(engine, Duration::from_secs(5));
        let mut state = AnalysisState::new("q");
        state.generated_sql = "SELECT revnue FROM t".into();
        let (state, _) = node.run(state).await.unwrap();
        let failure = state.last_error.unwrap();
        assert_eq!(failure.kind, FailureKind::Execution);
        assert!(failure.message.contains("revnue"));
    }
}
