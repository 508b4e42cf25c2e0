use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::analysis::{prompt, NodeId};
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::LlmClient;
use crate::state::{AnalysisState, StepFailure};

use super::call_with_deadline;

/// Removes a leading ```` ```sql ```` (or bare ```` ``` ````) fence and a trailing
/// ```` ``` ```` fence, trimming whitespace around both.
pub fn strip_sql_fences(reply: &str) -> &str {
    let mut sql = reply.trim();
    if sql
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("```sql"))
    {
        sql = &sql[6..];
    } else if let Some(rest) = sql.strip_prefix("```") {
        sql = rest;
    }
    if let Some(rest) = sql.strip_suffix("```") {
        sql = rest;
    }
    sql.trim()
}

/// Asks the LLM for one SQL statement answering the question over the fetched schemas.
///
/// On success overwrites `generated_sql` and clears `last_error`. An empty statement
/// counts as a generation failure and leaves the previous `generated_sql` in place.
pub struct GenerateQueryNode {
    llm: Arc<dyn LlmClient>,
    deadline: Duration,
}

impl GenerateQueryNode {
    pub fn new(llm: Arc<dyn LlmClient>, deadline: Duration) -> Self {
        Self { llm, deadline }
    }
}

#[async_trait]
impl Node<AnalysisState> for GenerateQueryNode {
    fn id(&self) -> &str {
        NodeId::GenerateQuery.as_str()
    }

    async fn run(&self, mut state: AnalysisState) -> Result<(AnalysisState, Next), AgentError> {
        let context = prompt::schema_context(&state.table_schemas);
        let prompt = prompt::generate_query(&state.user_query, state.analysis_type, &context);

        let outcome = call_with_deadline(self.deadline, self.llm.complete(&prompt))
            .await
            .and_then(|reply| {
                let sql = strip_sql_fences(&reply);
                if sql.is_empty() {
                    Err("model returned an empty query".to_string())
                } else {
                    Ok(sql.to_string())
                }
            });

        match outcome {
            Ok(sql) => {
                info!(sql = %sql, "generated query");
                state.generated_sql = sql;
                state.clear_failure();
            }
            Err(message) => {
                error!(error = %message, "query generation failed");
                state.record_failure(StepFailure::generation(message));
            }
        }
        Ok((state, Next::Continue))
    }
}
