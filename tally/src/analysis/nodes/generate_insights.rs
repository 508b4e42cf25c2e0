use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::analysis::{prompt, NodeId};
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::{AnalysisState, StepFailure, Termination};

use super::call_with_deadline;

/// Bulleted lines (`•` or `-`) of the reply, trimmed; the whole trimmed reply when
/// there are none.
pub fn parse_insights(reply: &str) -> Vec<String> {
    let text = reply.trim();
    let bullets: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('•') || line.starts_with('-'))
        .map(str::to_string)
        .collect();
    if bullets.is_empty() {
        vec![text.to_string()]
    } else {
        bullets
    }
}

/// Summarizes the query results as business insights and completes the run.
///
/// Fails fast (counted) when there are no results. A failure here ends the run
/// without retry.
pub struct GenerateInsightsNode {
    llm: Arc<dyn LlmClient>,
    deadline: Duration,
}

impl GenerateInsightsNode {
    pub fn new(llm: Arc<dyn LlmClient>, deadline: Duration) -> Self {
        Self { llm, deadline }
    }
}

#[async_trait]
impl Node<AnalysisState> for GenerateInsightsNode {
    fn id(&self) -> &str {
        NodeId::GenerateInsights.as_str()
    }

    async fn run(&self, mut state: AnalysisState) -> Result<(AnalysisState, Next), AgentError> {
        let outcome = match &state.query_results {
            None => Err("no query results to analyze".to_string()),
            Some(results) => {
                let summary = prompt::results_summary(results);
                let prompt = prompt::generate_insights(
                    &state.user_query,
                    state.analysis_type,
                    &state.generated_sql,
                    &summary,
                );
                call_with_deadline(self.deadline, self.llm.complete(&prompt)).await
            }
        };

        match outcome {
            Ok(reply) => {
                let insights = parse_insights(&reply);
                info!(count = insights.len(), "generated insights");
                state.conversation.push(Message::assistant(format!(
                    "Analysis completed. Generated insights: {}",
                    insights.join("; ")
                )));
                state.insights = insights;
                state.clear_failure();
                state.finish(Termination::Insights);
            }
            Err(message) => {
                error!(error = %message, "insight generation failed");
                state.record_failure(StepFailure::insight(message));
            }
        }
        Ok((state, Next::Continue))
    }
}
