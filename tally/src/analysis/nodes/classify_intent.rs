use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::analysis::{prompt, NodeId};
use crate::catalog::AnalysisType;
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::LlmClient;
use crate::state::{AnalysisState, StepFailure};

use super::call_with_deadline;

/// Reads the question from the last user turn and asks the LLM which analysis type it is.
///
/// Unrecognized replies become `general`. A failed call also falls back to `general`
/// but is counted.
pub struct ClassifyIntentNode {
    llm: Arc<dyn LlmClient>,
    deadline: Duration,
}

impl ClassifyIntentNode {
    pub fn new(llm: Arc<dyn LlmClient>, deadline: Duration) -> Self {
        Self { llm, deadline }
    }
}

#[async_trait]
impl Node<AnalysisState> for ClassifyIntentNode {
    fn id(&self) -> &str {
        NodeId::ClassifyIntent.as_str()
    }

    async fn run(&self, mut state: AnalysisState) -> Result<(AnalysisState, Next), AgentError> {
        let user_query = state.last_user_turn().unwrap_or_default().to_string();
        state.user_query = user_query;

        let prompt = prompt::classify_intent(&state.user_query);
        match call_with_deadline(self.deadline, self.llm.complete(&prompt)).await {
            Ok(reply) => {
                let analysis_type = AnalysisType::from_reply(&reply);
                info!(analysis_type = %analysis_type, "identified analysis type");
                state.analysis_type = Some(analysis_type);
            }
            Err(message) => {
                error!(error = %message, "intent classification failed");
                state.analysis_type = Some(AnalysisType::General);
                state.record_failure(StepFailure::classification(message));
            }
        }
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::state::FailureKind;

    fn node(llm: MockLlm) -> ClassifyIntentNode {
        ClassifyIntentNode::new(Arc::new(llm), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn sets_query_and_normalized_type() {
        let (state, next) = node(MockLlm::with_reply(" Sales_Trends \n"))
            .run(AnalysisState::new("How did sales move by month?"))
            .await
            .unwrap();
        assert_eq!(next, Next::Continue);
        assert_eq!(state.user_query, "How did sales move by month?");
        assert_eq!(state.analysis_type, Some(AnalysisType::SalesTrends));
        assert_eq!(state.error_count, 0);
    }

    #[tokio::test]
    async fn unknown_reply_becomes_general_without_failure() {
        let (state, _) = node(MockLlm::with_reply("revenue forecasting"))
            .run(AnalysisState::new("q"))
            .await
            .unwrap();
        assert_eq!(state.analysis_type, Some(AnalysisType::General));
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn failed_call_falls_back_to_general_and_counts() {
        let (state, _) = node(MockLlm::scripted().then_fail("rate limited"))
            .run(AnalysisState::new("q"))
            .await
            .unwrap();
        assert_eq!(state.analysis_type, Some(AnalysisType::General));
        assert_eq!(state.error_count, 1);
        let failure = state.last_error.unwrap();
        assert_eq!(failure.kind, FailureKind::Classification);
        assert!(failure.message.contains("rate limited"));
    }
}
