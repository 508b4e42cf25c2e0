use async_trait::async_trait;
use tracing::{error, info};

use crate::analysis::{NodeId, RetryCeiling};
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::message::Message;
use crate::state::{AnalysisState, Termination};

/// Assistant turn appended when a run gives up.
pub const RETRIES_EXHAUSTED_MESSAGE: &str =
    "Maximum retry attempts reached. Unable to complete analysis.";

/// Decides between another attempt and giving up, and tells the conversation which.
pub struct HandleErrorNode {
    ceiling: RetryCeiling,
}

impl HandleErrorNode {
    pub fn new(ceiling: RetryCeiling) -> Self {
        Self { ceiling }
    }
}

#[async_trait]
impl Node<AnalysisState> for HandleErrorNode {
    fn id(&self) -> &str {
        NodeId::HandleError.as_str()
    }

    async fn run(&self, mut state: AnalysisState) -> Result<(AnalysisState, Next), AgentError> {
        let last_error = state
            .last_error
            .as_ref()
            .map_or_else(|| "Unknown error".to_string(), ToString::to_string);

        if self.ceiling.is_exhausted(state.error_count) {
            error!(
                error_count = state.error_count,
                last_error = %last_error,
                "{}",
                RETRIES_EXHAUSTED_MESSAGE
            );
            state
                .conversation
                .push(Message::assistant(RETRIES_EXHAUSTED_MESSAGE));
            state.finish(Termination::RetriesExhausted);
        } else {
            let notice = format!(
                "Attempting to retry analysis. Error count: {}. Last error: {}",
                state.error_count, last_error
            );
            info!(error_count = state.error_count, last_error = %last_error, "retrying analysis");
            state.conversation.push(Message::assistant(notice));
        }
        Ok((state, Next::Continue))
    }
}
