use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::AnalysisType;
use crate::message::Message;
use crate::warehouse::FieldSchema;

use super::{QueryResults, StepFailure};

/// Why a run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// generate-insights succeeded.
    Insights,
    /// handle-error found the retry ceiling reached.
    RetriesExhausted,
}

/// State of one analysis run.
///
/// Created by [`AnalysisState::new`] with the question as the only user turn. Each node
/// takes it by value and returns it updated; nothing else holds a reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    /// Append-only conversation; seeded with the user's question.
    pub conversation: Vec<Message>,
    /// Question being answered; set by classify-intent from the last user turn.
    pub user_query: String,
    pub analysis_type: Option<AnalysisType>,
    /// Fetched once; tables whose lookup failed are absent.
    pub table_schemas: BTreeMap<String, Vec<FieldSchema>>,
    /// Latest successfully generated query; empty until the first success.
    pub generated_sql: String,
    pub query_results: Option<QueryResults>,
    pub insights: Vec<String>,
    pub error_count: u32,
    /// Failure of the most recent fallible step; cleared when a later step succeeds.
    pub last_error: Option<StepFailure>,
    /// Every counted failure, oldest first.
    pub failures: Vec<StepFailure>,
    pub completed: bool,
    pub termination: Option<Termination>,
}

impl AnalysisState {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            conversation: vec![Message::user(user_query)],
            ..Self::default()
        }
    }

    /// Text of the most recent user turn, if any.
    pub fn last_user_turn(&self) -> Option<&str> {
        self.conversation.iter().rev().find_map(|m| match m {
            Message::User(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Counts a failure: appends it to the history, makes it `last_error` and bumps
    /// `error_count` by one.
    pub fn record_failure(&mut self, failure: StepFailure) {
        self.error_count += 1;
        self.last_error = Some(failure.clone());
        self.failures.push(failure);
    }

    pub fn clear_failure(&mut self) {
        self.last_error = None;
    }

    /// Marks the run completed. Only the first call has an effect.
    pub fn finish(&mut self, termination: Termination) {
        if !self.completed {
            self.completed = true;
            self.termination = Some(termination);
        }
    }

    /// True only for runs that ended with insights.
    pub fn is_success(&self) -> bool {
        self.completed && self.termination == Some(Termination::Insights)
    }
}
