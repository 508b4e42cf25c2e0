//! Router predicates: pure functions from the updated state to the next edge label.
//!
//! Registered as conditional edges in [`workflow`](super::workflow); the label is the
//! key of the path map.

use crate::state::{AnalysisState, FailureKind};

use super::RetryCeiling;

/// Branch taken after generate-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterGenerateQuery {
    Execute,
    Error,
}

/// Branch taken after execute-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterExecuteQuery {
    Insights,
    Error,
}

/// Branch taken after handle-error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterHandleError {
    Retry,
    End,
}

impl AfterGenerateQuery {
    pub fn label(&self) -> &'static str {
        match self {
            AfterGenerateQuery::Execute => "execute",
            AfterGenerateQuery::Error => "error",
        }
    }
}

impl AfterExecuteQuery {
    pub fn label(&self) -> &'static str {
        match self {
            AfterExecuteQuery::Insights => "insights",
            AfterExecuteQuery::Error => "error",
        }
    }
}

impl AfterHandleError {
    pub fn label(&self) -> &'static str {
        match self {
            AfterHandleError::Retry => "retry",
            AfterHandleError::End => "end",
        }
    }
}

fn failed_with(state: &AnalysisState, kind: FailureKind) -> bool {
    state.last_error.as_ref().is_some_and(|f| f.kind == kind)
}

pub fn route_after_generate_query(state: &AnalysisState) -> AfterGenerateQuery {
    if failed_with(state, FailureKind::Generation) || state.generated_sql.is_empty() {
        AfterGenerateQuery::Error
    } else {
        AfterGenerateQuery::Execute
    }
}

pub fn route_after_execute_query(state: &AnalysisState) -> AfterExecuteQuery {
    if failed_with(state, FailureKind::Execution) || state.query_results.is_none() {
        AfterExecuteQuery::Error
    } else {
        AfterExecuteQuery::Insights
    }
}

pub fn route_after_handle_error(state: &AnalysisState, ceiling: RetryCeiling) -> AfterHandleError {
    if !state.completed && !ceiling.is_exhausted(state.error_count) {
        AfterHandleError::Retry
    } else {
        AfterHandleError::End
    }
}
