use std::fmt;

use serde::{Deserialize, Serialize};

/// Which fallible step produced a failure. Routers branch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Classification,
    Generation,
    Execution,
    Insight,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Classification => "classification",
            FailureKind::Generation => "generation",
            FailureKind::Execution => "execution",
            FailureKind::Insight => "insight",
        }
    }
}

/// One counted failure: the step kind and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl StepFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn classification(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Classification, message)
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Generation, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Execution, message)
    }

    pub fn insight(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Insight, message)
    }
}

/// Rendered as `<step> failed: <message>`, e.g. `Query execution failed: ...`.
impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            FailureKind::Classification => "Intent classification failed",
            FailureKind::Generation => "Query generation failed",
            FailureKind::Execution => "Query execution failed",
            FailureKind::Insight => "Insight generation failed",
        };
        write!(f, "{}: {}", prefix, self.message)
    }
}
