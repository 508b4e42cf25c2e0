//! The six analysis nodes.
//!
//! Every node is total: capability failures are recorded in the state as a
//! `StepFailure` and the node still returns `Ok`. Each capability call runs under a
//! deadline; a timeout counts as a failure of the calling node.

mod classify_intent;
mod execute_query;
mod fetch_schema;
mod generate_insights;
mod generate_query;
mod handle_error;

pub use classify_intent::ClassifyIntentNode;
pub use execute_query::ExecuteQueryNode;
pub use fetch_schema::FetchSchemaNode;
pub use generate_insights::{parse_insights, GenerateInsightsNode};
pub use generate_query::{strip_sql_fences, GenerateQueryNode};
pub use handle_error::{HandleErrorNode, RETRIES_EXHAUSTED_MESSAGE};

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::error::AgentError;

/// Awaits `call` for at most `deadline`; any failure comes back as its message.
pub(crate) async fn call_with_deadline<T, E, F>(deadline: Duration, call: F) -> Result<T, String>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(AgentError::Timeout(deadline).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_passes_through_result_and_error() {
        let ok = call_with_deadline(Duration::from_secs(1), async { Ok::<_, String>(7) }).await;
        assert_eq!(ok, Ok(7));
        let err = call_with_deadline(Duration::from_secs(1), async {
            Err::<u8, _>("boom".to_string())
        })
        .await;
        assert_eq!(err, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn deadline_cuts_off_slow_call() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, String>(())
        };
        let err = call_with_deadline(Duration::from_millis(20), slow)
            .await
            .unwrap_err();
        assert!(err.contains("timed out"));
    }
}
