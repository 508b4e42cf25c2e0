//! Concurrent analyses on one `Analyzer`, and per-call deadlines.

mod init_logging;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tally::{
    Analyzer, AnalyzerConfig, FailureKind, MockLlm, MockQueryEngine, MockSchemaSource, ResultSet,
    RetryCeiling, Row,
};

fn question_number(prompt: &str) -> Option<String> {
    prompt
        .lines()
        .find_map(|l| l.trim().strip_prefix("User Query: question "))
        .map(|n| n.trim().to_string())
}

/// Replies by prompt kind; the SQL names the question so runs can be told apart.
fn responder(prompt: &str) -> Result<String, String> {
    if prompt.contains("Available analysis types") {
        Ok("customer_segmentation".to_string())
    } else if prompt.contains("Return only the SQL query") {
        let n = question_number(prompt).ok_or("no question in prompt")?;
        Ok(format!("SELECT {} AS question", n))
    } else {
        Ok("- segment insight".to_string())
    }
}

fn one_row() -> ResultSet {
    let mut row = Row::new();
    row.insert("question".into(), json!(1));
    ResultSet::new(vec!["question".into()], vec![row])
}

/// **Scenario**: Eight analyses run concurrently on one analyzer without sharing state.
#[tokio::test]
async fn concurrent_analyses_do_not_interfere() {
    let llm = Arc::new(MockLlm::from_fn(responder).with_delay(Duration::from_millis(5)));
    let engine = Arc::new(MockQueryEngine::with_result(one_row()).with_delay(Duration::from_millis(5)));
    let analyzer = Arc::new(
        Analyzer::new(
            llm.clone(),
            Arc::new(MockSchemaSource::new()),
            engine.clone(),
            AnalyzerConfig::default(),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let analyzer = Arc::clone(&analyzer);
            tokio::spawn(async move { analyzer.analyze(&format!("question {}", i)).await })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let report = handle.await.unwrap();
        assert!(report.success);
        assert_eq!(report.user_query, format!("question {}", i));
        assert_eq!(report.generated_sql, format!("SELECT {} AS question", i));
        assert_eq!(report.error_count, 0);
    }
    assert_eq!(llm.call_count(), 8 * 3);
    assert_eq!(engine.call_count(), 8);
}

/// **Scenario**: A hanging LLM is cut off by the deadline; each timeout counts as a failure.
#[tokio::test]
async fn hanging_llm_is_cut_off_by_deadline() {
    let llm = Arc::new(MockLlm::with_reply("general").with_delay(Duration::from_secs(30)));
    let analyzer = Analyzer::new(
        llm,
        Arc::new(MockSchemaSource::new()),
        Arc::new(MockQueryEngine::with_result(one_row())),
        AnalyzerConfig {
            retry_ceiling: RetryCeiling::DEFAULT,
            call_timeout: Duration::from_millis(20),
            verbose: false,
        },
    )
    .unwrap();

    let started = std::time::Instant::now();
    let report = analyzer.analyze("anything").await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!report.success);
    assert_eq!(report.error_count, 3);
    assert_eq!(report.failures[0].kind, FailureKind::Classification);
    assert!(report.failures.iter().all(|f| f.message.contains("timed out")));
}

/// **Scenario**: A slow query engine times out and the run retries until the ceiling.
#[tokio::test]
async fn slow_query_engine_times_out_as_execution_failure() {
    let analyzer = Analyzer::new(
        Arc::new(MockLlm::from_fn(responder)),
        Arc::new(MockSchemaSource::new()),
        Arc::new(MockQueryEngine::with_result(one_row()).with_delay(Duration::from_secs(30))),
        AnalyzerConfig {
            retry_ceiling: RetryCeiling::new(2),
            call_timeout: Duration::from_millis(20),
            verbose: false,
        },
    )
    .unwrap();

    let report = analyzer.analyze("question 7").await;

    assert!(!report.success);
    assert_eq!(report.error_count, 2);
    assert!(report
        .failures
        .iter()
        .all(|f| f.kind == FailureKind::Execution && f.message.contains("timed out")));
}
