//! Scripted warehouse capabilities for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{FieldSchema, QueryEngine, ResultSet, SchemaSource, WarehouseError};

/// Mock schema lookup: fixed per-table answers; unlisted tables are `UnknownTable`.
#[derive(Default)]
pub struct MockSchemaSource {
    tables: HashMap<String, Result<Vec<FieldSchema>, String>>,
    call_count: AtomicUsize,
}

impl MockSchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers lookups of `table` with `fields` (builder).
    pub fn with_table(mut self, table: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        self.tables.insert(table.into(), Ok(fields));
        self
    }

    /// Fails lookups of `table` with a backend error (builder).
    pub fn with_failing_table(mut self, table: impl Into<String>, message: impl Into<String>) -> Self {
        self.tables.insert(table.into(), Err(message.into()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaSource for MockSchemaSource {
    async fn table_schema(&self, table: &str) -> Result<Vec<FieldSchema>, WarehouseError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.tables.get(table) {
            Some(Ok(fields)) => Ok(fields.clone()),
            Some(Err(message)) => Err(WarehouseError::Backend(message.clone())),
            None => Err(WarehouseError::UnknownTable(table.to_string())),
        }
    }
}

/// Mock query engine: results consumed in call order, then an optional fallback.
///
/// Every executed statement is recorded.
#[derive(Default)]
pub struct MockQueryEngine {
    script: Mutex<VecDeque<Result<ResultSet, String>>>,
    fallback: Option<ResultSet>,
    delay: Option<Duration>,
    executed: Mutex<Vec<String>>,
}

impl MockQueryEngine {
    /// Creates an engine that always returns `result`.
    pub fn with_result(result: ResultSet) -> Self {
        Self {
            fallback: Some(result),
            ..Self::default()
        }
    }

    /// Creates an engine with an empty script.
    pub fn scripted() -> Self {
        Self::default()
    }

    /// Appends a successful result to the script (builder).
    pub fn then_result(self, result: ResultSet) -> Self {
        self.push(Ok(result));
        self
    }

    /// Appends a failure to the script (builder).
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()));
        self
    }

    /// Sleeps for `delay` before every execution (builder).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.executed().len()
    }

    fn push(&self, item: Result<ResultSet, String>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(item);
    }
}

#[async_trait]
impl QueryEngine for MockQueryEngine {
    async fn execute(&self, sql: &str) -> Result<ResultSet, WarehouseError> {
        self.executed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sql.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match (scripted, &self.fallback) {
            (Some(Ok(result)), _) => Ok(result),
            (Some(Err(message)), _) => Err(WarehouseError::Sql(message)),
            (None, Some(result)) => Ok(result.clone()),
            (None, None) => Err(WarehouseError::Backend("mock script exhausted".to_string())),
        }
    }
}
