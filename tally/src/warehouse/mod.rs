//! Warehouse capabilities: schema lookup and query execution.
//!
//! Two ports injected into the analysis nodes as `Arc<dyn _>`:
//! [`SchemaSource`] (per-table field descriptors) and [`QueryEngine`] (run SQL, get a
//! [`ResultSet`]). Implementations: [`SqliteWarehouse`] (local database holding the
//! e-commerce tables) and the scripted [`MockSchemaSource`] / [`MockQueryEngine`].

mod mock;
mod result_set;
mod sqlite;

pub use mock::{MockQueryEngine, MockSchemaSource};
pub use result_set::{ColumnStats, ResultSet, Row};
pub use sqlite::SqliteWarehouse;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            mode: None,
            description: None,
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Error from a warehouse capability.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("statement rejected: {0}")]
    Rejected(String),
    #[error("sql error: {0}")]
    Sql(String),
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for WarehouseError {
    fn from(e: rusqlite::Error) -> Self {
        WarehouseError::Sql(e.to_string())
    }
}

/// Schema lookup: ordered field descriptors for one table. May fail per table.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn table_schema(&self, table: &str) -> Result<Vec<FieldSchema>, WarehouseError>;
}

/// Query execution: runs one statement and returns the full tabular result.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<ResultSet, WarehouseError>;
}
