//! SQLite-backed warehouse (SqliteWarehouse) holding the e-commerce tables.
//!
//! Implements both `SchemaSource` and `QueryEngine`. Each call opens a fresh connection
//! on `spawn_blocking`; queries run on a read-only connection and only read-only
//! statements are accepted.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value;
use tracing::debug;

use crate::catalog::TABLES;

use super::{FieldSchema, QueryEngine, ResultSet, Row, SchemaSource, WarehouseError};

/// Declared SQLite column types that count as numeric for summary statistics.
fn is_numeric_decl(decl: &str) -> bool {
    let upper = decl.to_ascii_uppercase();
    ["INT", "REAL", "FLOA", "DOUB", "NUMERIC", "DECIMAL"]
        .iter()
        .any(|t| upper.contains(t))
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
    }
}

/// SQLite database file serving schema lookups and read-only queries.
///
/// **Interaction**: Used as `Arc<dyn SchemaSource>` and `Arc<dyn QueryEngine>` by the
/// `Analyzer`; the CLI builds it from `TALLY_DATABASE`.
#[derive(Debug, Clone)]
pub struct SqliteWarehouse {
    db_path: PathBuf,
}

impl SqliteWarehouse {
    /// Opens an existing database file. Fails if it cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WarehouseError> {
        let db_path = path.as_ref().to_path_buf();
        Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { db_path })
    }

    /// Opens (creating if needed) a database file and ensures the catalog tables exist.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, WarehouseError> {
        let db_path = path.as_ref().to_path_buf();
        let conn = Connection::open(&db_path)?;
        for table in TABLES.iter() {
            conn.execute(table.ddl, [])?;
        }
        Ok(Self { db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl SchemaSource for SqliteWarehouse {
    async fn table_schema(&self, table: &str) -> Result<Vec<FieldSchema>, WarehouseError> {
        let db_path = self.db_path.clone();
        let table = table.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
            let mut stmt = conn.prepare(
                "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid",
            )?;
            let fields = stmt
                .query_map([&table], |row| {
                    let name: String = row.get(0)?;
                    let field_type: String = row.get(1)?;
                    let not_null: i64 = row.get(2)?;
                    let pk: i64 = row.get(3)?;
                    let mode = if not_null != 0 || pk != 0 {
                        "REQUIRED"
                    } else {
                        "NULLABLE"
                    };
                    Ok(FieldSchema::new(name, field_type).with_mode(mode))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            if fields.is_empty() {
                return Err(WarehouseError::UnknownTable(table));
            }
            Ok(fields)
        })
        .await
        .map_err(|e| WarehouseError::Backend(e.to_string()))?
    }
}

#[async_trait]
impl QueryEngine for SqliteWarehouse {
    async fn execute(&self, sql: &str) -> Result<ResultSet, WarehouseError> {
        let db_path = self.db_path.clone();
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
            let mut stmt = conn.prepare(&sql)?;
            if !stmt.readonly() {
                return Err(WarehouseError::Rejected(
                    "only read-only statements are allowed".to_string(),
                ));
            }

            let mut columns = Vec::with_capacity(stmt.column_count());
            let mut numeric = Vec::new();
            for column in stmt.columns() {
                columns.push(column.name().to_string());
                if column.decl_type().is_some_and(is_numeric_decl) {
                    numeric.push(column.name().to_string());
                }
            }

            let mut rows = Vec::new();
            let mut cursor = stmt.query([])?;
            while let Some(row) = cursor.next()? {
                let mut out = Row::new();
                for (i, name) in columns.iter().enumerate() {
                    out.insert(name.clone(), to_json(row.get_ref(i)?));
                }
                rows.push(out);
            }
            drop(cursor);

            debug!(rows = rows.len(), columns = columns.len(), "sqlite query done");
            Ok(ResultSet::new(columns, rows).with_numeric_columns(numeric))
        })
        .await
        .map_err(|e| WarehouseError::Backend(e.to_string()))?
    }
}
