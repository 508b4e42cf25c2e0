use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::warehouse::{ColumnStats, ResultSet, Row};

/// Rows kept in `QueryResults::data`.
pub const SAMPLE_ROW_LIMIT: usize = 50;

/// Condensed query result stored in the state: full row count and statistics, a
/// bounded sample of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    pub row_count: usize,
    pub columns: Vec<String>,
    /// First `SAMPLE_ROW_LIMIT` rows.
    pub data: Vec<Row>,
    /// Mean/min/max per numeric column, computed over all rows.
    pub summary_stats: BTreeMap<String, ColumnStats>,
}

impl From<ResultSet> for QueryResults {
    fn from(result: ResultSet) -> Self {
        let row_count = result.row_count();
        let summary_stats = result.numeric_summary();
        let ResultSet { columns, rows, .. } = result;
        let data = rows.into_iter().take(SAMPLE_ROW_LIMIT).collect();
        Self {
            row_count,
            columns,
            data,
            summary_stats,
        }
    }
}
