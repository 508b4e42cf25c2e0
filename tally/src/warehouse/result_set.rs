//! Tabular query result and numeric column statistics.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One result row: column name to JSON value (`Null` for missing).
pub type Row = serde_json::Map<String, Value>;

/// Mean, min and max of one numeric column; `None` when every value is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Full result of one query, in engine column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Columns the engine declared numeric. Other columns are numeric when every
    /// non-null value is a JSON number.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub numeric_columns: BTreeSet<String>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            numeric_columns: BTreeSet::new(),
        }
    }

    /// Marks columns as numeric regardless of their values (builder).
    pub fn with_numeric_columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.numeric_columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(column).unwrap_or(&Value::Null))
    }

    /// Whether `column` holds numbers: declared numeric, or at least one number and
    /// nothing but numbers and nulls.
    pub fn is_numeric(&self, column: &str) -> bool {
        if self.numeric_columns.contains(column) {
            return self.values(column).all(|v| v.is_number() || v.is_null());
        }
        let mut seen_number = false;
        for v in self.values(column) {
            match v {
                Value::Number(_) => seen_number = true,
                Value::Null => {}
                _ => return false,
            }
        }
        seen_number
    }

    /// Per numeric column statistics over all rows. Empty for an empty result.
    pub fn numeric_summary(&self) -> BTreeMap<String, ColumnStats> {
        let mut summary = BTreeMap::new();
        if self.rows.is_empty() {
            return summary;
        }
        for column in &self.columns {
            if !self.is_numeric(column) {
                continue;
            }
            let mut count = 0usize;
            let mut sum = 0.0f64;
            let mut min: Option<f64> = None;
            let mut max: Option<f64> = None;
            for x in self.values(column).filter_map(Value::as_f64) {
                count += 1;
                sum += x;
                min = Some(min.map_or(x, |m| m.min(x)));
                max = Some(max.map_or(x, |m| m.max(x)));
            }
            let mean = (count > 0).then(|| sum / count as f64);
            summary.insert(column.clone(), ColumnStats { mean, min, max });
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn numeric_summary_computes_mean_min_max_ignoring_nulls() {
        let rs = ResultSet::new(
            vec!["name".into(), "revenue".into()],
            vec![
                row(&[("name", json!("a")), ("revenue", json!(10))]),
                row(&[("name", json!("b")), ("revenue", json!(30.5))]),
                row(&[("name", json!("c")), ("revenue", Value::Null)]),
            ],
        );
        let summary = rs.numeric_summary();
        assert_eq!(summary.len(), 1);
        let stats = summary["revenue"];
        assert_eq!(stats.mean, Some(20.25));
        assert_eq!(stats.min, Some(10.0));
        assert_eq!(stats.max, Some(30.5));
    }

    /// **Scenario**: A column declared numeric whose values are all missing gets `None` stats.
    #[test]
    fn declared_numeric_column_with_only_nulls_has_none_stats() {
        let rs = ResultSet::new(
            vec!["returned".into()],
            vec![row(&[("returned", Value::Null)]), row(&[])],
        )
        .with_numeric_columns(["returned"]);
        let stats = rs.numeric_summary()["returned"];
        assert_eq!(stats, ColumnStats::default());
    }

    #[test]
    fn text_and_all_null_undeclared_columns_are_not_numeric() {
        let rs = ResultSet::new(
            vec!["mixed".into(), "empty".into()],
            vec![
                row(&[("mixed", json!(1)), ("empty", Value::Null)]),
                row(&[("mixed", json!("x")), ("empty", Value::Null)]),
            ],
        );
        assert!(!rs.is_numeric("mixed"));
        assert!(!rs.is_numeric("empty"));
        assert!(rs.numeric_summary().is_empty());
    }

    #[test]
    fn empty_result_has_no_summary() {
        let rs = ResultSet::new(vec!["n".into()], vec![]).with_numeric_columns(["n"]);
        assert_eq!(rs.row_count(), 0);
        assert!(rs.numeric_summary().is_empty());
    }
}
