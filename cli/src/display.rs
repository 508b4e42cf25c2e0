//! Terminal rendering of analysis reports and table schemas.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde_json::Value;
use tally::{AnalysisReport, ColumnStats, FieldSchema, QueryResults, Row};

/// Rows shown in the sample table.
pub const SAMPLE_TABLE_ROWS: usize = 5;
/// Columns shown in the sample table.
pub const SAMPLE_TABLE_COLUMNS: usize = 8;
/// Widest cell in the sample table, in chars.
pub const CELL_MAX_CHARS: usize = 50;

/// Truncates a string to at most `max` chars; appends "..." when truncated. UTF-8 safe.
pub fn truncate_display(s: &str, max: usize) -> String {
    const SUFFIX: &str = "...";
    let suffix_len = 3;
    if max <= suffix_len {
        return s.chars().take(max).collect();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let content_max = max - suffix_len;
    format!("{}{}", s.chars().take(content_max).collect::<String>(), SUFFIX)
}

/// Serializes any report-like value, compact or multi-line.
pub fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn format_number(x: Option<f64>) -> String {
    match x {
        Some(x) if x.fract() == 0.0 && x.abs() < 1e15 => format!("{}", x as i64),
        Some(x) => format!("{:.2}", x),
        None => "n/a".to_string(),
    }
}

fn format_stats(stats: &ColumnStats) -> String {
    format!(
        "min={}, max={}, avg={}",
        format_number(stats.min),
        format_number(stats.max),
        format_number(stats.mean)
    )
}

/// Cell text: strings unquoted, null blank, everything else as JSON.
fn format_cell(value: Option<&Value>) -> String {
    let text = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    truncate_display(&text.replace('\n', " "), CELL_MAX_CHARS)
}

/// Left-aligned text table over the first rows and columns of a sample.
fn render_table(columns: &[String], rows: &[Row]) -> String {
    let columns: Vec<&String> = columns.iter().take(SAMPLE_TABLE_COLUMNS).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .take(SAMPLE_TABLE_ROWS)
        .map(|row| columns.iter().map(|c| format_cell(row.get(c.as_str()))).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<w$}", v, w = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(columns.iter().map(|c| c.as_str()).collect()));
    let _ = writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    );
    for row in &cells {
        let _ = writeln!(out, "{}", line(row.iter().map(String::as_str).collect()));
    }
    out
}

fn render_results(out: &mut String, results: &QueryResults) {
    let _ = writeln!(out, "\n-- Results --");
    let _ = writeln!(
        out,
        "Rows: {}, columns: {}",
        results.row_count,
        results.columns.len()
    );
    for (column, stats) in &results.summary_stats {
        let _ = writeln!(out, "  {}: {}", column, format_stats(stats));
    }
    if results.data.is_empty() || results.columns.is_empty() {
        return;
    }
    let shown = results.data.len().min(SAMPLE_TABLE_ROWS);
    let _ = writeln!(out, "\n-- Sample (first {} of {} rows) --", shown, results.row_count);
    if results.columns.len() > SAMPLE_TABLE_COLUMNS {
        let _ = writeln!(
            out,
            "(showing {} of {} columns)",
            SAMPLE_TABLE_COLUMNS,
            results.columns.len()
        );
    }
    out.push_str(&render_table(&results.columns, &results.data));
}

/// Human-readable report: request, SQL, results, insights, or why the run failed.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Analysis ==");
    let _ = writeln!(out, "Query: {}", report.user_query);
    if let Some(kind) = report.analysis_type {
        let _ = writeln!(out, "Type:  {}", kind);
    }

    if !report.generated_sql.is_empty() {
        let _ = writeln!(out, "\n-- SQL --\n{}", report.generated_sql);
    }
    if let Some(results) = &report.query_results {
        render_results(&mut out, results);
    }

    if !report.insights.is_empty() {
        let _ = writeln!(out, "\n-- Insights --");
        for insight in &report.insights {
            let _ = writeln!(out, "  • {}", insight);
        }
    }

    if let Some(reason) = report.failure_reason() {
        let _ = writeln!(out, "\nAnalysis failed: {}", reason);
        if report.error_count > 0 {
            let _ = writeln!(out, "Failed attempts: {}", report.error_count);
        }
    }
    out
}

/// One block per table: `name (type, MODE)` lines, or the lookup error.
pub fn render_schema(schemas: &BTreeMap<String, Result<Vec<FieldSchema>, String>>) -> String {
    let mut out = String::new();
    for (table, fields) in schemas {
        let _ = writeln!(out, "{}", table);
        match fields {
            Ok(fields) => {
                for f in fields {
                    match &f.mode {
                        Some(mode) => {
                            let _ = writeln!(out, "  {} ({}, {})", f.name, f.field_type, mode);
                        }
                        None => {
                            let _ = writeln!(out, "  {} ({})", f.name, f.field_type);
                        }
                    }
                }
            }
            Err(e) => {
                let _ = writeln!(out, "  error: {}", e);
            }
        }
    }
    out
}

/// `{table: {"fields": [...]}}` or `{table: {"error": "..."}}`.
pub fn schema_to_json(schemas: &BTreeMap<String, Result<Vec<FieldSchema>, String>>) -> Value {
    let map = schemas
        .iter()
        .map(|(table, fields)| {
            let entry = match fields {
                Ok(fields) => serde_json::json!({ "fields": fields }),
                Err(e) => serde_json::json!({ "error": e }),
            };
            (table.clone(), entry)
        })
        .collect::<serde_json::Map<_, _>>();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tally::{AnalysisType, StepFailure, Termination};

    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn report() -> AnalysisReport {
        let mut summary_stats = BTreeMap::new();
        summary_stats.insert(
            "revenue".to_string(),
            ColumnStats {
                mean: Some(150.25),
                min: Some(100.0),
                max: Some(200.5),
            },
        );
        AnalysisReport {
            success: true,
            user_query: "Revenue by category".into(),
            analysis_type: Some(AnalysisType::ProductPerformance),
            generated_sql: "SELECT category, SUM(sale_price) AS revenue FROM order_items".into(),
            query_results: Some(QueryResults {
                row_count: 2,
                columns: vec!["category".into(), "revenue".into()],
                data: vec![
                    row(&[("category", json!("Jeans")), ("revenue", json!(200.5))]),
                    row(&[("category", json!("Socks")), ("revenue", json!(100))]),
                ],
                summary_stats,
            }),
            insights: vec!["Jeans lead revenue".into()],
            error_count: 0,
            last_error: None,
            failures: vec![],
            termination: Some(Termination::Insights),
            error: None,
        }
    }

    #[test]
    fn truncate_display_is_char_safe() {
        assert_eq!(truncate_display("hello", 10), "hello");
        assert_eq!(truncate_display("hello world", 8), "hello...");
        assert_eq!(truncate_display("ééééé", 4), "é...");
        assert_eq!(truncate_display("abc", 2), "ab");
    }

    #[test]
    fn render_report_shows_every_section() {
        let text = render_report(&report());
        assert!(text.contains("Query: Revenue by category"));
        assert!(text.contains("Type:  product_performance"));
        assert!(text.contains("-- SQL --\nSELECT category"));
        assert!(text.contains("Rows: 2, columns: 2"));
        assert!(text.contains("revenue: min=100, max=200.50, avg=150.25"));
        assert!(text.contains("-- Sample (first 2 of 2 rows) --"));
        assert!(text.contains("Jeans"));
        assert!(text.contains("  • Jeans lead revenue"));
        assert!(!text.contains("Analysis failed"));
    }

    /// **Scenario**: An exhausted run prints the last failure instead of insights.
    #[test]
    fn render_report_shows_failure_reason() {
        let mut failed = report();
        failed.success = false;
        failed.insights.clear();
        failed.query_results = None;
        failed.error_count = 3;
        failed.last_error = Some(StepFailure::execution("no such table: sales"));
        failed.termination = Some(Termination::RetriesExhausted);
        let text = render_report(&failed);
        assert!(text.contains("Analysis failed: Query execution failed: no such table: sales"));
        assert!(text.contains("Failed attempts: 3"));
        assert!(!text.contains("-- Insights --"));
    }

    #[test]
    fn sample_table_limits_rows_columns_and_cell_width() {
        let columns: Vec<String> = (0..10).map(|i| format!("c{}", i)).collect();
        let long = "x".repeat(80);
        let rows: Vec<Row> = (0..7)
            .map(|_| columns.iter().map(|c| (c.clone(), json!(long))).collect())
            .collect();
        let table = render_table(&columns, &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2 + SAMPLE_TABLE_ROWS);
        assert!(lines[0].contains("c7"));
        assert!(!lines[0].contains("c8"));
        assert!(lines[2].contains(&format!("{}...", "x".repeat(CELL_MAX_CHARS - 3))));
        assert!(!lines[2].contains(&"x".repeat(CELL_MAX_CHARS)));
    }

    #[test]
    fn null_and_missing_cells_render_blank() {
        assert_eq!(format_cell(None), "");
        assert_eq!(format_cell(Some(&Value::Null)), "");
        assert_eq!(format_cell(Some(&json!("a\nb"))), "a b");
        assert_eq!(format_cell(Some(&json!(true))), "true");
    }

    #[test]
    fn schema_renders_fields_and_errors() {
        let mut schemas = BTreeMap::new();
        schemas.insert(
            "orders".to_string(),
            Ok(vec![FieldSchema::new("order_id", "INTEGER").with_mode("REQUIRED")]),
        );
        schemas.insert("inventory".to_string(), Err("unknown table: inventory".to_string()));
        let text = render_schema(&schemas);
        assert!(text.contains("orders\n  order_id (INTEGER, REQUIRED)"));
        assert!(text.contains("inventory\n  error: unknown table: inventory"));

        let json = schema_to_json(&schemas);
        assert_eq!(json["orders"]["fields"][0]["type"], "INTEGER");
        assert_eq!(json["inventory"]["error"], "unknown table: inventory");
    }
}
