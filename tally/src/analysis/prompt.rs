//! Prompt text for the three completion calls, plus the schema and result renderings
//! they embed.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::catalog::{self, AnalysisType};
use crate::state::QueryResults;
use crate::warehouse::FieldSchema;

/// Fields per table shown to the query generator.
pub const SCHEMA_FIELD_LIMIT: usize = 10;

/// Sample rows shown to the insight generator.
pub const PROMPT_SAMPLE_ROWS: usize = 3;

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

pub fn classify_intent(user_query: &str) -> String {
    let types: Vec<&str> = AnalysisType::ALL.iter().map(|t| t.as_str()).collect();
    format!(
        "Analyze this user query and determine the type of e-commerce analysis requested:\n\n\
         Query: {}\n\n\
         Available analysis types:\n{}\n\n\
         Return only the analysis type that best matches, or 'general' if unclear.",
        user_query,
        types.join(", ")
    )
}

/// Per table: upper-cased name, catalog description, then up to `SCHEMA_FIELD_LIMIT`
/// fields as `  - name (type): description`. Tables with no fields are skipped.
pub fn schema_context(schemas: &BTreeMap<String, Vec<FieldSchema>>) -> String {
    let mut lines = Vec::new();
    for (table, fields) in schemas {
        if fields.is_empty() {
            continue;
        }
        let description = catalog::table(table).map_or("", |t| t.description);
        lines.push(format!("\n{} table:", table.to_uppercase()));
        lines.push(format!("Description: {}", description));
        for field in fields.iter().take(SCHEMA_FIELD_LIMIT) {
            lines.push(format!(
                "  - {} ({}): {}",
                field.name,
                field.field_type,
                field.description.as_deref().unwrap_or("")
            ));
        }
    }
    lines.join("\n")
}

pub fn generate_query(
    user_query: &str,
    analysis_type: Option<AnalysisType>,
    schema_context: &str,
) -> String {
    let tables: Vec<&str> = catalog::table_names().collect();
    format!(
        "Generate a SQL query for the following e-commerce analysis request:\n\n\
         User Query: {}\n\
         Analysis Type: {}\n\n\
         Available Tables and Schemas:\n{}\n\n\
         Requirements:\n\
         - Use only SELECT statements\n\
         - Include meaningful column aliases\n\
         - Add appropriate WHERE clauses to filter data\n\
         - Limit results to reasonable numbers (e.g., LIMIT 100 for detailed data)\n\
         - Use proper JOIN syntax when needed\n\
         - Focus on actionable business insights\n\
         - Only use tables: {}\n\n\
         Return only the SQL query without explanations.",
        user_query,
        analysis_type.unwrap_or(AnalysisType::General),
        schema_context,
        tables.join(", ")
    )
}

/// Row count, columns, per-column stats and the first `PROMPT_SAMPLE_ROWS` rows as JSON.
pub fn results_summary(results: &QueryResults) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Rows returned: {}", results.row_count);
    let _ = write!(text, "Columns: {}", results.columns.join(", "));
    if !results.summary_stats.is_empty() {
        let _ = write!(text, "\nSummary statistics:");
        for (column, stats) in &results.summary_stats {
            let _ = write!(
                text,
                "\n  {}: min={}, max={}, avg={}",
                column,
                fmt_stat(stats.min),
                fmt_stat(stats.max),
                fmt_stat(stats.mean)
            );
        }
    }
    if !results.data.is_empty() {
        let sample = &results.data[..results.data.len().min(PROMPT_SAMPLE_ROWS)];
        let rendered = serde_json::to_string(sample).unwrap_or_default();
        let _ = write!(text, "\nSample data (first {} rows): {}", sample.len(), rendered);
    }
    text
}

pub fn generate_insights(
    user_query: &str,
    analysis_type: Option<AnalysisType>,
    sql: &str,
    results_summary: &str,
) -> String {
    format!(
        "Analyze the following query results and generate actionable business insights:\n\n\
         Original Query: {}\n\
         Analysis Type: {}\n\
         SQL Query: {}\n\n\
         Query Results Summary:\n{}\n\n\
         Generate 3-5 key business insights focusing on:\n\
         - Trends and patterns identified\n\
         - Business implications\n\
         - Actionable recommendations\n\
         - Data-driven conclusions\n\n\
         Format as bullet points, each insight should be concise and actionable.",
        user_query,
        analysis_type.unwrap_or(AnalysisType::General),
        sql,
        results_summary
    )
}
