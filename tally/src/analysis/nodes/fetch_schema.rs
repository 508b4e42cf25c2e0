use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::analysis::NodeId;
use crate::catalog::TABLES;
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::AnalysisState;
use crate::warehouse::SchemaSource;

use super::call_with_deadline;

/// Looks up the schema of every catalog table. A table whose lookup fails is left out;
/// such failures are logged and never counted.
pub struct FetchSchemaNode {
    schema: Arc<dyn SchemaSource>,
    deadline: Duration,
}

impl FetchSchemaNode {
    pub fn new(schema: Arc<dyn SchemaSource>, deadline: Duration) -> Self {
        Self { schema, deadline }
    }
}

#[async_trait]
impl Node<AnalysisState> for FetchSchemaNode {
    fn id(&self) -> &str {
        NodeId::FetchSchema.as_str()
    }

    async fn run(&self, mut state: AnalysisState) -> Result<(AnalysisState, Next), AgentError> {
        for table in TABLES.iter() {
            match call_with_deadline(self.deadline, self.schema.table_schema(table.name)).await {
                Ok(fields) => {
                    info!(table = table.name, fields = fields.len(), "retrieved schema");
                    state.table_schemas.insert(table.name.to_string(), fields);
                }
                Err(message) => {
                    warn!(table = table.name, error = %message, "could not retrieve schema");
                }
            }
        }
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::{FieldSchema, MockSchemaSource};

    /// **Scenario**: One table fails and one is unknown; the rest are kept, nothing is counted.
    #[tokio::test]
    async fn partial_schema_failures_are_tolerated() {
        let source = Arc::new(
            MockSchemaSource::new()
                .with_table("orders", vec![FieldSchema::new("order_id", "INTEGER")])
                .with_table("products", vec![FieldSchema::new("id", "INTEGER")])
                .with_failing_table("users", "permission denied"),
        );
        let node = FetchSchemaNode::new(source.clone(), Duration::from_secs(5));
        let (state, next) = node.run(AnalysisState::new("q")).await.unwrap();
        assert_eq!(next, Next::Continue);
        assert_eq!(source.call_count(), 4);
        let tables: Vec<&str> = state.table_schemas.keys().map(String::as_str).collect();
        assert_eq!(tables, vec!["orders", "products"]);
        assert_eq!(state.error_count, 0);
        assert!(state.last_error.is_none());
    }
}
