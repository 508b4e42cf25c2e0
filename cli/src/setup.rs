//! Turns [`Settings`] into a ready [`Analyzer`]: OpenAI client, SQLite warehouse, tunables.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use config::{Settings, SettingsError};
use tally::analysis::{build_graph, Capabilities};
use tally::{
    AgentError, AnalysisState, Analyzer, AnalyzerConfig, BuildError, ChatOpenAI,
    CompilationError, CompiledStateGraph, FieldSchema, LlmClient, LlmResponse, Message,
    QueryEngine, ResultSet, RetryCeiling, SchemaSource, SqliteWarehouse, WarehouseError,
};
use thiserror::Error;
use tracing::info;

/// Error preparing the analyzer or the database.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("database {path}: {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: WarehouseError,
    },
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Analyzer tunables from settings. `verbose` adds the node enter/exit middleware.
pub fn analyzer_config(settings: &Settings, verbose: bool) -> AnalyzerConfig {
    AnalyzerConfig {
        retry_ceiling: RetryCeiling::new(settings.max_failures),
        call_timeout: settings.call_timeout,
        verbose,
    }
}

fn database_path<'a>(settings: &'a Settings, database: Option<&'a Path>) -> &'a Path {
    database.unwrap_or(settings.database.as_path())
}

fn open_warehouse(path: &Path) -> Result<Arc<SqliteWarehouse>, SetupError> {
    SqliteWarehouse::open(path)
        .map(Arc::new)
        .map_err(|source| SetupError::Database {
            path: path.to_path_buf(),
            source,
        })
}

/// Builds the analyzer used for questions: OpenAI chat model over the SQLite warehouse.
///
/// `database` overrides `TALLY_DATABASE`. Fails without `OPENAI_API_KEY` or when the
/// database cannot be opened.
pub fn build_analyzer(
    settings: &Settings,
    database: Option<&Path>,
    verbose: bool,
) -> Result<Analyzer, SetupError> {
    let api_key = settings.require_api_key()?;
    let llm = ChatOpenAI::from_credentials(
        api_key,
        settings.openai_base_url.as_deref(),
        settings.model.clone(),
    )
    .with_temperature(settings.temperature);
    let warehouse = open_warehouse(database_path(settings, database))?;
    info!(
        model = %settings.model,
        database = %warehouse.path().display(),
        max_failures = settings.max_failures,
        "analyzer ready"
    );
    Ok(Analyzer::new(
        Arc::new(llm),
        warehouse.clone(),
        warehouse,
        analyzer_config(settings, verbose),
    )?)
}

/// Stand-in port for commands that must not reach a capability: every call fails.
struct Unavailable(&'static str);

impl Unavailable {
    fn message(&self) -> String {
        format!("{} is not available for this command", self.0)
    }
}

#[async_trait]
impl LlmClient for Unavailable {
    async fn invoke(&self, _messages: &[Message]) -> Result<LlmResponse, AgentError> {
        Err(AgentError::ExecutionFailed(self.message()))
    }
}

#[async_trait]
impl SchemaSource for Unavailable {
    async fn table_schema(&self, _table: &str) -> Result<Vec<FieldSchema>, WarehouseError> {
        Err(WarehouseError::Backend(self.message()))
    }
}

#[async_trait]
impl QueryEngine for Unavailable {
    async fn execute(&self, _sql: &str) -> Result<ResultSet, WarehouseError> {
        Err(WarehouseError::Backend(self.message()))
    }
}

/// Analyzer for commands that never reach the model (`schema`). Needs no API key.
pub fn offline_analyzer(settings: &Settings, database: Option<&Path>) -> Result<Analyzer, SetupError> {
    let warehouse = open_warehouse(database_path(settings, database))?;
    let llm: Arc<dyn LlmClient> = Arc::new(Unavailable("language model"));
    Ok(Analyzer::new(
        llm,
        warehouse.clone(),
        warehouse,
        analyzer_config(settings, false),
    )?)
}

/// The compiled workflow for rendering. Touches neither the model nor the database.
pub fn workflow_graph(settings: &Settings) -> Result<CompiledStateGraph<AnalysisState>, CompilationError> {
    let capabilities = Capabilities {
        llm: Arc::new(Unavailable("language model")),
        schema: Arc::new(Unavailable("schema lookup")),
        engine: Arc::new(Unavailable("query engine")),
    };
    build_graph(&capabilities, &analyzer_config(settings, false))
}

/// Creates the database file (if missing) with the e-commerce tables. Returns its path.
pub fn init_database(settings: &Settings, database: Option<&Path>) -> Result<PathBuf, SetupError> {
    let path = database_path(settings, database);
    SqliteWarehouse::create(path).map_err(|source| SetupError::Database {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}
