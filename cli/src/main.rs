//! tally binary: ask analytics questions over the e-commerce warehouse.
//!
//! `tally -q "..."` runs one analysis; without `-q` it starts a REPL. Subcommands: `schema`,
//! `graph`, `init`.

mod log_format;
mod logging;
mod repl;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use config::Settings;
use tally::{generate_dot, generate_text, Analyzer};
use tracing::Instrument;

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Answer e-commerce analytics questions with generated SQL")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Command>,

    /// Question to analyze; starts the REPL when omitted
    #[arg(short, long, value_name = "TEXT")]
    query: Option<String>,

    /// SQLite database (default: TALLY_DATABASE or tally.db)
    #[arg(long, value_name = "PATH", global = true)]
    database: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// With --json, pretty-print (multi-line)
    #[arg(long, global = true)]
    pretty: bool,

    /// Print node enter/exit to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show table schemas (all catalog tables, or one)
    Schema {
        #[arg(value_name = "TABLE")]
        table: Option<String>,
    },
    /// Print the analysis workflow graph
    Graph {
        /// Graphviz DOT instead of text
        #[arg(long)]
        dot: bool,
    },
    /// Create the database file with the e-commerce tables
    Init,
}

/// How results are printed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Output {
    json: bool,
    pretty: bool,
}

impl Output {
    fn print<T: serde::Serialize>(
        &self,
        value: &T,
        text: impl FnOnce() -> String,
    ) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", cli::to_json(value, self.pretty)?);
        } else {
            print!("{}", text());
        }
        Ok(())
    }
}

/// Runs one analysis inside an `analysis` span and prints the report. Returns whether it succeeded.
pub(crate) async fn run_query(
    analyzer: &Analyzer,
    query: &str,
    output: Output,
    turn: u64,
) -> Result<bool, serde_json::Error> {
    let span = tracing::info_span!("analysis", turn);
    let report = analyzer.analyze(query).instrument(span).await;
    output.print(&report, || cli::render_report(&report))?;
    Ok(report.success)
}

pub(crate) async fn print_schema(
    analyzer: &Analyzer,
    table: Option<&str>,
    output: Output,
) -> Result<(), serde_json::Error> {
    let schemas = analyzer.schema_info(table).await;
    output.print(&cli::schema_to_json(&schemas), || cli::render_schema(&schemas))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = config::load_and_apply("tally", None) {
        eprintln!("warning: config not loaded: {}", e);
    }
    logging::init()?;

    let args = Args::parse();
    let settings = Settings::from_env()?;
    let output = Output {
        json: args.json,
        pretty: args.pretty,
    };
    let database = args.database.as_deref();

    match args.cmd {
        Some(Command::Graph { dot }) => {
            let graph = cli::workflow_graph(&settings)?;
            if dot {
                print!("{}", generate_dot(&graph));
            } else {
                print!("{}", generate_text(&graph));
            }
        }
        Some(Command::Schema { table }) => {
            let analyzer = cli::offline_analyzer(&settings, database)?;
            print_schema(&analyzer, table.as_deref(), output).await?;
        }
        Some(Command::Init) => {
            let path = cli::init_database(&settings, database)?;
            println!("Initialized {}", path.display());
        }
        None => {
            let analyzer = cli::build_analyzer(&settings, database, args.verbose)?;
            match args.query {
                Some(query) => {
                    if !run_query(&analyzer, &query, output, 1).await? {
                        std::process::exit(1);
                    }
                }
                None => repl::run_repl_loop(&analyzer, output).await?,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_and_flags() {
        let args = Args::try_parse_from(["tally", "-q", "top products", "--json", "--pretty"]).unwrap();
        assert_eq!(args.query.as_deref(), Some("top products"));
        assert!(args.json && args.pretty);
        assert!(args.cmd.is_none());
    }

    #[test]
    fn parses_subcommands_with_global_database() {
        let args = Args::try_parse_from(["tally", "schema", "orders", "--database", "shop.db"]).unwrap();
        assert!(matches!(args.cmd, Some(Command::Schema { table: Some(ref t) }) if t == "orders"));
        assert_eq!(args.database, Some(PathBuf::from("shop.db")));

        let args = Args::try_parse_from(["tally", "graph", "--dot"]).unwrap();
        assert!(matches!(args.cmd, Some(Command::Graph { dot: true })));
    }
}
