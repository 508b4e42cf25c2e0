//! tally CLI library: builds an [`Analyzer`](tally::Analyzer) from settings and renders
//! reports, schemas and the workflow for the terminal.
//!
//! Used by the `tally` binary; kept in a library so rendering and setup can be unit tested.

pub mod display;
pub mod setup;

pub use display::{render_report, render_schema, schema_to_json, to_json, truncate_display};
pub use setup::{analyzer_config, build_analyzer, init_database, offline_analyzer, workflow_graph, SetupError};
