//! Analysis state: the single record threaded through every workflow node.
//!
//! One `AnalysisState` per `analyze` call, moved into each node and returned by it.
//! Failures are data ([`StepFailure`]), so nodes never return `Err`.

mod analysis_state;
mod failure;
mod results;

pub use analysis_state::{AnalysisState, Termination};
pub use failure::{FailureKind, StepFailure};
pub use results::{QueryResults, SAMPLE_ROW_LIMIT};
