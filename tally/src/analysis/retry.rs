//! Retry ceiling shared by the handle-error node and its router.

/// Maximum number of counted failures before a run gives up.
///
/// Each failing visit to generate-query or execute-query adds exactly one to
/// `error_count`, so a run makes at most `ceiling` retry cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryCeiling(u32);

impl RetryCeiling {
    pub const DEFAULT: RetryCeiling = RetryCeiling(3);

    pub fn new(max_failures: u32) -> Self {
        Self(max_failures)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn is_exhausted(&self, error_count: u32) -> bool {
        error_count >= self.0
    }

    /// Engine step limit for a workflow using this ceiling: two setup steps, three per
    /// retry cycle, plus slack.
    pub fn step_limit(&self) -> usize {
        8 + 3 * self.0 as usize
    }
}

impl Default for RetryCeiling {
    fn default() -> Self {
        Self::DEFAULT
    }
}
