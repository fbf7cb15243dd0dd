//! Per-invocation run settings.

/// Default number of node executions allowed in one `invoke`.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Settings for one `CompiledStateGraph::invoke` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Maximum node executions before the run fails with `AgentError::RecursionLimit`.
    pub recursion_limit: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl RunConfig {
    pub fn with_recursion_limit(limit: usize) -> Self {
        Self {
            recursion_limit: limit,
        }
    }
}
