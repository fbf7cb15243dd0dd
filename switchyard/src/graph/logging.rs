//! Structured logging for graph execution events.

use std::time::Duration;

use super::Next;
use crate::error::AgentError;

pub fn log_graph_start(node_count: usize, recursion_limit: usize) {
    tracing::info!(node_count, recursion_limit, "Starting graph execution");
}

pub fn log_node_start(node_id: &str, step: usize) {
    tracing::debug!(node_id, step, "Starting node execution");
}

pub fn log_node_complete(node_id: &str, next: &Next, elapsed: Duration) {
    tracing::debug!(
        node_id,
        ?next,
        elapsed_ms = elapsed.as_millis() as u64,
        "Node execution complete"
    );
}

pub fn log_graph_complete(steps: usize) {
    tracing::info!(steps, "Graph execution complete");
}

pub fn log_graph_error(error: &AgentError) {
    tracing::error!(%error, "Graph execution error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_functions_do_not_panic() {
        log_graph_start(3, 25);
        log_node_start("agent", 1);
        log_node_complete("agent", &Next::End, Duration::from_millis(12));
        log_graph_complete(1);
        log_graph_error(&AgentError::ExecutionFailed("test".to_string()));
    }
}
