//! Agent execution error types.
//!
//! Returned by `Node::run`, `Agent::run`, `LlmClient::invoke` and the graph runner.

use thiserror::Error;

use crate::prompts::PromptError;
use crate::structured::StructuredOutputError;

/// Error raised while running a node, an agent or a whole graph.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (LLM transport, executor spawn, empty graph).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The graph ran more node steps than the configured recursion limit allows.
    #[error("recursion limit of {limit} steps reached without hitting END (last node: {node_id})")]
    RecursionLimit { limit: usize, node_id: String },

    /// A node tried to route to an id that is not in the graph.
    #[error("unknown next node: {0}")]
    UnknownNode(String),

    /// A prompt template could not be rendered.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// Model output did not match the requested structure.
    #[error(transparent)]
    StructuredOutput(#[from] StructuredOutputError),
}
