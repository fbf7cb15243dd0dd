//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when edges reference unknown nodes or the
//! topology cannot be executed one node at a time.

use thiserror::Error;

/// Error when compiling a state graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompilationError {
    /// A node id in an edge was not registered via `add_node` (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge leaves START.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// Nothing can ever reach END.
    #[error("graph has no path to END")]
    MissingEnd,

    /// Fan-out, several entry points, or a cycle made only of plain edges.
    #[error("invalid graph topology: {0}")]
    InvalidTopology(String),

    /// A node has both an outgoing edge and conditional edges; it must have one or the other.
    #[error("node has both edge and conditional edges: {0}")]
    NodeHasBothEdgeAndConditional(String),

    /// A value in a conditional path map is not a registered node id or END.
    #[error("conditional path_map invalid target: {0}")]
    InvalidConditionalPathMap(String),
}
