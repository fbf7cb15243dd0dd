//! Next-step result from a graph node: follow the edges, jump to a node, or end.

/// Next step after running a node.
///
/// - **Continue**: follow the node's outgoing edge (END when it has none).
/// - **Node(id)**: jump to the given node.
/// - **End**: stop; return current state as final result.
///
/// Ignored for nodes that have conditional edges; the router decides there.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Next {
    Continue,
    Node(String),
    End,
}
