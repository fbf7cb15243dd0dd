//! State graph: named nodes, edges and conditional edges; compile, then invoke with state.
//!
//! Nodes run one at a time. Cycles are allowed only through conditional edges, and every
//! run is bounded by [`RunConfig::recursion_limit`].

mod compile_error;
mod compiled;
mod conditional;
mod fn_node;
mod logging;
mod name_node;
mod next;
mod node;
mod node_middleware;
mod retry;
mod run_config;
mod state_graph;
mod visualization;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use fn_node::FnNode;
pub use logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
};
pub use name_node::NameNode;
pub use next::Next;
pub use node::Node;
pub use node_middleware::{BoxedNodeRun, NodeMiddleware};
pub use retry::RetryPolicy;
pub use run_config::RunConfig;
pub use state_graph::{StateGraph, END, START};
pub use visualization::{generate_dot, generate_mermaid};
