//! Ready-made graphs built from [`crate::graph`] nodes.
//!
//! - [`router_loop`]: agent → tool → evaluate, looping until the evaluator says stop.
//! - [`tool_calling`]: message-list tool loop.
//! - [`dispatch`]: classify a query, then answer with a basic or tool-bound agent.
//! - [`codegen`]: generate, review and run Python.
//! - [`demos`]: chain, branch and joke loop.
//! - [`evaluator`]: one-shot typed judgment of a response.
//!
//! Builders return an uncompiled [`crate::graph::StateGraph`] so callers can add middleware
//! or a retry policy before compiling.

pub mod codegen;
pub mod demos;
pub mod dispatch;
pub mod evaluator;
pub mod router_loop;
pub mod tool_calling;

pub use evaluator::Evaluator;
pub use router_loop::{build_router_loop_graph, RouterLoop, RouterLoopOptions, RouterState};
