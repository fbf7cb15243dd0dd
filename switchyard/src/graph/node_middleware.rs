//! Node middleware: wrap each node run with external async logic (around pattern).
//!
//! Set via `StateGraph::with_middleware`. The CLI uses it to print state between
//! steps and pause; `TranscriptMiddleware` uses it to write a transcript file.

use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use crate::error::AgentError;

use super::Next;

/// The wrapped node run, handed to `NodeMiddleware::around_run`.
pub type BoxedNodeRun<S> = Box<
    dyn FnOnce(S) -> Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>> + Send,
>;

#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Runs around one node execution. Must call `inner` to actually run the node.
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: BoxedNodeRun<S>,
    ) -> Result<(S, Next), AgentError>;
}
