//! Compiled state graph: immutable, supports invoke.
//!
//! Built by `StateGraph::compile`. Runs from the START successor, asks each node for its
//! `Next` or the node's conditional router for the successor, and stops at END. Every run
//! is bounded by `RunConfig::recursion_limit`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::error::AgentError;

use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
};
use super::node_middleware::{BoxedNodeRun, NodeMiddleware};
use super::retry::RetryPolicy;
use super::run_config::RunConfig;
use super::state_graph::END;
use super::{Next, NextEntry, Node};

type NodeFuture<S> = Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>>;

/// Compiled graph: immutable structure, supports invoke only.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) node_order: Vec<String>,
    /// First node to run (target of the START edge).
    pub(super) first_node_id: String,
    /// Node id → how to pick its successor. Nodes without an entry end the run on `Continue`.
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) retry_policy: RetryPolicy,
    pub(super) run_config: RunConfig,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node ids in registration order.
    pub fn node_ids(&self) -> &[String] {
        &self.node_order
    }

    pub fn first_node_id(&self) -> &str {
        &self.first_node_id
    }

    /// Run config used when `invoke` gets `None`.
    pub fn default_run_config(&self) -> &RunConfig {
        &self.run_config
    }

    /// Runs one node, through middleware when set, retrying per the retry policy.
    async fn execute_node_with_retry(
        &self,
        node: Arc<dyn Node<S>>,
        state: S,
    ) -> Result<(S, Next), AgentError> {
        let mut attempt = 0;
        loop {
            let input = state.clone();
            let result = match &self.middleware {
                Some(middleware) => {
                    let node_id = node.id().to_string();
                    let inner_node = node.clone();
                    let inner: BoxedNodeRun<S> = Box::new(move |s: S| {
                        let fut: NodeFuture<S> = Box::pin(async move { inner_node.run(s).await });
                        fut
                    });
                    middleware.around_run(&node_id, input, inner).await
                }
                None => node.run(input).await,
            };

            match result {
                Ok(output) => return Ok(output),
                Err(e) if self.retry_policy.should_retry(attempt, &e) => {
                    let delay = self.retry_policy.delay(attempt);
                    tracing::warn!(
                        node_id = node.id(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "node failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Successor of `current_id` after it returned `next`, or `None` to stop.
    fn resolve_next(&self, current_id: &str, state: &S, next: Next) -> Option<String> {
        match self.next_map.get(current_id) {
            Some(NextEntry::Conditional(router)) => {
                let (key, target) = router.resolve(state);
                tracing::debug!(from = current_id, key = %key, to = %target, "conditional routing");
                Some(target)
            }
            entry => match next {
                Next::End => None,
                Next::Node(id) => Some(id),
                Next::Continue => match entry {
                    Some(NextEntry::Unconditional(to)) => Some(to.clone()),
                    _ => None,
                },
            },
        }
    }

    async fn run_loop(&self, mut state: S, config: &RunConfig) -> Result<S, AgentError> {
        log_graph_start(self.nodes.len(), config.recursion_limit);
        let mut current_id = self.first_node_id.clone();
        let mut steps = 0usize;

        loop {
            if steps >= config.recursion_limit {
                return Err(AgentError::RecursionLimit {
                    limit: config.recursion_limit,
                    node_id: current_id,
                });
            }
            let node = self
                .nodes
                .get(&current_id)
                .cloned()
                .ok_or_else(|| AgentError::UnknownNode(current_id.clone()))?;
            steps += 1;

            log_node_start(&current_id, steps);
            let started = Instant::now();
            let (new_state, next) = self
                .execute_node_with_retry(node, state)
                .instrument(tracing::debug_span!("node", node_id = %current_id, step = steps))
                .await?;
            log_node_complete(&current_id, &next, started.elapsed());
            state = new_state;

            match self.resolve_next(&current_id, &state, next) {
                Some(id) if id != END => current_id = id,
                _ => {
                    log_graph_complete(steps);
                    return Ok(state);
                }
            }
        }
    }

    /// Runs the graph with `state` until END.
    ///
    /// `config` falls back to the graph's default run config (recursion limit 25 unless
    /// set with `StateGraph::with_run_config`).
    ///
    /// - `Next::Continue`: follow the node's edge, or stop if it has none.
    /// - `Next::Node(id)`: run the node with that id next.
    /// - `Next::End`: stop and return current state.
    ///
    /// Nodes with conditional edges always route through their router.
    pub async fn invoke(&self, state: S, config: Option<RunConfig>) -> Result<S, AgentError> {
        if self.nodes.is_empty() || !self.nodes.contains_key(&self.first_node_id) {
            return Err(AgentError::ExecutionFailed("empty graph".into()));
        }
        let config = config.unwrap_or_else(|| self.run_config.clone());
        let span = tracing::info_span!("graph_run", first_node = %self.first_node_id);
        self.run_loop(state, &config).instrument(span).await.map_err(|e| {
            log_graph_error(&e);
            e
        })
    }
}
