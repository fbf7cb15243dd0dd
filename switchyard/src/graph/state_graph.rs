//! State graph builder: nodes, explicit edges (from → to) and conditional edges.
//!
//! Add nodes with `add_node`, wire them with `add_edge(from, to)` using `START` and
//! `END` for entry and exit, and route on state with `add_conditional_edges`. Then
//! `compile` to get a `CompiledStateGraph`.
//!
//! # Conditional edges
//!
//! After the source node runs, a routing function `(state) -> key` is called; the key
//! is looked up in the optional path map, or used as the next node id directly. A node
//! has either one outgoing `add_edge` or `add_conditional_edges`, not both.
//!
//! # Loops
//!
//! Loops are allowed only through conditional edges, so every cycle has a router that
//! can leave it. The runner additionally enforces a recursion limit per run.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::CompiledStateGraph;
use crate::graph::conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;
use crate::graph::retry::RetryPolicy;
use crate::graph::run_config::RunConfig;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// State graph: nodes plus explicit edges and optional conditional edges.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces `CompiledStateGraph<S>`.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// Registration order of node ids, for stable visualization output.
    node_order: Vec<String>,
    edges: Vec<(String, String)>,
    conditional_edges: HashMap<String, ConditionalRouter<S>>,
    middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    retry_policy: RetryPolicy,
    run_config: RunConfig,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            node_order: Vec::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
            middleware: None,
            retry_policy: RetryPolicy::None,
            run_config: RunConfig::default(),
        }
    }

    /// Wraps every node run with `middleware`.
    pub fn with_middleware(self, middleware: Arc<dyn NodeMiddleware<S>>) -> Self {
        Self {
            middleware: Some(middleware),
            ..self
        }
    }

    /// Retry failing nodes per `retry_policy`. Default is no retry.
    pub fn with_retry_policy(self, retry_policy: RetryPolicy) -> Self {
        Self {
            retry_policy,
            ..self
        }
    }

    /// Run config used when `invoke` is called with `None`.
    pub fn with_run_config(self, run_config: RunConfig) -> Self {
        Self { run_config, ..self }
    }

    /// Adds a node; replaces any node registered under the same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        let id = id.into();
        if !self.nodes.contains_key(&id) {
            self.node_order.push(id.clone());
        }
        self.nodes.insert(id, node);
        self
    }

    /// Adds an edge from `from_id` to `to_id`. Use `START` / `END` for entry and exit.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds conditional edges from `source`: the next node is determined by `path(state)`.
    ///
    /// - `path_map == None`: the returned key is the next node id (or END).
    /// - `path_map == Some(map)`: next is `map[key]`, or the key itself when absent.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// graph.add_conditional_edges(
    ///     "evaluate",
    ///     Arc::new(|s: &RouterState| s.verdict.label().to_string()),
    ///     Some([("continue".into(), "agent".into()), ("end".into(), END.into())].into_iter().collect()),
    /// );
    /// ```
    pub fn add_conditional_edges(
        &mut self,
        source: impl Into<String>,
        path: ConditionalRouterFn<S>,
        path_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.conditional_edges
            .insert(source.into(), ConditionalRouter::new(path, path_map));
        self
    }

    fn check_known(&self, id: &str, sentinel: &str) -> Result<(), CompilationError> {
        if id == sentinel || self.nodes.contains_key(id) {
            Ok(())
        } else {
            Err(CompilationError::NodeNotFound(id.to_string()))
        }
    }

    /// Validates the topology and builds the executable graph.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        for (from, to) in &self.edges {
            self.check_known(from, START)?;
            self.check_known(to, END)?;
        }
        for (source, router) in &self.conditional_edges {
            if !self.nodes.contains_key(source) {
                return Err(CompilationError::NodeNotFound(source.clone()));
            }
            for (_, target) in router.routes() {
                if target != END && !self.nodes.contains_key(target) {
                    return Err(CompilationError::InvalidConditionalPathMap(
                        target.to_string(),
                    ));
                }
            }
        }

        let mut start_targets = self
            .edges
            .iter()
            .filter(|(f, _)| f == START)
            .map(|(_, t)| t.clone());
        let first = start_targets.next().ok_or(CompilationError::MissingStart)?;
        if start_targets.next().is_some() {
            return Err(CompilationError::InvalidTopology(
                "multiple edges from START".into(),
            ));
        }
        if first == END {
            return Err(CompilationError::InvalidTopology(
                "START connects directly to END".into(),
            ));
        }

        let reaches_end = self.edges.iter().any(|(_, t)| t == END)
            || self
                .conditional_edges
                .values()
                .any(|r| r.path_map.is_none() || r.routes().iter().any(|(_, t)| *t == END));
        if !reaches_end {
            return Err(CompilationError::MissingEnd);
        }

        let mut plain: HashMap<String, String> = HashMap::new();
        for (from, to) in self.edges.iter().filter(|(f, _)| f != START) {
            if plain.insert(from.clone(), to.clone()).is_some() {
                return Err(CompilationError::InvalidTopology(format!(
                    "node {} has more than one outgoing edge; fan-out is not supported",
                    from
                )));
            }
            if self.conditional_edges.contains_key(from) {
                return Err(CompilationError::NodeHasBothEdgeAndConditional(
                    from.clone(),
                ));
            }
        }
        detect_plain_cycle(&plain)?;

        let mut next_map: HashMap<String, NextEntry<S>> = plain
            .into_iter()
            .map(|(f, t)| (f, NextEntry::Unconditional(t)))
            .collect();
        for (source, router) in self.conditional_edges {
            next_map.insert(source, NextEntry::Conditional(router));
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            node_order: self.node_order,
            first_node_id: first,
            next_map,
            middleware: self.middleware,
            retry_policy: self.retry_policy,
            run_config: self.run_config,
        })
    }
}

/// Fails when following plain edges alone can loop forever.
fn detect_plain_cycle(plain: &HashMap<String, String>) -> Result<(), CompilationError> {
    let mut cleared: HashSet<&str> = HashSet::new();
    let mut starts: Vec<&String> = plain.keys().collect();
    starts.sort();
    for start in starts {
        let mut path: Vec<&str> = Vec::new();
        let mut current = start.as_str();
        while !cleared.contains(current) {
            if let Some(pos) = path.iter().position(|p| *p == current) {
                let mut cycle = path[pos..].to_vec();
                cycle.push(current);
                return Err(CompilationError::InvalidTopology(format!(
                    "cycle without a conditional edge: {}",
                    cycle.join(" -> ")
                )));
            }
            path.push(current);
            match plain.get(current) {
                Some(next) => current = next.as_str(),
                None => break,
            }
        }
        cleared.extend(path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NameNode;

    fn graph_with(ids: &[&str]) -> StateGraph<i32> {
        let mut graph = StateGraph::<i32>::new();
        for id in ids {
            graph.add_node(*id, Arc::new(NameNode::new(*id)));
        }
        graph
    }

    fn expect_err(graph: StateGraph<i32>) -> CompilationError {
        match graph.compile() {
            Err(e) => e,
            Ok(_) => panic!("expected compile error"),
        }
    }

    /// **Scenario**: Compile fails when a node has both an outgoing edge and conditional edges.
    #[test]
    fn compile_fails_when_node_has_both_edge_and_conditional() {
        let mut graph = graph_with(&["a", "b"]);
        graph.add_edge(START, "a").add_edge("a", "b").add_edge("b", END);
        graph.add_conditional_edges("a", Arc::new(|_: &i32| "b".to_string()), None);
        assert_eq!(
            expect_err(graph),
            CompilationError::NodeHasBothEdgeAndConditional("a".into())
        );
    }

    /// **Scenario**: Compile fails when a conditional path map targets an unknown node.
    #[test]
    fn compile_fails_when_conditional_path_map_has_invalid_target() {
        let mut graph = graph_with(&["a"]);
        graph.add_edge(START, "a");
        graph.add_conditional_edges(
            "a",
            Arc::new(|_: &i32| "x".to_string()),
            Some([("x".to_string(), "nonexistent".to_string())].into_iter().collect()),
        );
        assert_eq!(
            expect_err(graph),
            CompilationError::InvalidConditionalPathMap("nonexistent".into())
        );
    }

    /// **Scenario**: Two plain edges out of one node (fan-out) are rejected.
    #[test]
    fn compile_rejects_fan_out() {
        let mut graph = graph_with(&["node1", "node2", "node3"]);
        graph
            .add_edge(START, "node1")
            .add_edge("node1", "node2")
            .add_edge("node1", "node3")
            .add_edge("node2", END)
            .add_edge("node3", END);
        assert!(matches!(
            expect_err(graph),
            CompilationError::InvalidTopology(m) if m.contains("node1") && m.contains("fan-out")
        ));
    }

    /// **Scenario**: A loop made only of plain edges can never exit and is rejected.
    #[test]
    fn compile_rejects_plain_cycle() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", "a")
            .add_edge("c", END);
        assert!(matches!(
            expect_err(graph),
            CompilationError::InvalidTopology(m) if m.contains("a -> b -> a")
        ));
    }

    /// **Scenario**: A loop closed through a conditional edge compiles.
    #[test]
    fn compile_accepts_conditional_loop() {
        let mut graph = graph_with(&["agent", "action"]);
        graph.add_edge(START, "agent").add_edge("action", "agent");
        graph.add_conditional_edges(
            "agent",
            Arc::new(|s: &i32| if *s > 3 { "end".into() } else { "continue".into() }),
            Some(
                [
                    ("continue".to_string(), "action".to_string()),
                    ("end".to_string(), END.to_string()),
                ]
                .into_iter()
                .collect(),
            ),
        );
        assert!(graph.compile().is_ok());
    }

    #[test]
    fn compile_requires_start_and_end() {
        let mut graph = graph_with(&["a"]);
        graph.add_edge("a", END);
        assert_eq!(expect_err(graph), CompilationError::MissingStart);

        let mut graph = graph_with(&["a"]);
        graph.add_edge(START, "a");
        assert_eq!(expect_err(graph), CompilationError::MissingEnd);
    }

    #[test]
    fn compile_rejects_unknown_edge_endpoint() {
        let mut graph = graph_with(&["a"]);
        graph.add_edge(START, "a").add_edge("a", "ghost");
        assert_eq!(expect_err(graph), CompilationError::NodeNotFound("ghost".into()));
    }
}
