//! Conditional edges: route to the next node based on state.
//!
//! A source node has a routing function that reads the state and returns a key; the
//! key is looked up in an optional path map, otherwise used as the node id directly.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Router function: state in, routing key out.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Routing function plus optional key → node id map.
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    pub(super) path: ConditionalRouterFn<S>,
    pub(super) path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Returns `(key, target)`: the router's key and the node id (or END) it maps to.
    pub fn resolve(&self, state: &S) -> (String, String) {
        let key = (self.path)(state);
        let target = self
            .path_map
            .as_ref()
            .and_then(|m| m.get(&key))
            .cloned()
            .unwrap_or_else(|| key.clone());
        (key, target)
    }

    /// Path map entries sorted by key; empty when the router returns node ids directly.
    pub fn routes(&self) -> Vec<(&str, &str)> {
        let mut routes: Vec<(&str, &str)> = self
            .path_map
            .iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        routes.sort();
        routes
    }
}

/// How the compiled graph picks the successor of a node.
#[derive(Clone)]
pub enum NextEntry<S> {
    /// Single fixed next node (or END). The node's own `Next` is still respected.
    Unconditional(String),
    /// Next node is decided by the router from state; the node's `Next` is ignored.
    Conditional(ConditionalRouter<S>),
}
