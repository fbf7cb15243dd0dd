//! Minimal agent trait: state in, state out.
//!
//! When `Agent::State == S`, an agent can be added to a `StateGraph<S>` directly
//! (see the blanket `Node` impl below).

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;
use crate::graph::{Next, Node};

/// One step that receives state and returns the updated state.
///
/// The implementer owns the shape of `State`. Routing is left to the graph: as a node
/// an agent always returns `Next::Continue`.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Display name, also used as the node id.
    fn name(&self) -> &str;

    type State: Clone + Send + Sync + Debug + 'static;

    async fn run(&self, state: Self::State) -> Result<Self::State, AgentError>;
}

#[async_trait]
impl<S, A> Node<S> for A
where
    S: Clone + Send + Sync + Debug + 'static,
    A: Agent<State = S> + Send + Sync,
{
    fn id(&self) -> &str {
        self.name()
    }

    async fn run(&self, state: S) -> Result<(S, Next), AgentError> {
        Agent::run(self, state).await.map(|s| (s, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    #[async_trait]
    impl Agent for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        type State = String;

        async fn run(&self, state: String) -> Result<String, AgentError> {
            Ok(state.to_uppercase())
        }
    }

    /// **Scenario**: an Agent used as a Node keeps its name as id and continues.
    #[tokio::test]
    async fn agent_runs_as_node() {
        let agent = Upper;
        assert_eq!(Node::<String>::id(&agent), "upper");
        let (out, next) = Node::<String>::run(&agent, "hi".into()).await.unwrap();
        assert_eq!(out, "HI");
        assert_eq!(next, Next::Continue);
    }
}
