//! Name node: a pass-through node that only has a name.
//!
//! Useful as an entry or join point whose only job is to carry conditional edges.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;

use super::Next;
use super::Node;

/// A node that does nothing except expose a name; state is passed through unchanged.
pub struct NameNode {
    name: String,
}

impl NameNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl<S> Node<S> for NameNode
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn id(&self) -> &str {
        &self.name
    }

    async fn run(&self, state: S) -> Result<(S, Next), AgentError> {
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_state_through() {
        let node = NameNode::new("entry");
        assert_eq!(Node::<i32>::id(&node), "entry");
        let (out, next) = Node::<i32>::run(&node, 41).await.unwrap();
        assert_eq!(out, 41);
        assert_eq!(next, Next::Continue);
    }
}
