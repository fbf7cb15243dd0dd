//! Node built from a synchronous state transform.

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::AgentError;

use super::{Next, Node};

type Transform<S> = Arc<dyn Fn(S) -> Result<S, AgentError> + Send + Sync>;

/// Wraps `Fn(S) -> Result<S, AgentError>` as a node that always continues.
///
/// For steps with no I/O: string edits, counters, field resets.
pub struct FnNode<S> {
    id: String,
    f: Transform<S>,
}

impl<S> FnNode<S> {
    pub fn new<F>(id: impl Into<String>, f: F) -> Self
    where
        F: Fn(S) -> Result<S, AgentError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            f: Arc::new(f),
        }
    }
}

#[async_trait]
impl<S> Node<S> for FnNode<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, state: S) -> Result<(S, Next), AgentError> {
        (self.f)(state).map(|s| (s, Next::Continue))
    }
}
