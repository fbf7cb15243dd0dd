//! Shared types for StateGraph integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use switchyard::{Agent, AgentError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountState {
    pub value: i64,
    pub visited: Vec<String>,
}

/// Adds `delta` and records its name.
pub struct IncrementAgent {
    pub name: &'static str,
    pub delta: i64,
}

#[async_trait]
impl Agent for IncrementAgent {
    fn name(&self) -> &str {
        self.name
    }

    type State = CountState;

    async fn run(&self, state: Self::State) -> Result<Self::State, AgentError> {
        let mut state = state;
        state.value += self.delta;
        state.visited.push(self.name.to_string());
        Ok(state)
    }
}

/// Fails the first `failures` runs, then behaves like an increment by one.
pub struct FlakyAgent {
    pub failures: usize,
    pub calls: AtomicUsize,
}

impl FlakyAgent {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for FlakyAgent {
    fn name(&self) -> &str {
        "flaky"
    }

    type State = CountState;

    async fn run(&self, state: Self::State) -> Result<Self::State, AgentError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(AgentError::ExecutionFailed(format!("transient failure {}", n + 1)));
        }
        let mut state = state;
        state.value += 1;
        state.visited.push("flaky".into());
        Ok(state)
    }
}
