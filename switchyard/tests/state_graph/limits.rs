//! Retry policy and recursion limit.

use std::sync::Arc;
use std::time::Duration;

use switchyard::{AgentError, RetryPolicy, RunConfig, StateGraph, END, START};

use crate::common::{CountState, FlakyAgent, IncrementAgent};

fn flaky_graph(agent: Arc<FlakyAgent>, policy: RetryPolicy) -> StateGraph<CountState> {
    let mut graph = StateGraph::<CountState>::new().with_retry_policy(policy);
    graph
        .add_node("flaky", agent)
        .add_edge(START, "flaky")
        .add_edge("flaky", END);
    graph
}

/// **Scenario**: a node failing twice succeeds on the third try under a fixed retry policy.
#[tokio::test]
async fn fixed_retry_recovers_transient_failures() {
    let agent = Arc::new(FlakyAgent::new(2));
    let compiled = flaky_graph(agent.clone(), RetryPolicy::fixed(2, Duration::from_millis(1)))
        .compile()
        .unwrap();
    let out = compiled.invoke(CountState::default(), None).await.unwrap();
    assert_eq!(out.value, 1);
    assert_eq!(agent.calls(), 3);
}

/// **Scenario**: without a retry policy the first error ends the run.
#[tokio::test]
async fn no_retry_propagates_first_error() {
    let agent = Arc::new(FlakyAgent::new(1));
    let compiled = flaky_graph(agent.clone(), RetryPolicy::None).compile().unwrap();
    let err = compiled.invoke(CountState::default(), None).await.unwrap_err();
    assert!(matches!(err, AgentError::ExecutionFailed(m) if m.contains("transient")));
    assert_eq!(agent.calls(), 1);
}

/// **Scenario**: an endless conditional loop stops at the per-run recursion limit.
#[tokio::test]
async fn endless_loop_hits_recursion_limit() {
    let mut graph = StateGraph::<CountState>::new();
    graph
        .add_node("spin", Arc::new(IncrementAgent { name: "spin", delta: 1 }))
        .add_edge(START, "spin");
    graph.add_conditional_edges(
        "spin",
        Arc::new(|s: &CountState| if s.value < 0 { END.into() } else { "spin".into() }),
        None,
    );
    let compiled = graph.compile().unwrap();
    let err = compiled
        .invoke(CountState::default(), Some(RunConfig::with_recursion_limit(7)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AgentError::RecursionLimit { limit: 7, ref node_id } if node_id == "spin"
    ));
}
