//! Agents implement Node through the blanket impl and chain like any node.

use std::sync::Arc;

use switchyard::{StateGraph, END, START};

use crate::common::{CountState, IncrementAgent};

/// **Scenario**: three agents in a line run in order and each sees the previous output.
#[tokio::test]
async fn agents_chain_in_order() {
    let mut graph = StateGraph::<CountState>::new();
    graph
        .add_node("one", Arc::new(IncrementAgent { name: "one", delta: 1 }))
        .add_node("ten", Arc::new(IncrementAgent { name: "ten", delta: 10 }))
        .add_node("hundred", Arc::new(IncrementAgent { name: "hundred", delta: 100 }))
        .add_edge(START, "one")
        .add_edge("one", "ten")
        .add_edge("ten", "hundred")
        .add_edge("hundred", END);
    let compiled = graph.compile().unwrap();

    let out = compiled.invoke(CountState::default(), None).await.unwrap();
    assert_eq!(out.value, 111);
    assert_eq!(out.visited, vec!["one", "ten", "hundred"]);
    assert_eq!(compiled.first_node_id(), "one");
}

/// **Scenario**: a conditional router on agent output picks the branch.
#[tokio::test]
async fn router_branches_on_agent_output() {
    let mut graph = StateGraph::<CountState>::new();
    graph
        .add_node("start", Arc::new(IncrementAgent { name: "start", delta: 0 }))
        .add_node("small", Arc::new(IncrementAgent { name: "small", delta: 1 }))
        .add_node("big", Arc::new(IncrementAgent { name: "big", delta: 1000 }))
        .add_edge(START, "start")
        .add_edge("small", END)
        .add_edge("big", END);
    graph.add_conditional_edges(
        "start",
        Arc::new(|s: &CountState| if s.value > 5 { "big".into() } else { "small".into() }),
        None,
    );
    let compiled = graph.compile().unwrap();

    let low = compiled
        .invoke(CountState { value: 1, ..Default::default() }, None)
        .await
        .unwrap();
    assert_eq!(low.visited, vec!["start", "small"]);

    let high = compiled
        .invoke(CountState { value: 6, ..Default::default() }, None)
        .await
        .unwrap();
    assert_eq!(high.value, 1006);
}
