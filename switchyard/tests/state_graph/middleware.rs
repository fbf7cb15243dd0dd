//! StateGraph middleware: with_middleware().compile() wraps every node run.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use switchyard::graph::BoxedNodeRun;
use switchyard::{AgentError, Next, NodeMiddleware, StateGraph, TranscriptMiddleware, END, START};

use crate::common::{CountState, IncrementAgent};

/// Records node ids as they run, and the value each node produced.
struct RecordingMiddleware {
    seen: Mutex<Vec<(String, i64)>>,
}

#[async_trait]
impl NodeMiddleware<CountState> for RecordingMiddleware {
    async fn around_run(
        &self,
        node_id: &str,
        state: CountState,
        inner: BoxedNodeRun<CountState>,
    ) -> Result<(CountState, Next), AgentError> {
        let (state, next) = inner(state).await?;
        self.seen
            .lock()
            .unwrap()
            .push((node_id.to_string(), state.value));
        Ok((state, next))
    }
}

fn two_step_graph() -> StateGraph<CountState> {
    let mut graph = StateGraph::<CountState>::new();
    graph
        .add_node("a", Arc::new(IncrementAgent { name: "a", delta: 2 }))
        .add_node("b", Arc::new(IncrementAgent { name: "b", delta: 3 }))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);
    graph
}

/// **Scenario**: middleware sees every node in order with its post-run state.
#[tokio::test]
async fn with_middleware_wraps_node_run() {
    let middleware = Arc::new(RecordingMiddleware {
        seen: Mutex::new(Vec::new()),
    });
    let compiled = two_step_graph()
        .with_middleware(middleware.clone())
        .compile()
        .unwrap();
    let out = compiled.invoke(CountState::default(), None).await.unwrap();
    assert_eq!(out.value, 5);
    assert_eq!(
        *middleware.seen.lock().unwrap(),
        vec![("a".to_string(), 2), ("b".to_string(), 5)]
    );
}

/// **Scenario**: the transcript file holds one numbered entry per node.
#[tokio::test]
async fn transcript_middleware_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.txt");
    let transcript = Arc::new(TranscriptMiddleware::create(&path).unwrap());
    let compiled = two_step_graph().with_middleware(transcript).compile().unwrap();
    compiled.invoke(CountState::default(), None).await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("[1] a\nCountState {"), "{}", text);
    assert!(text.contains("[2] b\n"), "{}", text);
    assert!(text.contains("value: 5"), "{}", text);
}
