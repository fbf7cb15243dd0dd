//! Introductory graphs: a text chain, a two-way branch and a joke loop.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AgentError;
use crate::graph::{FnNode, NameNode, Next, Node, RunConfig, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::PromptSet;
use crate::traits::Agent;

/// Suffix appended by every node of the default chain.
pub const DEFAULT_CHAIN_SUFFIX: &str = " Amazing_";
pub const DEFAULT_CHAIN_INPUT: &str = "AI is";
pub const DEFAULT_JOKE_TOPIC: &str = "nature";

/// Appends a fixed suffix to the text state.
pub struct AppendText {
    name: String,
    suffix: String,
}

impl AppendText {
    pub fn new(name: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suffix: suffix.into(),
        }
    }
}

#[async_trait]
impl Agent for AppendText {
    fn name(&self) -> &str {
        &self.name
    }

    type State = String;

    async fn run(&self, state: String) -> Result<String, AgentError> {
        Ok(state + &self.suffix)
    }
}

/// `node1 → node2 → … → END`, one [`AppendText`] per suffix.
pub fn build_chain_graph<I, T>(suffixes: I) -> StateGraph<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut graph = StateGraph::<String>::new();
    let mut previous = START.to_string();
    for (i, suffix) in suffixes.into_iter().enumerate() {
        let id = format!("node{}", i + 1);
        graph
            .add_node(id.clone(), Arc::new(AppendText::new(id.clone(), suffix)))
            .add_edge(previous, id.clone());
        previous = id;
    }
    graph.add_edge(previous, END);
    graph
}

fn append(id: &str, suffix: &'static str) -> Arc<dyn Node<String>> {
    Arc::new(FnNode::new(id, move |s: String| Ok(s + suffix)))
}

/// `entry` routes input `"human"` to `human`, anything else to `ai`; both join at `finish`.
pub fn build_branch_graph() -> StateGraph<String> {
    let mut graph = StateGraph::<String>::new();
    graph
        .add_node("entry", Arc::new(NameNode::new("entry")))
        .add_node("human", append("human", " is not Amazing"))
        .add_node("ai", append("ai", " is Amazing"))
        .add_node("finish", append("finish", " always!"))
        .add_edge(START, "entry")
        .add_edge("human", "finish")
        .add_edge("ai", "finish")
        .add_edge("finish", END);
    graph.add_conditional_edges(
        "entry",
        Arc::new(|s: &String| {
            if s == "human" {
                "human_node".to_string()
            } else {
                "ai_node".to_string()
            }
        }),
        Some(HashMap::from([
            ("human_node".to_string(), "human".to_string()),
            ("ai_node".to_string(), "ai".to_string()),
        ])),
    );
    graph
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JokeState {
    pub topic: String,
    pub jokes: Vec<String>,
    pub joke_count: usize,
}

impl JokeState {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }
}

/// Asks for one more joke, passing the earlier ones so they are not repeated.
pub struct JokeNode {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
}

impl JokeNode {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptSet>) -> Self {
        Self { llm, prompts }
    }
}

#[async_trait]
impl Node<JokeState> for JokeNode {
    fn id(&self) -> &str {
        "tell_joke"
    }

    async fn run(&self, state: JokeState) -> Result<(JokeState, Next), AgentError> {
        let previous = if state.jokes.is_empty() {
            "(none yet)".to_string()
        } else {
            state.jokes.join("\n")
        };
        let prompt = self
            .prompts
            .joke
            .render(&[("topic", &state.topic), ("previous", &previous)])?;
        let reply = self.llm.invoke(&[Message::user(prompt)]).await?;
        let mut state = state;
        state.joke_count += 1;
        info!(joke_count = state.joke_count, joke = %reply.content, "joke");
        state.jokes.push(reply.content);
        Ok((state, Next::Continue))
    }
}

/// `agent` ⇄ `tell_joke` until `max_jokes` were told.
///
/// The recursion limit is sized to fit `max_jokes` rounds.
pub fn build_joke_loop(
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
    max_jokes: usize,
) -> StateGraph<JokeState> {
    let mut graph = StateGraph::<JokeState>::new()
        .with_run_config(RunConfig::with_recursion_limit(2 * max_jokes + 1));
    graph
        .add_node("agent", Arc::new(NameNode::new("agent")))
        .add_node("tell_joke", Arc::new(JokeNode::new(llm, prompts)))
        .add_edge(START, "agent")
        .add_edge("tell_joke", "agent");
    graph.add_conditional_edges(
        "agent",
        Arc::new(move |s: &JokeState| {
            if s.joke_count < max_jokes {
                "tell_joke_condition".to_string()
            } else {
                "end_condition".to_string()
            }
        }),
        Some(HashMap::from([
            ("tell_joke_condition".to_string(), "tell_joke".to_string()),
            ("end_condition".to_string(), END.to_string()),
        ])),
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;

    #[tokio::test]
    async fn chain_appends_every_suffix() {
        let graph = build_chain_graph([DEFAULT_CHAIN_SUFFIX; 4]).compile().unwrap();
        let out = graph.invoke(DEFAULT_CHAIN_INPUT.to_string(), None).await.unwrap();
        assert_eq!(out, "AI is Amazing_ Amazing_ Amazing_ Amazing_");
        assert_eq!(graph.node_ids().len(), 4);
    }

    #[tokio::test]
    async fn branch_routes_on_input() {
        let graph = build_branch_graph().compile().unwrap();
        assert_eq!(
            graph.invoke("human".into(), None).await.unwrap(),
            "human is not Amazing always!"
        );
        assert_eq!(
            graph.invoke("robot".into(), None).await.unwrap(),
            "robot is Amazing always!"
        );
    }

    /// **Scenario**: the loop tells exactly `max_jokes` jokes and fits its own recursion limit.
    #[tokio::test]
    async fn joke_loop_stops_at_max() {
        let llm = Arc::new(MockLlm::texts(["j1", "j2", "j3"]));
        let graph = build_joke_loop(llm.clone(), Arc::new(PromptSet::default()), 3)
            .compile()
            .unwrap();
        let out = graph.invoke(JokeState::new("cats"), None).await.unwrap();
        assert_eq!(out.joke_count, 3);
        assert_eq!(out.jokes, vec!["j1", "j2", "j3"]);
        let requests = llm.requests();
        assert!(requests[2][0].content().contains("j1\nj2"));
    }
}
