//! Dispatch graph: classify the query, then answer with a basic or a tool-bound agent.
//!
//! `decide` asks for a [`RouterDecision`]. Basic queries get a direct answer. Specialized
//! queries go to an LLM bound to the tool for their [`TaskKind`]; a task without a binding
//! is answered by the basic LLM instead.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AgentError;
use crate::graph::{Next, Node, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::PromptSet;
use crate::structured::{invoke_structured, AgentKind, RouterDecision, TaskKind};
use crate::tools::{Tool, ToolRegistry, ToolSpec, TOOL_GET_CURRENT_WEATHER, TOOL_GET_SYSTEM_TIME};

pub const NODE_DECIDE: &str = "decide";
pub const NODE_BASIC: &str = "basic_agent";
pub const NODE_SPECIALIZED: &str = "specialized_agent";

/// Sample queries for the dispatch demo.
pub const DEFAULT_QUERIES: [&str; 4] = [
    "What's the weather like in Paris right now?",
    "What time is it in Tokyo?",
    "Explain in one sentence what a binary search does.",
    "Give me a fun fact about octopuses.",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchState {
    pub query: String,
    pub decision: Option<RouterDecision>,
    /// `"basic"` or `"specialized"` once an agent has answered.
    pub agent_used: Option<String>,
    /// Tools the specialized agent ran, in order.
    pub tool_used: Vec<String>,
    pub response: String,
}

impl DispatchState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// Classifies the query. Unparseable output falls back to basic/generic.
pub struct DecideNode {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
}

impl DecideNode {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptSet>) -> Self {
        Self { llm, prompts }
    }
}

#[async_trait]
impl Node<DispatchState> for DecideNode {
    fn id(&self) -> &str {
        NODE_DECIDE
    }

    async fn run(&self, state: DispatchState) -> Result<(DispatchState, Next), AgentError> {
        let prompt = self.prompts.routing.render(&[("query", &state.query)])?;
        let decision =
            match invoke_structured::<RouterDecision>(self.llm.as_ref(), &[Message::user(prompt)]).await {
                Ok(d) => d,
                Err(AgentError::StructuredOutput(e)) => {
                    warn!(error = %e, "routing decision unparseable; using basic agent");
                    RouterDecision::default()
                }
                Err(e) => return Err(e),
            };
        info!(agent = ?decision.agent_type, task = ?decision.task_type, "routing decision");
        let mut state = state;
        state.decision = Some(decision);
        Ok((state, Next::Continue))
    }
}

async fn basic_answer(
    llm: &dyn LlmClient,
    prompts: &PromptSet,
    query: &str,
) -> Result<String, AgentError> {
    let prompt = prompts.basic_answer.render(&[("query", query)])?;
    Ok(llm.invoke(&[Message::user(prompt)]).await?.content)
}

/// Answers directly, without tools.
pub struct BasicAnswerNode {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
}

impl BasicAnswerNode {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptSet>) -> Self {
        Self { llm, prompts }
    }
}

#[async_trait]
impl Node<DispatchState> for BasicAnswerNode {
    fn id(&self) -> &str {
        NODE_BASIC
    }

    async fn run(&self, state: DispatchState) -> Result<(DispatchState, Next), AgentError> {
        let mut state = state;
        state.response = basic_answer(self.llm.as_ref(), &self.prompts, &state.query).await?;
        state.agent_used = Some("basic".into());
        Ok((state, Next::Continue))
    }
}

/// LLM with one tool bound, used for one task kind.
#[derive(Clone)]
pub struct TaskBinding {
    pub tool: String,
    pub llm: Arc<dyn LlmClient>,
}

/// Answers with the tool bound for the decided task.
pub struct SpecializedNode {
    basic_llm: Arc<dyn LlmClient>,
    bindings: HashMap<TaskKind, TaskBinding>,
    registry: Arc<ToolRegistry>,
    prompts: Arc<PromptSet>,
}

impl SpecializedNode {
    pub fn new(
        basic_llm: Arc<dyn LlmClient>,
        registry: Arc<ToolRegistry>,
        prompts: Arc<PromptSet>,
    ) -> Self {
        Self {
            basic_llm,
            bindings: HashMap::new(),
            registry,
            prompts,
        }
    }

    /// Routes `task` to `llm`, which should have `tool` bound.
    pub fn bind(mut self, task: TaskKind, tool: impl Into<String>, llm: Arc<dyn LlmClient>) -> Self {
        self.bindings.insert(
            task,
            TaskBinding {
                tool: tool.into(),
                llm,
            },
        );
        self
    }
}

#[async_trait]
impl Node<DispatchState> for SpecializedNode {
    fn id(&self) -> &str {
        NODE_SPECIALIZED
    }

    async fn run(&self, state: DispatchState) -> Result<(DispatchState, Next), AgentError> {
        let mut state = state;
        let task = state.decision.map(|d| d.task_type).unwrap_or_default();
        let Some(binding) = self.bindings.get(&task) else {
            info!(task = ?task, "no tool bound for task; answering with basic agent");
            state.response = basic_answer(self.basic_llm.as_ref(), &self.prompts, &state.query).await?;
            state.agent_used = Some("basic".into());
            return Ok((state, Next::Continue));
        };

        let prompt = self.prompts.specialized.render(&[("query", &state.query)])?;
        let response = binding.llm.invoke(&[Message::user(prompt)]).await?;
        let mut text = response.content;
        for result in self.registry.execute_all(&response.tool_calls).await {
            if result.name != binding.tool {
                warn!(expected = %binding.tool, called = %result.name, "model called an unbound tool");
            }
            text.push_str(&format!("\nTool Result ({}): {}", result.name, result.content));
            state.tool_used.push(result.name);
        }
        state.response = text;
        state.agent_used = Some("specialized".into());
        Ok((state, Next::Continue))
    }
}

/// Route key after `decide`.
pub fn route_by_agent(state: &DispatchState) -> String {
    match state.decision.map(|d| d.agent_type).unwrap_or_default() {
        AgentKind::Basic => NODE_BASIC.to_string(),
        AgentKind::Specialized => NODE_SPECIALIZED.to_string(),
    }
}

/// Default bindings: weather → `get_current_weather`, system time → `get_system_time`.
///
/// `bind_llm` builds an LLM with the given tools bound; `llm` is the unbound one used for
/// deciding and basic answers.
pub fn build_dispatch_graph<F>(
    llm: Arc<dyn LlmClient>,
    bind_llm: F,
    registry: Arc<ToolRegistry>,
    prompts: Arc<PromptSet>,
) -> StateGraph<DispatchState>
where
    F: Fn(Vec<ToolSpec>) -> Arc<dyn LlmClient>,
{
    let mut specialized = SpecializedNode::new(llm.clone(), registry.clone(), prompts.clone());
    for (task, tool) in [
        (TaskKind::Weather, TOOL_GET_CURRENT_WEATHER),
        (TaskKind::SystemTime, TOOL_GET_SYSTEM_TIME),
    ] {
        match registry.get(tool) {
            Some(t) => specialized = specialized.bind(task, tool, bind_llm(vec![t.spec()])),
            None => warn!(tool, "tool missing from registry; task falls back to basic agent"),
        }
    }

    let mut graph = StateGraph::<DispatchState>::new();
    graph
        .add_node(NODE_DECIDE, Arc::new(DecideNode::new(llm.clone(), prompts.clone())))
        .add_node(NODE_BASIC, Arc::new(BasicAnswerNode::new(llm, prompts)))
        .add_node(NODE_SPECIALIZED, Arc::new(specialized))
        .add_edge(START, NODE_DECIDE)
        .add_edge(NODE_BASIC, END)
        .add_edge(NODE_SPECIALIZED, END);
    graph.add_conditional_edges(NODE_DECIDE, Arc::new(route_by_agent), None);
    graph
}
