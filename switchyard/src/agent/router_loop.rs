//! Router loop: agent → (tool) → evaluate → agent or END.
//!
//! The agent asks the model to answer or call a tool. A tool call runs against the shared
//! [`ToolRegistry`]; its output lands in [`RouterState::tool_response`]. The evaluator then
//! asks the model whether that output answers the request and the verdict picks the edge.
//!
//! Termination: the evaluator ends the loop once `agent_call_count` reaches
//! [`RouterLoopOptions::max_agent_calls`], and the graph itself stops at the recursion limit.
//!
//! The LLM passed in should have the registry's tools bound
//! (e.g. `ChatOllama::with_tools(registry.list())`).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph, Next, Node, RunConfig, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::PromptSet;
use crate::state::ToolCall;
use crate::structured::{invoke_structured, Evaluation, Verdict};
use crate::tools::ToolRegistry;

pub const NODE_AGENT: &str = "agent";
pub const NODE_ACTION: &str = "action";
pub const NODE_EVALUATE: &str = "evaluate";

pub const DEFAULT_MAX_AGENT_CALLS: usize = 5;

/// Shared state of one router loop run. Counters only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterState {
    /// The user's original request.
    pub request: String,
    /// Latest tool output, or the agent's text when it answered directly.
    pub tool_response: String,
    /// Latest raw model reply from the agent step.
    pub agent_response: String,
    /// Tool calls from the latest agent reply, consumed by the action step.
    pub pending_tool_calls: Vec<ToolCall>,
    pub agent_call_count: usize,
    pub tool_call_count: usize,
    /// Error text of the last failed tool call; cleared by a successful one.
    pub last_tool_error: Option<String>,
    /// Verdict of the latest evaluation.
    pub verdict: Option<Verdict>,
}

impl RouterState {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterLoopOptions {
    /// Agent calls after which the evaluator ends the loop without asking the model.
    pub max_agent_calls: usize,
    /// Node executions allowed per run.
    pub recursion_limit: usize,
}

impl Default for RouterLoopOptions {
    fn default() -> Self {
        Self {
            max_agent_calls: DEFAULT_MAX_AGENT_CALLS,
            recursion_limit: crate::graph::RunConfig::default().recursion_limit,
        }
    }
}

/// Calls the model with the request and records its reply.
pub struct AgentNode {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
}

impl AgentNode {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptSet>) -> Self {
        Self { llm, prompts }
    }

    fn messages(&self, state: &RouterState) -> Result<Vec<Message>, AgentError> {
        let mut messages = vec![
            Message::system(self.prompts.tool_system.render(&[])?),
            Message::user(self.prompts.agent.render(&[("question", &state.request)])?),
        ];
        if !state.tool_response.is_empty() {
            messages.push(Message::user(format!(
                "A previous attempt produced: {}\nThat did not fully answer the question. Try again.",
                state.tool_response
            )));
        }
        Ok(messages)
    }
}

#[async_trait]
impl Node<RouterState> for AgentNode {
    fn id(&self) -> &str {
        NODE_AGENT
    }

    async fn run(&self, state: RouterState) -> Result<(RouterState, Next), AgentError> {
        let messages = self.messages(&state)?;
        let response = self.llm.invoke(&messages).await?;
        let mut state = state;
        state.agent_call_count += 1;
        debug!(
            agent_call_count = state.agent_call_count,
            tool_calls = response.tool_calls.len(),
            "agent replied"
        );
        if !response.content.trim().is_empty() {
            state.tool_response = response.content.clone();
        }
        state.agent_response = response.content;
        state.pending_tool_calls = response.tool_calls;
        Ok((state, Next::Continue))
    }
}

/// Runs the first pending tool call. Failures are recorded, never raised.
pub struct ActionNode {
    registry: Arc<ToolRegistry>,
}

impl ActionNode {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Node<RouterState> for ActionNode {
    fn id(&self) -> &str {
        NODE_ACTION
    }

    async fn run(&self, state: RouterState) -> Result<(RouterState, Next), AgentError> {
        let mut state = state;
        let calls = std::mem::take(&mut state.pending_tool_calls);
        let Some(call) = calls.first() else {
            return Ok((state, Next::Continue));
        };
        if calls.len() > 1 {
            debug!(ignored = calls.len() - 1, "router loop runs only the first tool call");
        }
        match self.registry.call(call).await {
            Ok(output) => {
                info!(tool = %call.name, output = %output, "tool output");
                state.tool_response = output;
                state.tool_call_count += 1;
                state.last_tool_error = None;
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool call failed; continuing");
                state.last_tool_error = Some(e.to_string());
            }
        }
        Ok((state, Next::Continue))
    }
}

/// Asks the model whether the latest output answers the request.
pub struct EvaluateNode {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
    max_agent_calls: usize,
}

impl EvaluateNode {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptSet>, max_agent_calls: usize) -> Self {
        Self {
            llm,
            prompts,
            max_agent_calls,
        }
    }
}

#[async_trait]
impl Node<RouterState> for EvaluateNode {
    fn id(&self) -> &str {
        NODE_EVALUATE
    }

    async fn run(&self, state: RouterState) -> Result<(RouterState, Next), AgentError> {
        let mut state = state;
        if state.agent_call_count >= self.max_agent_calls {
            info!(
                agent_call_count = state.agent_call_count,
                max = self.max_agent_calls,
                "agent call budget spent; ending"
            );
            state.verdict = Some(Verdict::End);
            return Ok((state, Next::Continue));
        }
        let prompt = self.prompts.evaluation.render(&[
            ("question", &state.request),
            ("response", &state.tool_response),
        ])?;
        let verdict = match invoke_structured::<Evaluation>(self.llm.as_ref(), &[Message::user(prompt)]).await {
            Ok(eval) => Verdict::from(&eval),
            Err(AgentError::StructuredOutput(e)) => {
                warn!(error = %e, "evaluation unparseable; ending");
                Verdict::End
            }
            Err(e) => return Err(e),
        };
        info!(verdict = %verdict, "evaluation");
        state.verdict = Some(verdict);
        Ok((state, Next::Continue))
    }
}

/// Route key after the agent step.
pub fn route_after_agent(state: &RouterState) -> String {
    if state.pending_tool_calls.is_empty() {
        NODE_EVALUATE.to_string()
    } else {
        NODE_ACTION.to_string()
    }
}

/// Route key after the evaluate step. A missing verdict ends the loop.
pub fn route_after_evaluate(state: &RouterState) -> String {
    state.verdict.unwrap_or(Verdict::End).as_label().to_string()
}

/// Builds the uncompiled loop so callers can attach middleware before compiling.
pub fn build_router_loop_graph(
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    prompts: Arc<PromptSet>,
    options: RouterLoopOptions,
) -> StateGraph<RouterState> {
    let mut graph = StateGraph::<RouterState>::new()
        .with_run_config(RunConfig::with_recursion_limit(options.recursion_limit));
    graph
        .add_node(NODE_AGENT, Arc::new(AgentNode::new(llm.clone(), prompts.clone())))
        .add_node(NODE_ACTION, Arc::new(ActionNode::new(registry)))
        .add_node(
            NODE_EVALUATE,
            Arc::new(EvaluateNode::new(llm, prompts, options.max_agent_calls)),
        )
        .add_edge(START, NODE_AGENT)
        .add_edge(NODE_ACTION, NODE_EVALUATE);
    graph.add_conditional_edges(
        NODE_AGENT,
        Arc::new(route_after_agent),
        Some(HashMap::from([
            (NODE_ACTION.to_string(), NODE_ACTION.to_string()),
            (NODE_EVALUATE.to_string(), NODE_EVALUATE.to_string()),
        ])),
    );
    graph.add_conditional_edges(
        NODE_EVALUATE,
        Arc::new(route_after_evaluate),
        Some(HashMap::from([
            (Verdict::Continue.as_label().to_string(), NODE_AGENT.to_string()),
            (Verdict::End.as_label().to_string(), END.to_string()),
        ])),
    );
    graph
}

/// Compiled router loop, ready to run requests.
pub struct RouterLoop {
    graph: CompiledStateGraph<RouterState>,
    options: RouterLoopOptions,
}

impl RouterLoop {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        registry: Arc<ToolRegistry>,
        prompts: Arc<PromptSet>,
        options: RouterLoopOptions,
    ) -> Result<Self, CompilationError> {
        Self::from_graph(build_router_loop_graph(llm, registry, prompts, options), options)
    }

    /// Compiles a graph from [`build_router_loop_graph`], e.g. after adding middleware.
    pub fn from_graph(
        graph: StateGraph<RouterState>,
        options: RouterLoopOptions,
    ) -> Result<Self, CompilationError> {
        Ok(Self {
            graph: graph.compile()?,
            options,
        })
    }

    pub fn graph(&self) -> &CompiledStateGraph<RouterState> {
        &self.graph
    }

    pub async fn run(&self, request: impl Into<String>) -> Result<RouterState, AgentError> {
        let config = RunConfig::with_recursion_limit(self.options.recursion_limit);
        self.graph.invoke(RouterState::new(request), Some(config)).await
    }
}
