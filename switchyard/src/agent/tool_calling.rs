//! Message-list tool loop: agent ⇄ action until the model answers without tool calls.
//!
//! Unlike the router loop, the whole conversation is kept in state and every tool result
//! goes back to the model as a `Tool` message.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AgentError;
use crate::graph::{Next, Node, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tools::ToolRegistry;

pub const NODE_CALL_MODEL: &str = "agent";
pub const NODE_CALL_TOOLS: &str = "action";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatState {
    pub messages: Vec<Message>,
    /// Tool executions so far.
    pub api_call_count: usize,
}

impl ChatState {
    pub fn new(system: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(question)],
            api_call_count: 0,
        }
    }

    /// Text of the last assistant message, if any.
    pub fn final_answer(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }
}

/// Sends the conversation to the model and appends its reply.
pub struct CallModelNode {
    llm: Arc<dyn LlmClient>,
}

impl CallModelNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node<ChatState> for CallModelNode {
    fn id(&self) -> &str {
        NODE_CALL_MODEL
    }

    async fn run(&self, state: ChatState) -> Result<(ChatState, Next), AgentError> {
        let response = self.llm.invoke(&state.messages).await?;
        let mut state = state;
        state.messages.push(response.to_message());
        Ok((state, Next::Continue))
    }
}

/// Runs every tool call of the last assistant message and appends the results.
pub struct CallToolsNode {
    registry: Arc<ToolRegistry>,
}

impl CallToolsNode {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Node<ChatState> for CallToolsNode {
    fn id(&self) -> &str {
        NODE_CALL_TOOLS
    }

    async fn run(&self, state: ChatState) -> Result<(ChatState, Next), AgentError> {
        let calls = state
            .messages
            .last()
            .map(|m| m.tool_calls().to_vec())
            .unwrap_or_default();
        let results = self.registry.execute_all(&calls).await;
        let mut state = state;
        for result in results {
            debug!(tool = %result.name, is_error = result.is_error, "tool result appended");
            state.api_call_count += 1;
            state
                .messages
                .push(Message::tool(result.call_id, result.name, result.content));
        }
        Ok((state, Next::Continue))
    }
}

/// `action` while the last assistant message asks for tools, else END.
pub fn should_continue(state: &ChatState) -> String {
    match state.messages.last() {
        Some(m) if !m.tool_calls().is_empty() => NODE_CALL_TOOLS.to_string(),
        _ => END.to_string(),
    }
}

/// The LLM should have the registry's tools bound.
pub fn build_tool_calling_graph(
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
) -> StateGraph<ChatState> {
    let mut graph = StateGraph::<ChatState>::new();
    graph
        .add_node(NODE_CALL_MODEL, Arc::new(CallModelNode::new(llm)))
        .add_node(NODE_CALL_TOOLS, Arc::new(CallToolsNode::new(registry)))
        .add_edge(START, NODE_CALL_MODEL)
        .add_edge(NODE_CALL_TOOLS, NODE_CALL_MODEL);
    graph.add_conditional_edges(
        NODE_CALL_MODEL,
        Arc::new(should_continue),
        Some(HashMap::from([
            (NODE_CALL_TOOLS.to_string(), NODE_CALL_TOOLS.to_string()),
            (END.to_string(), END.to_string()),
        ])),
    );
    graph
}
