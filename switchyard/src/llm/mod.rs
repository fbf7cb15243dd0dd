//! LLM client abstraction used by every agent node.
//!
//! Nodes depend on [`LlmClient`] only. [`ChatOpenAI`] speaks OpenAI-compatible chat
//! completions (OpenAI, Ollama `/v1`, LM Studio, Groq), [`ChatOllama`] speaks Ollama's native
//! `/api/chat`, and [`MockLlm`] replays scripted responses in tests.

mod mock;
mod ollama;
mod openai;

pub use mock::MockLlm;
pub use ollama::ChatOllama;
pub use openai::ChatOpenAI;

use std::sync::Arc;

use async_trait::async_trait;
use env_config::{Backend, LlmSettings};
use serde_json::Value;

use crate::error::AgentError;
use crate::message::Message;
use crate::state::ToolCall;
use crate::tools::ToolSpec;

/// Tool choice mode for chat completions: when tools are present, controls whether
/// the model may choose (auto), must not use (none), or must use (required).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    /// Model can pick between message or tool calls. Default when tools are present.
    #[default]
    Auto,
    /// Model will not call any tool.
    None,
    /// Model must call one or more tools.
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            _ => Err(format!(
                "unknown tool_choice: {} (use auto, none, or required)",
                s
            )),
        }
    }
}

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from an LLM completion: assistant text and optional tool calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResponse {
    /// Assistant message content (plain text, possibly empty when only tools were called).
    pub content: String,
    /// Tool calls from this turn; empty means a plain text answer.
    pub tool_calls: Vec<ToolCall>,
    /// Token usage for this call, when the backend reports it.
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            usage: None,
        }
    }

    /// The response as an assistant message for the conversation history.
    pub fn to_message(&self) -> Message {
        Message::assistant_with_tool_calls(self.content.clone(), self.tool_calls.clone())
    }
}

/// Instruction appended by the default [`LlmClient::invoke_json`].
pub fn json_instruction(schema: &Value) -> String {
    let schema = serde_json::to_string(schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "Respond with a single JSON object that matches this JSON schema and nothing else:\n{}",
        schema
    )
}

/// LLM client: given messages, returns assistant text and optional tool calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one turn: read messages, return assistant content and optional tool_calls.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;

    /// One turn whose reply should be a JSON object matching `schema`.
    ///
    /// Default appends [`json_instruction`] as a final user message and calls `invoke`.
    /// Backends with native constrained output override this.
    async fn invoke_json(
        &self,
        messages: &[Message],
        schema: &Value,
    ) -> Result<LlmResponse, AgentError> {
        let mut with_instruction = messages.to_vec();
        with_instruction.push(Message::user(json_instruction(schema)));
        self.invoke(&with_instruction).await
    }
}

/// Builds the client for `settings.backend` with `tools` bound.
pub fn build_client(settings: &LlmSettings, tools: Vec<ToolSpec>) -> Arc<dyn LlmClient> {
    let base_url = settings.resolved_base_url();
    match settings.backend {
        Backend::Ollama => {
            let mut client = ChatOllama::new(base_url, settings.model.clone()).with_tools(tools);
            if let Some(t) = settings.temperature {
                client = client.with_temperature(t);
            }
            Arc::new(client)
        }
        Backend::OpenAi => {
            let mut client =
                ChatOpenAI::with_base_url(base_url, settings.api_key.clone(), settings.model.clone());
            if !tools.is_empty() {
                client = client.with_tools(tools);
            }
            if let Some(t) = settings.temperature {
                client = client.with_temperature(t);
            }
            Arc::new(client)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoLastLlm;

    #[async_trait]
    impl LlmClient for EchoLastLlm {
        async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
            Ok(LlmResponse::text(
                messages.last().map(|m| m.content().to_string()).unwrap_or_default(),
            ))
        }
    }

    #[test]
    fn tool_choice_mode_from_str_parses_known_values() {
        assert_eq!("auto".parse::<ToolChoiceMode>().unwrap(), ToolChoiceMode::Auto);
        assert_eq!("None".parse::<ToolChoiceMode>().unwrap(), ToolChoiceMode::None);
        assert_eq!(
            "required".parse::<ToolChoiceMode>().unwrap(),
            ToolChoiceMode::Required
        );
    }

    #[test]
    fn tool_choice_mode_from_str_rejects_unknown_value() {
        let err = "unexpected".parse::<ToolChoiceMode>().unwrap_err();
        assert!(err.contains("unknown tool_choice"));
    }

    /// **Scenario**: default invoke_json appends the schema instruction as the last message.
    #[tokio::test]
    async fn default_invoke_json_appends_instruction() {
        let schema = json!({"type": "object", "properties": {"result": {"type": "boolean"}}});
        let resp = EchoLastLlm
            .invoke_json(&[Message::user("is it sunny?")], &schema)
            .await
            .unwrap();
        assert!(resp.content.starts_with("Respond with a single JSON object"));
        assert!(resp.content.contains("\"result\""));
    }

    #[test]
    fn response_converts_to_assistant_message() {
        let call = ToolCall::new("get_system_time", json!({}));
        let msg = LlmResponse::with_tool_calls("", vec![call.clone()]).to_message();
        assert_eq!(msg.tool_calls(), &[call]);
    }
}
