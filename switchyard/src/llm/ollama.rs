//! Ollama native chat client (`POST {base}/api/chat`, non-streaming).
//!
//! Tools are sent in Ollama's function format. [`ChatOllama`] overrides
//! [`LlmClient::invoke_json`] to pass the schema as `format`, which constrains the reply
//! to valid JSON instead of relying on a prompt instruction.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse, LlmUsage};
use crate::message::Message;
use crate::state::ToolCall;
use crate::tools::{parse_tool_arguments, ToolSpec};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    /// Object on the wire; some models emit a JSON string instead.
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: WireMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl From<&Message> for WireMessage {
    fn from(m: &Message) -> Self {
        match m {
            Message::Assistant { content, tool_calls } => WireMessage {
                role: "assistant".into(),
                content: content.clone(),
                tool_calls: tool_calls
                    .iter()
                    .map(|c| WireToolCall {
                        function: WireFunction {
                            name: c.name.clone(),
                            arguments: c.arguments.clone(),
                        },
                    })
                    .collect(),
                tool_name: None,
            },
            Message::Tool { name, content, .. } => WireMessage {
                role: "tool".into(),
                content: content.clone(),
                tool_calls: Vec::new(),
                tool_name: Some(name.clone()),
            },
            other => WireMessage {
                role: other.role().into(),
                content: other.content().to_string(),
                ..Default::default()
            },
        }
    }
}

/// Client for a local or remote Ollama server.
#[derive(Clone)]
pub struct ChatOllama {
    client: Client,
    base_url: String,
    model: String,
    tools: Vec<ToolSpec>,
    temperature: Option<f32>,
    timeout: Duration,
}

impl ChatOllama {
    /// `base_url` without the `/api` suffix, e.g. `http://localhost:11434`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            tools: Vec::new(),
            temperature: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        format: Option<&Value>,
    ) -> Result<LlmResponse, AgentError> {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            stream: false,
            tools: tools.iter().map(ToolSpec::to_function_definition).collect(),
            format,
            options: self
                .temperature
                .map(|t| serde_json::json!({ "temperature": t })),
        };
        debug!(
            trace_id = %trace_id,
            url = %url,
            model = %self.model,
            message_count = messages.len(),
            tools_count = tools.len(),
            json_format = format.is_some(),
            "Ollama chat"
        );
        if let Ok(js) = serde_json::to_string_pretty(&body) {
            trace!(trace_id = %trace_id, request = %js, "Ollama request body");
        }

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("Ollama request failed: {}", e)))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("Ollama response read failed: {}", e)))?;
        trace!(trace_id = %trace_id, status = %status, response = %text, "Ollama response body");
        if !status.is_success() {
            return Err(AgentError::ExecutionFailed(format!(
                "Ollama API error {}: {}",
                status, text
            )));
        }
        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            AgentError::ExecutionFailed(format!("Ollama response is not valid JSON: {}", e))
        })?;

        let tool_calls = parsed
            .message
            .tool_calls
            .into_iter()
            .map(|c| {
                let arguments = match c.function.arguments {
                    Value::String(s) => parse_tool_arguments(&s),
                    Value::Null => serde_json::json!({}),
                    other => other,
                };
                ToolCall::new(c.function.name, arguments)
                    .with_id(format!("call_{}", uuid::Uuid::new_v4().simple()))
            })
            .collect();
        let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
            (None, None) => None,
            (p, c) => {
                let (p, c) = (p.unwrap_or(0), c.unwrap_or(0));
                Some(LlmUsage {
                    prompt_tokens: p,
                    completion_tokens: c,
                    total_tokens: p + c,
                })
            }
        };
        Ok(LlmResponse {
            content: parsed.message.content,
            tool_calls,
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for ChatOllama {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.chat(messages, &self.tools, None).await
    }

    /// Sends `schema` as Ollama's `format`; tools are left out of structured calls.
    async fn invoke_json(
        &self,
        messages: &[Message],
        schema: &Value,
    ) -> Result<LlmResponse, AgentError> {
        self.chat(messages, &[], Some(schema)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_messages_keep_tool_turns() {
        let call = ToolCall::new("get_current_weather", json!({"location": "Munich"}));
        let a = WireMessage::from(&Message::assistant_with_tool_calls("", vec![call]));
        assert_eq!(a.role, "assistant");
        assert_eq!(a.tool_calls[0].function.name, "get_current_weather");
        let t = WireMessage::from(&Message::tool(None, "get_current_weather", "Rainy, 60F"));
        assert_eq!(t.role, "tool");
        assert_eq!(t.tool_name.as_deref(), Some("get_current_weather"));
        let s = serde_json::to_value(WireMessage::from(&Message::system("be brief"))).unwrap();
        assert_eq!(s, json!({"role": "system", "content": "be brief"}));
    }
}
