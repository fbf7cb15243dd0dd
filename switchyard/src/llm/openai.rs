//! OpenAI-compatible Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Works against OpenAI and any server exposing `/v1/chat/completions` (Ollama, LM Studio,
//! Groq). Tools set with [`ChatOpenAI::with_tools`] are sent as function definitions; the
//! response's `tool_calls` come back as [`ToolCall`]s.
//!
//! Tool turns in the history (assistant tool calls and tool results) are sent as plain text
//! so any compatible server accepts the conversation.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::error::AgentError;
use crate::llm::{json_instruction, LlmClient, LlmResponse, LlmUsage};
use crate::message::Message;
use crate::state::ToolCall;
use crate::tools::{parse_tool_arguments, ToolSpec};

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCalls, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage, ChatCompletionTool,
        ChatCompletionToolChoiceOption, ChatCompletionTools, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, FunctionObject, ToolChoiceOptions,
    },
    Client,
};

use super::ToolChoiceMode;

/// OpenAI Chat Completions client.
///
/// `new(model)` reads `OPENAI_API_KEY` and `OPENAI_BASE_URL` from the environment;
/// [`ChatOpenAI::with_base_url`] points it at another compatible server.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    base_url: Option<String>,
    tools: Option<Vec<ToolSpec>>,
    temperature: Option<f32>,
    tool_choice: Option<ToolChoiceMode>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::new(), model)
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            base_url: None,
            tools: None,
            temperature: None,
            tool_choice: None,
        }
    }

    /// Client for a compatible server at `base_url` (including `/v1`).
    ///
    /// Local servers ignore the key, so a placeholder is sent when none is given.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        let config = OpenAIConfig::new()
            .with_api_base(base_url.clone())
            .with_api_key(api_key.unwrap_or_else(|| "switchyard".to_string()));
        let mut client = Self::with_config(config, model);
        client.base_url = Some(base_url);
        client
    }

    /// Set tools for this completion (enables tool_calls in response).
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set tool choice mode (auto, none, required). Overrides API default when tools are present.
    pub fn with_tool_choice(mut self, mode: ToolChoiceMode) -> Self {
        self.tool_choice = Some(mode);
        self
    }

    /// Chat completions URL, for logging only.
    fn chat_completions_url(&self) -> String {
        let base = self.base_url.clone().unwrap_or_else(|| {
            std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("OPENAI_API_BASE"))
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
        });
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    /// Convert our `Message` list to OpenAI request messages.
    fn messages_to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(s) => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(s.as_str()),
                ),
                Message::User(s) => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(s.as_str()),
                ),
                Message::Assistant { content, tool_calls } => {
                    let text = assistant_text(content, tool_calls);
                    ChatCompletionRequestMessage::Assistant(text.as_str().into())
                }
                Message::Tool { name, content, .. } => {
                    let text = format!("Result of tool {}: {}", name, content);
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                        text.as_str(),
                    ))
                }
            })
            .collect()
    }
}

/// Assistant text with any tool calls it made spelled out after the content.
fn assistant_text(content: &str, tool_calls: &[ToolCall]) -> String {
    let mut text = content.to_string();
    for call in tool_calls {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&format!("[called tool {} with {}]", call.name, call.arguments));
    }
    text
}

/// Name for a `json_schema` response format: the schema's `title`, else `response`.
fn schema_name(schema: &Value) -> String {
    schema
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(|t| t.replace(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-', "_"))
        .unwrap_or_else(|| "response".to_string())
}

impl ChatOpenAI {
    /// Request for `messages`; bound tools and tool choice are only sent when `with_tools`.
    fn build_request(
        &self,
        messages: &[Message],
        with_tools: bool,
    ) -> Result<CreateChatCompletionRequest, AgentError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::messages_to_request(messages));

        if let Some(tools) = self.tools.as_ref().filter(|_| with_tools) {
            let chat_tools: Vec<ChatCompletionTools> = tools
                .iter()
                .map(|t| {
                    ChatCompletionTools::Function(ChatCompletionTool {
                        function: FunctionObject {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: Some(t.input_schema.clone()),
                            ..Default::default()
                        },
                    })
                })
                .collect();
            args.tools(chat_tools);

            if let Some(mode) = self.tool_choice {
                let opt = match mode {
                    ToolChoiceMode::Auto => ToolChoiceOptions::Auto,
                    ToolChoiceMode::None => ToolChoiceOptions::None,
                    ToolChoiceMode::Required => ToolChoiceOptions::Required,
                };
                args.tool_choice(ChatCompletionToolChoiceOption::Mode(opt));
            }
        }

        if let Some(t) = self.temperature {
            args.temperature(t);
        }

        args.build().map_err(|e| {
            AgentError::ExecutionFailed(format!("OpenAI request build failed: {}", e))
        })
    }

    async fn send(
        &self,
        request: CreateChatCompletionRequest,
        message_count: usize,
    ) -> Result<LlmResponse, AgentError> {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let url = self.chat_completions_url();
        debug!(
            trace_id = %trace_id,
            url = %url,
            model = %self.model,
            message_count = message_count,
            tools_count = request.tools.as_ref().map_or(0, |t| t.len()),
            temperature = ?self.temperature,
            json_schema = request.response_format.is_some(),
            "OpenAI chat create"
        );
        if let Ok(js) = serde_json::to_string_pretty(&request) {
            trace!(trace_id = %trace_id, url = %url, request = %js, "OpenAI request body");
        }

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("OpenAI API error: {}", e)))?;

        if let Ok(js) = serde_json::to_string_pretty(&response) {
            trace!(trace_id = %trace_id, url = %url, response = %js, "OpenAI response body");
        }

        let choice =
            response.choices.into_iter().next().ok_or_else(|| {
                AgentError::ExecutionFailed("OpenAI returned no choices".to_string())
            })?;

        let msg = choice.message;
        let content = msg.content.unwrap_or_default();
        let tool_calls: Vec<ToolCall> = msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tc| {
                if let ChatCompletionMessageToolCalls::Function(f) = tc {
                    Some(
                        ToolCall::new(f.function.name, parse_tool_arguments(&f.function.arguments))
                            .with_id(f.id),
                    )
                } else {
                    None
                }
            })
            .collect();

        let usage = response.usage.map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        Ok(LlmResponse {
            content,
            tool_calls,
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        let request = self.build_request(messages, true)?;
        self.send(request, messages.len()).await
    }

    /// Judging turn: no tools, and a `json_schema` response format next to the JSON
    /// instruction for servers that ignore `response_format`.
    async fn invoke_json(
        &self,
        messages: &[Message],
        schema: &Value,
    ) -> Result<LlmResponse, AgentError> {
        let mut with_instruction = messages.to_vec();
        with_instruction.push(Message::user(json_instruction(schema)));
        let request = self.build_request(&with_instruction, false)?;

        let mut body = serde_json::to_value(&request).map_err(|e| {
            AgentError::ExecutionFailed(format!("OpenAI request encode failed: {}", e))
        })?;
        body["response_format"] = json!({
            "type": "json_schema",
            "json_schema": {"name": schema_name(schema), "schema": schema, "strict": false}
        });
        let request: CreateChatCompletionRequest = serde_json::from_value(body).map_err(|e| {
            AgentError::ExecutionFailed(format!("OpenAI request build failed: {}", e))
        })?;
        self.send(request, with_instruction.len()).await
    }
}
