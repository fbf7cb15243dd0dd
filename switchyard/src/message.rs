//! Chat message types passed to `LlmClient::invoke`.
//!
//! Roles: System (usually first), User, Assistant (optionally carrying tool calls)
//! and Tool (the result of one tool call, answered back to the model).

use serde::{Deserialize, Serialize};

use crate::state::ToolCall;

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// System prompt; typically placed first in the message list.
    System(String),
    /// User input.
    User(String),
    /// Model reply; `tool_calls` is empty for a plain text answer.
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Output of a tool call, linked back by `call_id` when the model supplied one.
    Tool {
        call_id: Option<String>,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    /// Assistant text without tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool(call_id: Option<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            call_id,
            name: name.into(),
            content: content.into(),
        }
    }

    /// Text content regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Self::System(s) | Self::User(s) => s,
            Self::Assistant { content, .. } | Self::Tool { content, .. } => content,
        }
    }

    /// Role name as used by chat APIs.
    pub fn role(&self) -> &'static str {
        match self {
            Self::System(_) => "system",
            Self::User(_) => "user",
            Self::Assistant { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }

    /// Tool calls carried by an assistant message; empty for every other role.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: constructors produce the right variant, role and content.
    #[test]
    fn constructors_roles_and_content() {
        let cases = [
            (Message::system("s"), "system", "s"),
            (Message::user("u"), "user", "u"),
            (Message::assistant("a"), "assistant", "a"),
            (Message::tool(Some("c1".into()), "get_weather", "Sunny, 78F"), "tool", "Sunny, 78F"),
        ];
        for (msg, role, content) in cases {
            assert_eq!(msg.role(), role);
            assert_eq!(msg.content(), content);
        }
    }

    /// **Scenario**: only assistant messages expose tool calls.
    #[test]
    fn tool_calls_only_on_assistant() {
        let call = ToolCall::new("get_weather", json!({"location": "Tokyo"}));
        let msg = Message::assistant_with_tool_calls("", vec![call.clone()]);
        assert_eq!(msg.tool_calls(), &[call]);
        assert!(Message::user("hi").tool_calls().is_empty());
    }

    /// **Scenario**: a plain assistant message serializes without a tool_calls field.
    #[test]
    fn plain_assistant_omits_empty_tool_calls() {
        let v = serde_json::to_value(Message::assistant("done")).unwrap();
        assert_eq!(v, json!({"Assistant": {"content": "done"}}));
        let back: Message = serde_json::from_value(v).unwrap();
        assert_eq!(back, Message::assistant("done"));
    }
}
