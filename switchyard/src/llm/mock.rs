//! Mock LLM for tests and offline demos.
//!
//! Replays a script of responses in order; once the script runs out the last response
//! repeats. Every request is recorded so tests can assert on the prompts a node sent.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;
use crate::state::ToolCall;

/// Scripted LLM. An empty script answers with empty text.
#[derive(Debug, Default)]
pub struct MockLlm {
    script: Vec<LlmResponse>,
    cursor: AtomicUsize,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    pub fn new(script: Vec<LlmResponse>) -> Self {
        Self {
            script,
            cursor: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `content` and no tool calls.
    pub fn with_no_tool_calls(content: impl Into<String>) -> Self {
        Self::new(vec![LlmResponse::text(content)])
    }

    /// Script of plain text replies.
    pub fn texts<I, T>(replies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(replies.into_iter().map(LlmResponse::text).collect())
    }

    /// First call asks for the weather in `location`, later calls answer `final_text`.
    pub fn weather_then_text(location: &str, final_text: impl Into<String>) -> Self {
        let call = ToolCall::new("get_current_weather", json!({ "location": location }))
            .with_id("call-1");
        Self::new(vec![
            LlmResponse::with_tool_calls("", vec![call]),
            LlmResponse::text(final_text),
        ])
    }

    /// Appends a response to the script (builder).
    pub fn then(mut self, response: LlmResponse) -> Self {
        self.script.push(response);
        self
    }

    /// Number of `invoke` calls so far.
    pub fn call_count(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Copies of every message list received, oldest first.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, messages: &[Message]) {
        match self.requests.lock() {
            Ok(mut guard) => guard.push(messages.to_vec()),
            Err(poisoned) => poisoned.into_inner().push(messages.to_vec()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.record(messages);
        let n = self.cursor.fetch_add(1, Ordering::SeqCst);
        let response = self
            .script
            .get(n)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or_default();
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_repeats_last() {
        let llm = MockLlm::texts(["one", "two"]);
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(llm.invoke(&[]).await.unwrap().content);
        }
        assert_eq!(seen, vec!["one", "two", "two"]);
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn records_requests() {
        let llm = MockLlm::weather_then_text("Munich", "Sunny");
        let first = llm.invoke(&[Message::user("weather?")]).await.unwrap();
        assert_eq!(first.tool_calls[0].arg_str("location"), Some("Munich"));
        let second = llm.invoke(&[Message::user("again")]).await.unwrap();
        assert!(second.tool_calls.is_empty());
        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1][0], Message::user("again"));
    }

    #[tokio::test]
    async fn empty_script_answers_empty_text() {
        let resp = MockLlm::default().invoke(&[]).await.unwrap();
        assert_eq!(resp, LlmResponse::default());
    }
}
