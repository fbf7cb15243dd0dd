//! Function-calling suite against a scripted model: tool calls, plain answers and failures.

mod init_logging;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use switchyard::tools::WEATHER_OUTCOMES;
use switchyard::{
    builtin_registry, run_suite, AgentError, LlmClient, LlmResponse, Message, SuiteReport, ToolCall,
};

/// Calls the weather tool, then fails once, then answers in text.
struct ScriptedModel {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmClient for ScriptedModel {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        match self.calls.fetch_add(1, Ordering::SeqCst) {
            0 => {
                let location = messages[0].content().rsplit(" in ").next().unwrap_or_default();
                let location = location.trim_end_matches('?').to_string();
                Ok(LlmResponse::with_tool_calls(
                    "",
                    vec![ToolCall::new("get_current_weather", json!({ "location": location }))
                        .with_id("call-1")],
                ))
            }
            1 => Err(AgentError::ExecutionFailed("connection reset".into())),
            _ => Ok(LlmResponse::text("I cannot check the weather.")),
        }
    }
}

fn sentences() -> Vec<String> {
    vec![
        "What is the weather today in Boston, MA?".to_string(),
        "How's the weather in Austin, TX today?".to_string(),
        "Is it going to rain tomorrow in Denver, CO?".to_string(),
    ]
}

/// **Scenario**: a failing case is recorded and the remaining sentences still run.
#[tokio::test]
async fn errors_are_recorded_and_do_not_abort() {
    let llm = ScriptedModel {
        calls: AtomicUsize::new(0),
    };
    let report = run_suite(&llm, &builtin_registry(), &sentences()).await;

    assert_eq!(report.total, 3);
    assert_eq!(report.cases.len(), 3);
    assert_eq!(report.with_function_call, 1);
    assert!((report.success_rate - 100.0 / 3.0).abs() < 1e-9, "{}", report.success_rate);

    let called = &report.cases[0];
    assert!(called.called_tool());
    assert!(called.error.is_none());
    assert_eq!(called.tool_calls[0].arg_str("location"), Some("Boston, MA"));
    assert_eq!(called.tool_results.len(), 1);
    assert_eq!(called.tool_results[0].call_id.as_deref(), Some("call-1"));
    assert!(!called.tool_results[0].is_error);
    assert!(WEATHER_OUTCOMES.contains(&called.tool_results[0].content.as_str()));

    let failed = &report.cases[1];
    assert!(!failed.called_tool());
    assert!(failed.error.as_deref().unwrap_or_default().contains("connection reset"));

    let answered = &report.cases[2];
    assert!(answered.error.is_none());
    assert!(answered.tool_results.is_empty());
    assert_eq!(answered.content, "I cannot check the weather.");
    assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
}

/// **Scenario**: the written report reads back with the same counts and cases.
#[tokio::test]
async fn report_round_trips_through_json_file() {
    let llm = ScriptedModel {
        calls: AtomicUsize::new(0),
    };
    let report = run_suite(&llm, &builtin_registry(), &sentences()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    report.write_json(&path).unwrap();

    let read: SuiteReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(read, report);
}
