//! Tool registry: named callables with a declared argument schema.
//!
//! Models pick a tool by name; [`ToolRegistry`] resolves it case-insensitively and runs it.
//! Tools take string arguments and return text. [`builtin_registry`] holds the weather and
//! system time stubs used by the demos.

mod builtin;
mod fn_tool;
mod registry;

pub use builtin::{
    builtin_registry, system_time_tool, weather_tool, DEFAULT_TIME_LOCATION, TIME_OUTCOMES,
    TOOL_GET_CURRENT_WEATHER, TOOL_GET_SYSTEM_TIME, WEATHER_OUTCOMES,
};
pub use fn_tool::FnTool;
pub use registry::{ToolRegistry, TOOL_NOT_FOUND};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Tool declaration sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    /// Human-readable description for the LLM.
    pub description: Option<String>,
    /// JSON Schema for the arguments object.
    pub input_schema: Value,
}

impl ToolSpec {
    /// `{"type": "function", "function": {name, description, parameters}}`, the shape
    /// chat completion APIs expect in `tools`.
    pub fn to_function_definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description.clone().unwrap_or_default(),
                "parameters": self.input_schema,
            }
        })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("tool execution failed: {0}")]
    Execution(String),
}

/// A single tool the model can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry (compared case-insensitively).
    fn name(&self) -> &str;

    fn spec(&self) -> ToolSpec;

    /// Runs the tool. `args` is the argument object from the model's tool call.
    async fn call(&self, args: Value) -> Result<String, ToolError>;
}

/// Parses a raw tool-call argument string into a JSON value.
///
/// Empty input gives `{}`. Some models double-encode arguments as a JSON string, which is
/// decoded once more. Anything unparseable gives `{}` and a warning.
pub fn parse_tool_arguments(arguments: &str) -> Value {
    if arguments.trim().is_empty() {
        return json!({});
    }
    let raw: Value = match serde_json::from_str(arguments) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, arguments = %arguments, "tool arguments JSON parse failed, using empty object");
            return json!({});
        }
    };
    match raw {
        Value::String(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "nested tool arguments JSON parse failed, using empty object");
            json!({})
        }),
        other => other,
    }
}
