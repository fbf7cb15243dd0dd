//! Routing decision for the dispatch graph.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{StructuredOutput, StructuredOutputError};

/// Which agent handles a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum AgentKind {
    #[default]
    Basic,
    Specialized,
}

/// What the query is about; selects the tool a specialized agent binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum TaskKind {
    Weather,
    SystemTime,
    #[default]
    Generic,
}

fn normalize(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

impl FromStr for AgentKind {
    type Err = StructuredOutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "basic" | "basic_agent" => Ok(AgentKind::Basic),
            "specialized" | "specialised" | "specialized_agent" => Ok(AgentKind::Specialized),
            other => Err(StructuredOutputError::Invalid {
                type_name: "AgentKind",
                message: format!("unknown agent type {:?}", other),
            }),
        }
    }
}

impl TryFrom<String> for AgentKind {
    type Error = StructuredOutputError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for TaskKind {
    type Err = StructuredOutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "weather" => Ok(TaskKind::Weather),
            "system_time" | "systemtime" | "time" => Ok(TaskKind::SystemTime),
            "generic" | "general" => Ok(TaskKind::Generic),
            other => Err(StructuredOutputError::Invalid {
                type_name: "TaskKind",
                message: format!("unknown task type {:?}", other),
            }),
        }
    }
}

impl TryFrom<String> for TaskKind {
    type Error = StructuredOutputError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// `{"agent_type": ..., "task_type": ...}` from the routing prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouterDecision {
    pub agent_type: AgentKind,
    pub task_type: TaskKind,
}

impl StructuredOutput for RouterDecision {
    fn name() -> &'static str {
        "RouterDecision"
    }

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "agent_type": {"type": "string", "enum": ["basic", "specialized"]},
                "task_type": {"type": "string", "enum": ["weather", "system_time", "generic"]}
            },
            "required": ["agent_type", "task_type"]
        })
    }
}
