//! Structured model output: typed JSON replies and the router verdict.
//!
//! Models wrap JSON in prose or code fences often enough that parsing first pulls out the
//! first balanced `{...}` object, then deserializes it. Callers decide the fallback when
//! that fails (the router ends, code review regenerates).

mod decision;
mod evaluation;
mod review;

pub use decision::{AgentKind, RouterDecision, TaskKind};
pub use evaluation::{Evaluation, TemperatureTone, WeatherEvaluation};
pub use review::{CodeReview, ReviewOutcome};

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;

/// Model output did not contain the requested structure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructuredOutputError {
    #[error("no JSON object in model output: {0:?}")]
    NoJson(String),
    #[error("model output is not a valid {type_name}: {message}")]
    Invalid {
        type_name: &'static str,
        message: String,
    },
}

/// A type the model is asked to reply with.
pub trait StructuredOutput: DeserializeOwned + Serialize + Send {
    /// Short type name for logs and errors.
    fn name() -> &'static str;

    /// JSON schema sent to backends that support constrained output.
    fn schema() -> Value;
}

/// Parses `text` as `T`, tolerating code fences and surrounding prose.
pub fn parse_structured<T: StructuredOutput>(text: &str) -> Result<T, StructuredOutputError> {
    let json = extract_json_object(text).ok_or_else(|| StructuredOutputError::NoJson(preview(text)))?;
    serde_json::from_str(json).map_err(|e| StructuredOutputError::Invalid {
        type_name: T::name(),
        message: e.to_string(),
    })
}

/// Calls `llm.invoke_json` with `T`'s schema and parses the reply.
pub async fn invoke_structured<T: StructuredOutput>(
    llm: &dyn LlmClient,
    messages: &[Message],
) -> Result<T, AgentError> {
    let response = llm.invoke_json(messages, &T::schema()).await?;
    let parsed = parse_structured::<T>(&response.content).map_err(|e| {
        tracing::warn!(output = T::name(), error = %e, "structured output parse failed");
        e
    })?;
    Ok(parsed)
}

/// First balanced `{...}` in `text`, skipping braces inside JSON strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn preview(text: &str) -> String {
    let t = text.trim();
    match t.char_indices().nth(80) {
        Some((i, _)) => format!("{}...", &t[..i]),
        None => t.to_string(),
    }
}

/// Accepts `true`, `"True"`, `"yes"`, `1` and their negatives as a bool.
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    match &v {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Ok(true),
            "false" | "no" | "n" | "0" => Ok(false),
            other => Err(serde::de::Error::custom(format!("not a boolean: {}", other))),
        },
        other => Err(serde::de::Error::custom(format!("not a boolean: {}", other))),
    }
}

/// Router decision: go around again or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Continue,
    End,
}

impl Verdict {
    /// Route key used in conditional edge path maps.
    pub fn as_label(&self) -> &'static str {
        match self {
            Verdict::Continue => "continue",
            Verdict::End => "end",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl FromStr for Verdict {
    type Err = StructuredOutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(Verdict::Continue),
            "end" | "stop" | "finish" => Ok(Verdict::End),
            other => Err(StructuredOutputError::Invalid {
                type_name: "Verdict",
                message: format!("unknown label {:?}", other),
            }),
        }
    }
}

/// A satisfied evaluation ends the loop.
impl From<&Evaluation> for Verdict {
    fn from(e: &Evaluation) -> Self {
        if e.result {
            Verdict::End
        } else {
            Verdict::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_fenced_prose() {
        let text = "Sure!\n```json\n{\"result\": true, \"note\": \"a } in a string\"}\n```\nbye";
        assert_eq!(
            extract_json_object(text),
            Some("{\"result\": true, \"note\": \"a } in a string\"}")
        );
    }

    #[test]
    fn nested_objects_stay_balanced() {
        let text = r#"x {"a": {"b": 1}, "c": 2} {"d": 3}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": 1}, "c": 2}"#));
        assert_eq!(extract_json_object("no braces"), None);
        assert_eq!(extract_json_object("{ unclosed"), None);
    }

    #[test]
    fn parse_reports_missing_json_and_bad_shape() {
        assert!(matches!(
            parse_structured::<Evaluation>("I think so."),
            Err(StructuredOutputError::NoJson(_))
        ));
        assert!(matches!(
            parse_structured::<Evaluation>(r#"{"answer": true}"#),
            Err(StructuredOutputError::Invalid { type_name: "Evaluation", .. })
        ));
    }

    #[test]
    fn verdict_from_evaluation_and_labels() {
        assert_eq!(Verdict::from(&Evaluation { result: true }), Verdict::End);
        assert_eq!(Verdict::from(&Evaluation { result: false }), Verdict::Continue);
        assert_eq!("END".parse::<Verdict>().unwrap(), Verdict::End);
        assert_eq!(Verdict::Continue.to_string(), "continue");
        assert!("maybe".parse::<Verdict>().is_err());
    }
}
