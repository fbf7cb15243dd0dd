//! Code review verdict for the codegen pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::StructuredOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewOutcome {
    #[serde(alias = "Correct", alias = "CORRECT")]
    Correct,
    #[serde(alias = "Incorrect", alias = "INCORRECT")]
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeReview {
    pub result: ReviewOutcome,
    #[serde(default)]
    pub message: String,
}

impl CodeReview {
    pub fn is_correct(&self) -> bool {
        self.result == ReviewOutcome::Correct
    }

    /// Review used when the reviewer reply could not be parsed.
    pub fn unparseable(reason: impl Into<String>) -> Self {
        Self {
            result: ReviewOutcome::Incorrect,
            message: reason.into(),
        }
    }
}

impl StructuredOutput for CodeReview {
    fn name() -> &'static str {
        "CodeReview"
    }

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "result": {"type": "string", "enum": ["correct", "incorrect"]},
                "message": {"type": "string"}
            },
            "required": ["result", "message"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::parse_structured;

    #[test]
    fn parses_capitalized_outcome() {
        let r = parse_structured::<CodeReview>(r#"{"result": "Correct", "message": "ok"}"#).unwrap();
        assert!(r.is_correct());
        let r = parse_structured::<CodeReview>(r#"{"result": "incorrect"}"#).unwrap();
        assert!(!r.is_correct());
        assert!(r.message.is_empty());
    }

    #[test]
    fn unparseable_counts_as_incorrect() {
        assert!(!CodeReview::unparseable("no json").is_correct());
    }
}
