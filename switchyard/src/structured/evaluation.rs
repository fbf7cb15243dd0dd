//! Evaluator replies: a plain yes/no and the richer weather judgment.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{lenient_bool, StructuredOutput, StructuredOutputError};

/// Whether a response answers the request. `result == true` ends the router loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(deserialize_with = "lenient_bool")]
    pub result: bool,
}

impl StructuredOutput for Evaluation {
    fn name() -> &'static str {
        "Evaluation"
    }

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "result": {"type": "boolean", "description": "true when the response answers the request"}
            },
            "required": ["result"]
        })
    }
}

/// How the reported temperature feels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TemperatureTone {
    Hot,
    Warm,
    Neutral,
    Cool,
    Cold,
}

impl TemperatureTone {
    pub const ALL: [TemperatureTone; 5] = [
        TemperatureTone::Hot,
        TemperatureTone::Warm,
        TemperatureTone::Neutral,
        TemperatureTone::Cool,
        TemperatureTone::Cold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureTone::Hot => "hot",
            TemperatureTone::Warm => "warm",
            TemperatureTone::Neutral => "neutral",
            TemperatureTone::Cool => "cool",
            TemperatureTone::Cold => "cold",
        }
    }
}

impl FromStr for TemperatureTone {
    type Err = StructuredOutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| StructuredOutputError::Invalid {
                type_name: "TemperatureTone",
                message: format!("unknown tone {:?}", s),
            })
    }
}

impl TryFrom<String> for TemperatureTone {
    type Error = StructuredOutputError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Evaluator verdict on a weather answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherEvaluation {
    #[serde(deserialize_with = "lenient_bool")]
    pub result: bool,
    pub explanation: String,
    pub temperature_tone: TemperatureTone,
}

impl StructuredOutput for WeatherEvaluation {
    fn name() -> &'static str {
        "WeatherEvaluation"
    }

    fn schema() -> Value {
        let tones: Vec<&str> = TemperatureTone::ALL.iter().map(|t| t.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "result": {"type": "boolean"},
                "explanation": {"type": "string"},
                "temperature_tone": {"type": "string", "enum": tones}
            },
            "required": ["result", "explanation", "temperature_tone"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::parse_structured;

    #[test]
    fn evaluation_accepts_loose_booleans() {
        for (raw, want) in [
            (r#"{"result": true}"#, true),
            (r#"{"result": "True"}"#, true),
            (r#"{"result": "yes"}"#, true),
            (r#"{"result": "false"}"#, false),
            (r#"{"result": 0}"#, false),
        ] {
            assert_eq!(parse_structured::<Evaluation>(raw).unwrap().result, want, "{}", raw);
        }
        assert!(parse_structured::<Evaluation>(r#"{"result": "perhaps"}"#).is_err());
    }

    #[test]
    fn weather_evaluation_parses_tone_case_insensitively() {
        let raw = r#"Here you go: {"result": "True", "explanation": "Reports 78F and sun.", "temperature_tone": "Warm"}"#;
        let eval = parse_structured::<WeatherEvaluation>(raw).unwrap();
        assert!(eval.result);
        assert_eq!(eval.temperature_tone, TemperatureTone::Warm);
        assert!(parse_structured::<WeatherEvaluation>(
            r#"{"result": true, "explanation": "", "temperature_tone": "tepid"}"#
        )
        .is_err());
    }

    #[test]
    fn weather_schema_lists_tones() {
        let schema = WeatherEvaluation::schema();
        assert_eq!(schema["properties"]["temperature_tone"]["enum"][4], "cold");
    }
}
