//! Standalone judge: asks the model to grade a response and parses a typed verdict.

use std::sync::Arc;

use tracing::debug;

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::PromptSet;
use crate::structured::{invoke_structured, StructuredOutput};

pub struct Evaluator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
}

impl Evaluator {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptSet>) -> Self {
        Self { llm, prompts }
    }

    /// Renders the weather evaluation prompt for `request` / `response` and parses `T`.
    ///
    /// Parse failures come back as [`AgentError::StructuredOutput`]; the caller picks the fallback.
    pub async fn judge<T: StructuredOutput>(
        &self,
        request: &str,
        response: &str,
    ) -> Result<T, AgentError> {
        let prompt = self
            .prompts
            .weather_evaluation
            .render(&[("question", request), ("response", response)])?;
        debug!(output = T::name(), "judging response");
        invoke_structured::<T>(self.llm.as_ref(), &[Message::user(prompt)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::structured::{Evaluation, TemperatureTone, WeatherEvaluation};

    #[tokio::test]
    async fn judges_weather_report() {
        let llm = Arc::new(MockLlm::texts([
            r#"Sure: {"result": true, "explanation": "It answers.", "temperature_tone": "Warm"}"#,
        ]));
        let eval = Evaluator::new(llm, Arc::new(PromptSet::default()));
        let w: WeatherEvaluation = eval.judge("Weather in Rome?", "Sunny, 78F").await.unwrap();
        assert!(w.result);
        assert_eq!(w.temperature_tone, TemperatureTone::Warm);
    }

    #[tokio::test]
    async fn parse_failure_is_structured_error() {
        let llm = Arc::new(MockLlm::texts(["I think so"]));
        let eval = Evaluator::new(llm, Arc::new(PromptSet::default()));
        let err = eval.judge::<Evaluation>("q", "r").await.unwrap_err();
        assert!(matches!(err, AgentError::StructuredOutput(_)));
    }
}
