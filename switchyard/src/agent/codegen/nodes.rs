use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::PromptSet;
use crate::structured::{invoke_structured, CodeReview};

use super::executor::CodeExecutor;
use super::extract::{extract_code, Extraction};
use super::{CodegenState, NODE_EXECUTE, NODE_EXTRACT, NODE_GENERATE, NODE_PREPROCESS, NODE_REVIEW};

/// Turns the raw request into one concrete task sentence.
pub struct PreprocessNode {
    pub(super) llm: Arc<dyn LlmClient>,
    pub(super) prompts: Arc<PromptSet>,
}

#[async_trait]
impl Node<CodegenState> for PreprocessNode {
    fn id(&self) -> &str {
        NODE_PREPROCESS
    }

    async fn run(&self, state: CodegenState) -> Result<(CodegenState, Next), AgentError> {
        let prompt = self.prompts.preprocess.render(&[("request", &state.request)])?;
        let reply = self.llm.invoke(&[Message::user(prompt)]).await?;
        let mut state = state;
        let task = reply.content.trim();
        state.task = if task.is_empty() {
            state.request.clone()
        } else {
            task.to_string()
        };
        info!(task = %state.task, "task");
        Ok((state, Next::Continue))
    }
}

/// Asks for a program; ends the run once `max_attempts` generations were spent.
pub struct GenerateNode {
    pub(super) llm: Arc<dyn LlmClient>,
    pub(super) prompts: Arc<PromptSet>,
    pub(super) max_attempts: usize,
}

#[async_trait]
impl Node<CodegenState> for GenerateNode {
    fn id(&self) -> &str {
        NODE_GENERATE
    }

    async fn run(&self, state: CodegenState) -> Result<(CodegenState, Next), AgentError> {
        let mut state = state;
        if state.attempts >= self.max_attempts {
            warn!(attempts = state.attempts, "giving up on code generation");
            state.output = format!(
                "Gave up after {} attempts. Last problem: {}",
                state.attempts,
                if state.feedback.is_empty() { "unknown" } else { state.feedback.as_str() }
            );
            return Ok((state, Next::End));
        }
        state.attempts += 1;
        let prompt = self.prompts.code_generation.render(&[
            ("task", &state.task),
            ("feedback", &state.feedback),
        ])?;
        let reply = self.llm.invoke(&[Message::user(prompt)]).await?;
        info!(attempt = state.attempts, "code generated");
        state.generated = reply.content;
        Ok((state, Next::Continue))
    }
}

pub struct ExtractNode;

#[async_trait]
impl Node<CodegenState> for ExtractNode {
    fn id(&self) -> &str {
        NODE_EXTRACT
    }

    async fn run(&self, state: CodegenState) -> Result<(CodegenState, Next), AgentError> {
        let mut state = state;
        let (extraction, code) = extract_code(&state.generated);
        info!(extraction = ?extraction, "code extraction");
        if extraction == Extraction::Failed {
            state.feedback =
                "The previous reply contained no code block. Put the program in a fenced block.".into();
        }
        state.extraction = Some(extraction);
        state.extracted = code;
        Ok((state, Next::Continue))
    }
}

/// Structured review; an unparseable review counts as incorrect.
pub struct ReviewNode {
    pub(super) llm: Arc<dyn LlmClient>,
    pub(super) prompts: Arc<PromptSet>,
}

#[async_trait]
impl Node<CodegenState> for ReviewNode {
    fn id(&self) -> &str {
        NODE_REVIEW
    }

    async fn run(&self, state: CodegenState) -> Result<(CodegenState, Next), AgentError> {
        let code = state.extracted.clone().unwrap_or_default();
        let prompt = self
            .prompts
            .code_review
            .render(&[("task", &state.task), ("code", &code)])?;
        let review = match invoke_structured::<CodeReview>(self.llm.as_ref(), &[Message::user(prompt)]).await {
            Ok(r) => r,
            Err(AgentError::StructuredOutput(e)) => CodeReview::unparseable(e.to_string()),
            Err(e) => return Err(e),
        };
        info!(result = ?review.result, message = %review.message, "code review");
        let mut state = state;
        if !review.is_correct() {
            state.feedback = format!(
                "A reviewer rejected the previous attempt: {}",
                review.message
            );
        }
        state.review = Some(review);
        Ok((state, Next::Continue))
    }
}

pub struct ExecuteNode {
    pub(super) executor: Arc<dyn CodeExecutor>,
}

#[async_trait]
impl Node<CodegenState> for ExecuteNode {
    fn id(&self) -> &str {
        NODE_EXECUTE
    }

    async fn run(&self, state: CodegenState) -> Result<(CodegenState, Next), AgentError> {
        let code = state.extracted.clone().unwrap_or_default();
        let result = self.executor.execute(&code).await?;
        info!(executor = self.executor.name(), success = result.success, "code executed");
        let mut state = state;
        state.output = result.summary();
        state.execution = Some(result);
        Ok((state, Next::Continue))
    }
}
