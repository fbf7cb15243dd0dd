//! Code generation pipeline: preprocess → generate → extract → review → execute.
//!
//! Extraction failure and a negative review both loop back to `generate` with feedback.
//! `generate` ends the run once `max_attempts` programs were produced without passing.

mod executor;
mod extract;
mod nodes;

pub use executor::{
    CodeExecutor, DockerExecutor, ExecutionOutput, LocalPythonExecutor, DEFAULT_DOCKER_IMAGE,
    DEFAULT_EXECUTION_TIMEOUT,
};
pub use extract::{extract_code, Extraction};
pub use nodes::{ExecuteNode, ExtractNode, GenerateNode, PreprocessNode, ReviewNode};

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::graph::{RunConfig, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::prompts::PromptSet;
use crate::structured::CodeReview;

pub const NODE_PREPROCESS: &str = "preprocess";
pub const NODE_GENERATE: &str = "generate";
pub const NODE_EXTRACT: &str = "extract";
pub const NODE_REVIEW: &str = "review";
pub const NODE_EXECUTE: &str = "execute";

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Sample request for the codegen demo.
pub const DEFAULT_REQUEST: &str =
    "Write a function that returns the Fibonacci sequence up to the 10th element and print it.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodegenState {
    pub request: String,
    /// Request rewritten as a single task.
    pub task: String,
    /// Latest raw generation.
    pub generated: String,
    pub extracted: Option<String>,
    pub extraction: Option<Extraction>,
    pub review: Option<CodeReview>,
    /// Why the previous attempt was rejected; fed into the next generation prompt.
    pub feedback: String,
    pub execution: Option<ExecutionOutput>,
    /// Program output, or the reason the pipeline gave up.
    pub output: String,
    /// Generations so far.
    pub attempts: usize,
}

impl CodegenState {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            ..Default::default()
        }
    }
}

pub fn route_after_extract(state: &CodegenState) -> String {
    match state.extraction {
        Some(e) if e.is_ok() => NODE_REVIEW.to_string(),
        _ => NODE_GENERATE.to_string(),
    }
}

pub fn route_after_review(state: &CodegenState) -> String {
    match &state.review {
        Some(r) if r.is_correct() => NODE_EXECUTE.to_string(),
        _ => NODE_GENERATE.to_string(),
    }
}

/// Node executions for a run that spends every attempt: preprocess, then
/// generate/extract/review per attempt, then the final generate or execute.
pub fn codegen_recursion_limit(max_attempts: usize) -> usize {
    3 * max_attempts + 2
}

pub fn build_codegen_graph(
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
    executor: Arc<dyn CodeExecutor>,
    max_attempts: usize,
) -> StateGraph<CodegenState> {
    let mut graph = StateGraph::<CodegenState>::new().with_run_config(
        RunConfig::with_recursion_limit(codegen_recursion_limit(max_attempts)),
    );
    graph
        .add_node(
            NODE_PREPROCESS,
            Arc::new(PreprocessNode {
                llm: llm.clone(),
                prompts: prompts.clone(),
            }),
        )
        .add_node(
            NODE_GENERATE,
            Arc::new(GenerateNode {
                llm: llm.clone(),
                prompts: prompts.clone(),
                max_attempts,
            }),
        )
        .add_node(NODE_EXTRACT, Arc::new(ExtractNode))
        .add_node(NODE_REVIEW, Arc::new(ReviewNode { llm, prompts }))
        .add_node(NODE_EXECUTE, Arc::new(ExecuteNode { executor }))
        .add_edge(START, NODE_PREPROCESS)
        .add_edge(NODE_PREPROCESS, NODE_GENERATE)
        .add_edge(NODE_GENERATE, NODE_EXTRACT)
        .add_edge(NODE_EXECUTE, END);
    graph.add_conditional_edges(
        NODE_EXTRACT,
        Arc::new(route_after_extract),
        Some(HashMap::from([
            (NODE_REVIEW.to_string(), NODE_REVIEW.to_string()),
            (NODE_GENERATE.to_string(), NODE_GENERATE.to_string()),
        ])),
    );
    graph.add_conditional_edges(
        NODE_REVIEW,
        Arc::new(route_after_review),
        Some(HashMap::from([
            (NODE_EXECUTE.to_string(), NODE_EXECUTE.to_string()),
            (NODE_GENERATE.to_string(), NODE_GENERATE.to_string()),
        ])),
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::error::AgentError;
    use crate::llm::MockLlm;

    struct EchoExecutor;

    #[async_trait]
    impl CodeExecutor for EchoExecutor {
        fn name(&self) -> &str {
            "echo"
        }

        async fn execute(&self, code: &str) -> Result<ExecutionOutput, AgentError> {
            Ok(ExecutionOutput {
                stdout: format!("ran: {}", code),
                exit_code: Some(0),
                success: true,
                ..Default::default()
            })
        }
    }

    fn run_graph(llm: MockLlm, max_attempts: usize) -> crate::graph::CompiledStateGraph<CodegenState> {
        build_codegen_graph(
            Arc::new(llm),
            Arc::new(PromptSet::default()),
            Arc::new(EchoExecutor),
            max_attempts,
        )
        .compile()
        .unwrap()
    }

    /// **Scenario**: the happy path runs every node once.
    #[tokio::test]
    async fn correct_code_is_executed() {
        let llm = MockLlm::texts([
            "Print the numbers 1 to 3.",
            "```python\nfor i in range(1, 4):\n    print(i)\n```",
            r#"{"result": "correct", "message": "fine"}"#,
        ]);
        let out = run_graph(llm, 3).invoke(CodegenState::new("count"), None).await.unwrap();
        assert_eq!(out.task, "Print the numbers 1 to 3.");
        assert_eq!(out.attempts, 1);
        assert_eq!(out.extraction, Some(Extraction::PythonFence));
        assert_eq!(out.output, "ran: for i in range(1, 4):\n    print(i)");
    }

    /// **Scenario**: a rejected review regenerates with the reviewer's feedback.
    #[tokio::test]
    async fn rejected_review_regenerates() {
        let llm = MockLlm::texts([
            "task",
            "```\nprint(x)\n```",
            r#"{"result": "incorrect", "message": "x is undefined"}"#,
            "```\nprint(1)\n```",
            r#"{"result": "correct", "message": ""}"#,
        ]);
        let llm = Arc::new(llm);
        let graph = build_codegen_graph(
            llm.clone(),
            Arc::new(PromptSet::default()),
            Arc::new(EchoExecutor),
            3,
        )
        .compile()
        .unwrap();
        let out = graph.invoke(CodegenState::new("r"), None).await.unwrap();
        assert_eq!(out.attempts, 2);
        assert_eq!(out.output, "ran: print(1)");
        let requests = llm.requests();
        assert!(requests[3][0].content().contains("x is undefined"));
    }

    /// **Scenario**: replies without code exhaust the attempts and end with an explanation.
    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let llm = MockLlm::texts(["task", "Sorry, I can't do that."]);
        let out = run_graph(llm, 2).invoke(CodegenState::new("r"), None).await.unwrap();
        assert_eq!(out.attempts, 2);
        assert!(out.execution.is_none());
        assert!(out.output.starts_with("Gave up after 2 attempts"), "{}", out.output);
    }

    /// **Scenario**: eight rejected reviews still end with the give-up message, not the
    /// recursion limit.
    #[tokio::test]
    async fn many_rejections_fit_in_the_graph_limit() {
        let mut replies = vec!["task".to_string()];
        for _ in 0..8 {
            replies.push("```\nprint(x)\n```".to_string());
            replies.push(r#"{"result": "incorrect", "message": "x is undefined"}"#.to_string());
        }
        let graph = run_graph(MockLlm::texts(replies), 8);
        assert_eq!(graph.default_run_config().recursion_limit, codegen_recursion_limit(8));
        let out = graph.invoke(CodegenState::new("r"), None).await.unwrap();
        assert_eq!(out.attempts, 8);
        assert!(out.execution.is_none());
        assert!(out.output.starts_with("Gave up after 8 attempts"), "{}", out.output);
        assert!(out.output.contains("x is undefined"), "{}", out.output);
    }
}
