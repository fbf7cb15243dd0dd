//! # Switchyard
//!
//! Wire LLM endpoints into small state graphs: agent steps, tool calls, structured verdicts
//! and loops that stop on their own. One state type flows through every node of a graph
//! (**state in, state out**); routing is a plain function of that state.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Next`], [`RunConfig`]: build and run graphs.
//! - [`agent`]: ready-made graphs. [`agent::router_loop`] is the agent → tool → evaluate loop;
//!   [`agent::tool_calling`], [`agent::dispatch`], [`agent::codegen`] and [`agent::demos`] cover the rest.
//! - [`llm`]: [`LlmClient`] with [`ChatOpenAI`], [`ChatOllama`] and [`MockLlm`].
//! - [`tools`]: [`Tool`], [`ToolRegistry`], [`FnTool`] and the weather/time stubs.
//! - [`structured`]: typed model output ([`Evaluation`], [`RouterDecision`], [`CodeReview`]) and [`Verdict`].
//! - [`prompts`]: [`PromptTemplate`] and the [`PromptSet`] used by the agents.
//! - [`suite`]: function-calling suite over generated sentences.
//! - [`transcript`]: [`TranscriptMiddleware`] dumps state after every node.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use switchyard::agent::router_loop::{RouterLoop, RouterLoopOptions};
//! use switchyard::{builtin_registry, ChatOllama, PromptSet};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), switchyard::AgentError> {
//! let registry = Arc::new(builtin_registry());
//! let llm = Arc::new(ChatOllama::new("http://localhost:11434", "llama3").with_tools(registry.list()));
//! let router = RouterLoop::new(llm, registry, Arc::new(PromptSet::default()), RouterLoopOptions::default())
//!     .map_err(|e| switchyard::AgentError::ExecutionFailed(e.to_string()))?;
//! let state = router.run("What's the weather in Tokyo?").await?;
//! println!("{}", state.tool_response);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod graph;
pub mod llm;
pub mod message;
pub mod prompts;
pub mod state;
pub mod structured;
pub mod suite;
pub mod tools;
pub mod traits;
pub mod transcript;

pub use error::AgentError;
pub use graph::{
    generate_dot, generate_mermaid, log_graph_complete, log_graph_error, log_graph_start,
    log_node_complete, log_node_start, CompilationError, CompiledStateGraph, ConditionalRouter,
    FnNode, NameNode, Next, Node, NodeMiddleware, RetryPolicy, RunConfig, StateGraph, END, START,
};
pub use llm::{
    build_client, ChatOllama, ChatOpenAI, LlmClient, LlmResponse, LlmUsage, MockLlm,
    ToolChoiceMode,
};
pub use message::Message;
pub use prompts::{PromptError, PromptSet, PromptTemplate};
pub use state::{ToolCall, ToolResult};
pub use structured::{
    invoke_structured, parse_structured, AgentKind, CodeReview, Evaluation, ReviewOutcome,
    RouterDecision, StructuredOutput, StructuredOutputError, TaskKind, TemperatureTone, Verdict,
    WeatherEvaluation,
};
pub use suite::{generate_sentences, run_suite, SuiteCase, SuiteReport};
pub use tools::{
    builtin_registry, parse_tool_arguments, system_time_tool, weather_tool, FnTool, Tool,
    ToolError, ToolRegistry, ToolSpec,
};
pub use traits::Agent;
pub use transcript::TranscriptMiddleware;
