//! Run orchestration for every subcommand.
//!
//! [`RunOptions`] carries the global flags. Settings come from
//! [`LlmSettings::from_env`](config::LlmSettings::from_env) and are overridden by the flags;
//! each `run_*` function then builds its graph, attaches [`display::ObserveMiddleware`] when
//! `--verbose`, `--step` or `--transcript` is set, and prints the result.

mod agents;
mod codegen;
mod demos;
mod display;
mod graph;
mod suite;

pub use agents::{run_agent_loop, run_call_tools, run_dispatch, run_evaluate, run_router_loop};
pub use codegen::{run_codegen, ExecutorKind};
pub use demos::{run_branch, run_chain, run_jokes};
pub use graph::{run_graph, GraphFormat, GraphName};
pub use suite::run_suite;

pub(crate) use display::truncate_display;

use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use config::{LlmSettings, SettingsError};
use switchyard::{AgentError, CompilationError, PromptSet, RunConfig, StateGraph};
use thiserror::Error;

use display::ObserveMiddleware;

/// Default max length for strings when printing state with `--verbose`.
pub const DEFAULT_DISPLAY_MAX_LEN: usize = 200;

/// Global options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Overrides `MODEL`.
    pub model: Option<String>,
    /// Overrides `SWITCHYARD_BASE_URL` / `OLLAMA_HOST` / `OPENAI_BASE_URL`.
    pub base_url: Option<String>,
    /// `ollama` or `openai`; overrides `SWITCHYARD_BACKEND`.
    pub backend: Option<String>,
    /// Overrides `SWITCHYARD_RECURSION_LIMIT`.
    pub recursion_limit: Option<usize>,
    /// Prompt override file; falls back to `SWITCHYARD_PROMPTS_FILE`.
    pub prompts: Option<PathBuf>,
    /// Print state after every node.
    pub verbose: bool,
    /// Wait for Enter after every node.
    pub step: bool,
    /// Append state after every node to this file.
    pub transcript: Option<PathBuf>,
    /// Max chars per string field when printing state.
    pub display_max_len: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            model: None,
            base_url: None,
            backend: None,
            recursion_limit: None,
            prompts: None,
            verbose: false,
            step: false,
            transcript: None,
            display_max_len: DEFAULT_DISPLAY_MAX_LEN,
        }
    }
}

/// Error type for run operations.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("compile: {0}")]
    Compile(#[from] CompilationError),
    #[error("run: {0}")]
    Run(#[from] AgentError),
    #[error("transcript {path}: {source}")]
    Transcript {
        path: String,
        source: std::io::Error,
    },
    #[error("write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("serialize: {0}")]
    Serialize(String),
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RunOptions {
    /// Environment settings with the command-line overrides applied.
    pub fn settings(&self) -> Result<LlmSettings, RunError> {
        self.apply_to(LlmSettings::from_env()?)
    }

    /// Applies the flags on top of `settings`; the base URL resolves against the final backend.
    pub fn apply_to(&self, settings: LlmSettings) -> Result<LlmSettings, RunError> {
        let mut settings = settings;
        if let Some(backend) = &self.backend {
            settings.backend = backend.parse()?;
        }
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(url) = &self.base_url {
            settings.base_url = Some(url.clone());
        }
        if let Some(limit) = self.recursion_limit {
            if limit == 0 {
                return Err(RunError::InvalidArgument(
                    "--recursion-limit must be at least 1".into(),
                ));
            }
            settings.recursion_limit = limit;
        }
        tracing::debug!(
            backend = %settings.backend,
            model = %settings.model,
            base_url = %settings.resolved_base_url(),
            recursion_limit = settings.recursion_limit,
            "resolved settings"
        );
        Ok(settings)
    }

    pub fn prompts(&self) -> Arc<PromptSet> {
        Arc::new(PromptSet::load_or_default(self.prompts.as_deref()))
    }

    pub(crate) fn run_config(&self, settings: &LlmSettings) -> RunConfig {
        RunConfig::with_recursion_limit(settings.recursion_limit)
    }

    /// Run config only when `--recursion-limit` was given, so graphs that size their own
    /// limit keep it otherwise.
    pub(crate) fn explicit_run_config(&self, settings: &LlmSettings) -> Option<RunConfig> {
        self.recursion_limit.map(|_| self.run_config(settings))
    }

    fn observes(&self) -> bool {
        self.verbose || self.step || self.transcript.is_some()
    }

    /// Attaches the display/step/transcript middleware when any of those flags is set.
    pub(crate) fn observe<S>(&self, graph: StateGraph<S>) -> Result<StateGraph<S>, RunError>
    where
        S: Clone + Send + Sync + Debug + 'static,
    {
        if !self.observes() {
            return Ok(graph);
        }
        let middleware = ObserveMiddleware::from_options(self)?;
        Ok(graph.with_middleware(Arc::new(middleware)))
    }
}
