//! `codegen`: generate, review and run a Python program for a request.

use std::sync::Arc;
use std::time::Duration;

use crossterm::style::Stylize;
use switchyard::agent::codegen::{
    build_codegen_graph, CodeExecutor, CodegenState, DockerExecutor, LocalPythonExecutor,
};
use switchyard::build_client;

use super::{RunError, RunOptions};

/// Where generated code runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExecutorKind {
    /// `docker run` with the python image.
    #[default]
    Docker,
    /// Local `python3`.
    Local,
}

impl ExecutorKind {
    fn build(self, timeout: Option<Duration>) -> Arc<dyn CodeExecutor> {
        match self {
            ExecutorKind::Docker => {
                let executor = DockerExecutor::default();
                Arc::new(match timeout {
                    Some(t) => executor.with_timeout(t),
                    None => executor,
                })
            }
            ExecutorKind::Local => {
                let executor = LocalPythonExecutor::default();
                Arc::new(match timeout {
                    Some(t) => executor.with_timeout(t),
                    None => executor,
                })
            }
        }
    }
}

pub async fn run_codegen(
    opts: &RunOptions,
    request: &str,
    executor: ExecutorKind,
    max_attempts: usize,
    timeout: Option<Duration>,
) -> Result<CodegenState, RunError> {
    if max_attempts == 0 {
        return Err(RunError::InvalidArgument(
            "--max-attempts must be at least 1".into(),
        ));
    }
    let settings = opts.settings()?;
    let llm = build_client(&settings, Vec::new());
    let graph = opts
        .observe(build_codegen_graph(
            llm,
            opts.prompts(),
            executor.build(timeout),
            max_attempts,
        ))?
        .compile()?;
    let state = graph
        .invoke(CodegenState::new(request), opts.explicit_run_config(&settings))
        .await?;

    if let Some(code) = &state.extracted {
        println!("{}", "code:".bold());
        println!("{}", code.trim_end());
    }
    let header = match &state.execution {
        Some(out) if out.success => "output:".green().bold(),
        Some(_) => "failed:".red().bold(),
        None => "stopped:".yellow().bold(),
    };
    println!("{}", header);
    println!("{}", state.output.trim_end());
    println!("{}", format!("attempts: {}", state.attempts).dim());
    Ok(state)
}
