//! Runs generated Python in a throwaway directory, inside Docker or with the local interpreter.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::AgentError;

pub const DEFAULT_DOCKER_IMAGE: &str = "python:3.9-slim";
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(60);

const SCRIPT_NAME: &str = "main.py";
const CONTAINER_WORKDIR: &str = "/usr/src/app";

/// Captured result of one program run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed (timeout or signal).
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl ExecutionOutput {
    fn timed_out(timeout: Duration) -> Self {
        Self {
            stderr: format!("timed out after {}s", timeout.as_secs_f32()),
            ..Default::default()
        }
    }

    /// Stdout on success; otherwise stderr behind an `Error` marker.
    pub fn summary(&self) -> String {
        if self.success {
            self.stdout.clone()
        } else {
            let detail = if self.stderr.trim().is_empty() {
                &self.stdout
            } else {
                &self.stderr
            };
            match self.exit_code {
                Some(code) => format!("Error (exit code {}): {}", code, detail.trim_end()),
                None => format!("Error: {}", detail.trim_end()),
            }
        }
    }
}

#[async_trait]
pub trait CodeExecutor: Send + Sync {
    fn name(&self) -> &str;

    /// Runs `code` as a Python program. `Err` only when the program could not be started.
    async fn execute(&self, code: &str) -> Result<ExecutionOutput, AgentError>;
}

async fn write_script(dir: &Path, code: &str) -> Result<(), AgentError> {
    tokio::fs::write(dir.join(SCRIPT_NAME), code)
        .await
        .map_err(|e| AgentError::ExecutionFailed(format!("failed to write script: {}", e)))
}

/// Runs `command` to completion; `Ok(None)` when `timeout` elapsed first and the child was killed.
async fn run_with_timeout(
    mut command: Command,
    timeout: Duration,
    what: &str,
) -> Result<Option<ExecutionOutput>, AgentError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => {
            result.map_err(|e| AgentError::ExecutionFailed(format!("failed to run {}: {}", what, e)))?
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "{} timed out", what);
            return Ok(None);
        }
    };
    let result = ExecutionOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
        success: output.status.success(),
    };
    debug!(exit_code = ?result.exit_code, stdout_len = result.stdout.len(), "{} finished", what);
    Ok(Some(result))
}

/// `docker run --rm` with the script directory mounted at `/usr/src/app`.
///
/// Each run gets its own container name; on timeout the container is killed by name, since
/// killing the `docker` client leaves it running.
#[derive(Debug, Clone)]
pub struct DockerExecutor {
    pub image: String,
    pub timeout: Duration,
}

impl Default for DockerExecutor {
    fn default() -> Self {
        Self {
            image: DEFAULT_DOCKER_IMAGE.to_string(),
            timeout: DEFAULT_EXECUTION_TIMEOUT,
        }
    }
}

impl DockerExecutor {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, dir: &Path, container: &str) -> Command {
        let mut cmd = Command::new("docker");
        cmd.arg("run")
            .arg("--rm")
            .arg("--name")
            .arg(container)
            .arg("-v")
            .arg(format!("{}:{}", dir.display(), CONTAINER_WORKDIR))
            .arg("-w")
            .arg(CONTAINER_WORKDIR)
            .arg(&self.image)
            .arg("python")
            .arg(SCRIPT_NAME);
        cmd
    }
}

#[async_trait]
impl CodeExecutor for DockerExecutor {
    fn name(&self) -> &str {
        "docker"
    }

    async fn execute(&self, code: &str) -> Result<ExecutionOutput, AgentError> {
        let dir = tempfile::tempdir()
            .map_err(|e| AgentError::ExecutionFailed(format!("failed to create temp dir: {}", e)))?;
        write_script(dir.path(), code).await?;
        let container = format!("switchyard-{}", uuid::Uuid::new_v4().simple());
        let command = self.command(dir.path(), &container);
        match run_with_timeout(command, self.timeout, "docker").await? {
            Some(output) => Ok(output),
            None => {
                kill_container(&container).await;
                Ok(ExecutionOutput::timed_out(self.timeout))
            }
        }
    }
}

async fn kill_container(container: &str) {
    let killed = Command::new("docker")
        .arg("kill")
        .arg(container)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match killed {
        Ok(status) if status.success() => debug!(container, "killed timed-out container"),
        Ok(status) => warn!(container, code = ?status.code(), "docker kill failed"),
        Err(e) => warn!(container, error = %e, "docker kill failed"),
    }
}

/// Runs the script with a local interpreter (`python3` by default).
#[derive(Debug, Clone)]
pub struct LocalPythonExecutor {
    pub interpreter: String,
    pub timeout: Duration,
}

impl Default for LocalPythonExecutor {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout: DEFAULT_EXECUTION_TIMEOUT,
        }
    }
}

impl LocalPythonExecutor {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CodeExecutor for LocalPythonExecutor {
    fn name(&self) -> &str {
        "local"
    }

    async fn execute(&self, code: &str) -> Result<ExecutionOutput, AgentError> {
        let dir = tempfile::tempdir()
            .map_err(|e| AgentError::ExecutionFailed(format!("failed to create temp dir: {}", e)))?;
        write_script(dir.path(), code).await?;
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(SCRIPT_NAME).current_dir(dir.path());
        Ok(run_with_timeout(cmd, self.timeout, &self.interpreter)
            .await?
            .unwrap_or_else(|| ExecutionOutput::timed_out(self.timeout)))
    }
}
