//! Transcript dump: state after every node, appended to a text file.

use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

use crate::error::AgentError;
use crate::graph::{BoxedNodeRun, Next, NodeMiddleware};

/// Writes `"[n] node_id\n{state:#?}\n"` after each successful node run.
///
/// The file is created (or truncated) by [`TranscriptMiddleware::create`]. Write failures
/// are logged and never fail the run.
pub struct TranscriptMiddleware {
    path: PathBuf,
    file: Mutex<File>,
    step: AtomicUsize,
}

impl TranscriptMiddleware {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            step: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, entry: &str) {
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = file.write_all(entry.as_bytes()).and_then(|_| file.flush()) {
            warn!(path = %self.path.display(), error = %e, "transcript write failed");
        }
    }
}

#[async_trait]
impl<S> NodeMiddleware<S> for TranscriptMiddleware
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: BoxedNodeRun<S>,
    ) -> Result<(S, Next), AgentError> {
        let (state, next) = inner(state).await?;
        let n = self.step.fetch_add(1, Ordering::SeqCst) + 1;
        self.append(&format!("[{}] {}\n{:#?}\n", n, node_id, state));
        Ok((state, next))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::agent::demos::build_chain_graph;

    /// **Scenario**: every node of a chain appears in order with its state.
    #[tokio::test]
    async fn writes_one_entry_per_node() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.txt");
        let transcript = Arc::new(TranscriptMiddleware::create(&path).unwrap());
        let graph = build_chain_graph(["_a", "_b"])
            .with_middleware(transcript)
            .compile()
            .unwrap();
        graph.invoke("x".to_string(), None).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "[1] node1\n\"x_a\"\n[2] node2\n\"x_a_b\"\n");
    }
}
