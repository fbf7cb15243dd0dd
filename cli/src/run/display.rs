//! State display for `--verbose`, `--step` and `--transcript`.
//!
//! [`ObserveMiddleware`] wraps every node run: it forwards to the transcript writer when one
//! is configured, prints the node id and the resulting state to stdout with `crossterm`
//! styling, and optionally waits for Enter before the next node.

use std::fmt::Debug;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use crossterm::style::Stylize;
use switchyard::graph::BoxedNodeRun;
use switchyard::{AgentError, Message, Next, NodeMiddleware, TranscriptMiddleware};

use super::{RunError, RunOptions};

/// Truncates a string to at most `max` chars; appends "..." when truncated. UTF-8 safe.
pub(crate) fn truncate_display(s: &str, max: usize) -> String {
    const SUFFIX: &str = "...";
    let suffix_len = 3;
    if max <= suffix_len {
        return s.chars().take(max).collect();
    }
    let content_max = max - suffix_len;
    if s.chars().count() <= max {
        return s.to_string();
    }
    format!(
        "{}{}",
        s.chars().take(content_max).collect::<String>(),
        SUFFIX
    )
}

/// One message on one line, content truncated, tool calls listed by name.
pub(crate) fn format_message_truncated(m: &Message, max: usize) -> String {
    let content = truncate_display(&m.content().replace('\n', " "), max);
    match m {
        Message::Assistant { tool_calls, .. } if !tool_calls.is_empty() => {
            let names: Vec<&str> = tool_calls.iter().map(|c| c.name.as_str()).collect();
            format!("assistant({}) -> [{}]", content, names.join(", "))
        }
        Message::Tool { name, .. } => format!("tool {}({})", name, content),
        other => format!("{}({})", other.role(), content),
    }
}

/// Pretty `Debug` output with every line cut to `max` chars.
pub(crate) fn format_state_display<S: Debug>(state: &S, max: usize) -> String {
    format!("{:#?}", state)
        .lines()
        .map(|line| truncate_display(line, max))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Display, step-through and transcript around each node.
pub(crate) struct ObserveMiddleware {
    verbose: bool,
    step: bool,
    display_max_len: usize,
    transcript: Option<Arc<TranscriptMiddleware>>,
    steps: AtomicUsize,
}

impl ObserveMiddleware {
    pub(crate) fn from_options(opts: &RunOptions) -> Result<Self, RunError> {
        let transcript = match &opts.transcript {
            Some(path) => Some(Arc::new(TranscriptMiddleware::create(path).map_err(
                |source| RunError::Transcript {
                    path: path.display().to_string(),
                    source,
                },
            )?)),
            None => None,
        };
        Ok(Self {
            verbose: opts.verbose || opts.step,
            step: opts.step,
            display_max_len: opts.display_max_len,
            transcript,
            steps: AtomicUsize::new(0),
        })
    }
}

async fn wait_for_enter() {
    print!("{}", "Press Enter to continue...".dim());
    let _ = std::io::stdout().flush();
    let read = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)
    })
    .await;
    if let Ok(Err(e)) = read {
        tracing::warn!(error = %e, "stdin read failed; not pausing");
    }
}

#[async_trait]
impl<S> NodeMiddleware<S> for ObserveMiddleware
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: BoxedNodeRun<S>,
    ) -> Result<(S, Next), AgentError> {
        let result = match &self.transcript {
            Some(transcript) => transcript.around_run(node_id, state, inner).await,
            None => inner(state).await,
        };
        let (state, next) = match result {
            Ok(out) => out,
            Err(e) => {
                if self.verbose {
                    println!("{} {}", format!("[{}] failed:", node_id).red().bold(), e);
                }
                return Err(e);
            }
        };
        if self.verbose {
            let n = self.steps.fetch_add(1, Ordering::SeqCst) + 1;
            println!("{}", format!("==> [{}] {}", n, node_id).cyan().bold());
            println!("{}", format_state_display(&state, self.display_max_len));
        }
        if self.step {
            wait_for_enter().await;
        }
        Ok((state, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard::ToolCall;

    #[test]
    fn truncate_display_handles_short_exact_and_truncated() {
        assert_eq!(truncate_display("abc", 10), "abc");
        assert_eq!(truncate_display("abcdef", 3), "abc");
        assert_eq!(truncate_display("abcdefghij", 5), "ab...");
        assert_eq!(truncate_display("héllo wörld", 8).chars().count(), 8);
    }

    #[test]
    fn format_message_truncated_for_each_role() {
        assert_eq!(
            format_message_truncated(&Message::system("be brief please"), 8),
            "system(be br...)"
        );
        assert_eq!(format_message_truncated(&Message::user("hi"), 8), "user(hi)");
        let call = ToolCall::new("get_current_weather", serde_json::json!({"location": "Oslo"}));
        assert_eq!(
            format_message_truncated(&Message::assistant_with_tool_calls("", vec![call]), 8),
            "assistant() -> [get_current_weather]"
        );
        assert_eq!(
            format_message_truncated(&Message::tool(None, "get_system_time", "3:00 PM"), 20),
            "tool get_system_time(3:00 PM)"
        );
    }

    #[test]
    fn state_display_cuts_long_lines() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Demo {
            text: String,
        }
        let rendered = format_state_display(
            &Demo {
                text: "x".repeat(100),
            },
            20,
        );
        assert!(rendered.starts_with("Demo {"));
        assert!(rendered.lines().all(|l| l.chars().count() <= 20));
        assert!(rendered.contains("..."));
    }
}
