//! Logging initialization: logs go to a file or are dropped, never to the console.
//!
//! Stdout belongs to the command output (and to `--verbose` state dumps), so tracing is
//! routed to `LOG_FILE` when set and discarded otherwise.

use std::io::Write;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Initializes tracing.
///
/// - **RUST_LOG**: filter, e.g. `info`, `switchyard=debug`. Default: `info`.
/// - **LOG_FILE**: when set, logs are appended to this file as plain text (no ANSI).
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper_util=off,reqwest=off"));

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let writer = std::sync::Mutex::new(StripAnsiWriter::new(file));
        let file_layer = tracing_subscriber::fmt::layer()
            .event_format(crate::log_format::TextWithSpanIds::new())
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(filter);
        tracing_subscriber::registry().with(file_layer).try_init()?;
        tracing::info!(path = %path, "switchyard logging to file");
    } else {
        let sink_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::sink)
            .with_filter(filter);
        tracing_subscriber::registry().with(sink_layer).try_init()?;
    }
    Ok(())
}

/// Strips ANSI escape sequences (CSI) so file logs stay plain text.
struct StripAnsiWriter<W> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> StripAnsiWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::with_capacity(16),
        }
    }

    fn flush_pending(&mut self) -> std::io::Result<()> {
        self.inner.write_all(&self.pending)?;
        self.pending.clear();
        Ok(())
    }
}

impl<W: Write> Write for StripAnsiWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut rest = buf;
        while let Some((&b, tail)) = rest.split_first() {
            match self.pending.len() {
                0 => match rest.iter().position(|&c| c == 0x1b) {
                    Some(i) => {
                        self.inner.write_all(&rest[..i])?;
                        self.pending.push(0x1b);
                        rest = &rest[i + 1..];
                        continue;
                    }
                    None => {
                        self.inner.write_all(rest)?;
                        break;
                    }
                },
                1 => {
                    self.pending.push(b);
                    if b != b'[' {
                        self.flush_pending()?;
                    }
                }
                _ => {
                    if (0x40..=0x7e).contains(&b) {
                        self.pending.clear();
                    } else if b.is_ascii_digit() || matches!(b, b';' | b'?' | b':') {
                        self.pending.push(b);
                        if self.pending.len() > 64 {
                            self.flush_pending()?;
                        }
                    } else {
                        self.pending.push(b);
                        self.flush_pending()?;
                    }
                }
            }
            rest = tail;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.pending.is_empty() {
            self.flush_pending()?;
        }
        self.inner.flush()
    }
}
