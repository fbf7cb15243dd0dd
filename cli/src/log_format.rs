//! Plain-text event formatter that tags each line with the graph run and node spans.
//!
//! Graph runs open a `graph_run` span and every node runs inside a `node` span, so file logs
//! can be grouped by run (`trace_id`, the root span) and by node (`span_id`).

use std::fmt;

use tracing_core::Subscriber;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::{LookupSpan, SpanRef};

/// Output format: `TIMESTAMP trace_id=X span_id=Y [span] LEVEL target: fields` inside a span;
/// `TIMESTAMP LEVEL target: fields` outside of one.
pub struct TextWithSpanIds {
    timer: SystemTime,
}

impl TextWithSpanIds {
    pub fn new() -> Self {
        Self { timer: SystemTime }
    }
}

/// `(trace_id, span_id, span name)` of the innermost span; the trace id is the root span's id.
fn span_ids<S>(span: &SpanRef<'_, S>) -> (u64, u64, &'static str)
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let span_id = span.id().into_u64();
    let trace_id = span
        .scope()
        .from_root()
        .next()
        .map_or(span_id, |root| root.id().into_u64());
    (trace_id, span_id, span.name())
}

impl<S, N> FormatEvent<S, N> for TextWithSpanIds
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing_core::Event<'_>,
    ) -> fmt::Result {
        self.timer.format_time(&mut writer)?;
        if let Some((trace_id, span_id, name)) = ctx.parent_span().as_ref().map(span_ids) {
            write!(writer, " trace_id={trace_id} span_id={span_id} [{name}]")?;
        }
        let meta = event.metadata();
        write!(writer, " {}: {}: ", meta.level(), meta.target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone)]
    struct VecWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for VecWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let sink = Arc::new(Mutex::new(Vec::<u8>::new()));
        let writer = {
            let sink = Arc::clone(&sink);
            move || VecWriter(Arc::clone(&sink))
        };
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(TextWithSpanIds::new())
                .with_writer(writer)
                .with_ansi(false),
        );
        tracing::subscriber::with_default(subscriber, f);
        let out = sink.lock().unwrap().clone();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn node_events_carry_run_and_node_span() {
        let output = capture(|| {
            let run = tracing::info_span!("graph_run");
            let _run = run.enter();
            let node = tracing::info_span!("node", node_id = "agent");
            let _node = node.enter();
            tracing::info!(tool = "get_current_weather", "calling tool");
        });
        assert!(output.contains("trace_id="), "{}", output);
        assert!(output.contains("[node]"), "{}", output);
        assert!(output.contains("INFO"), "{}", output);
        assert!(output.contains("calling tool"), "{}", output);
        assert!(output.contains("tool=\"get_current_weather\""), "{}", output);
    }

    #[test]
    fn events_outside_spans_have_no_ids() {
        let output = capture(|| tracing::warn!("loose event"));
        assert!(!output.contains("trace_id="), "{}", output);
        assert!(output.contains("WARN"), "{}", output);
    }
}
