//! Plain-text event formatter that tags each line with the analysis it belongs to.
//!
//! Every question runs inside an `analysis` span (see `main::run_query`); the root span id
//! becomes `run_id`, so interleaved file logs can be split per question.

use std::fmt;

use tracing_core::Subscriber;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// `TIMESTAMP run_id=R span_id=S span=NAME LEVEL: target: fields`.
///
/// Events outside any span omit the `run_id`/`span_id`/`span` part.
#[derive(Default)]
pub struct TextWithSpanIds {
    timer: SystemTime,
}

impl TextWithSpanIds {
    pub fn new() -> Self {
        Self::default()
    }
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
        if let Some(span) = ctx.parent_span() {
            let span_id = span.id().into_u64();
            let run_id = span
                .scope()
                .from_root()
                .next()
                .map(|root| root.id().into_u64())
                .unwrap_or(span_id);
            write!(
                writer,
                " run_id={} span_id={} span={}",
                run_id,
                span_id,
                span.name()
            )?;
        }
        write!(
            writer,
            " {}: {}: ",
            event.metadata().level(),
            event.metadata().target()
        )?;
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
        let bytes = sink.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn events_inside_analysis_span_carry_run_id() {
        let output = capture(|| {
            let span = tracing::info_span!("analysis", turn = 1);
            let _guard = span.enter();
            tracing::info!(node = "execute_query", "node done");
        });
        assert!(output.contains("run_id="));
        assert!(output.contains("span=analysis"));
        assert!(output.contains("INFO"));
        assert!(output.contains("node done"));
        assert!(output.contains("node=\"execute_query\""));
    }

    #[test]
    fn events_outside_spans_have_no_ids() {
        let output = capture(|| tracing::warn!("bare"));
        assert!(!output.contains("run_id="));
        assert!(output.contains("WARN"));
        assert!(output.contains("bare"));
    }
}
