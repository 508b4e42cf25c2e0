//! Logging setup: logs go to `LOG_FILE` or nowhere, so stdout carries only results.
//!
//! - **RUST_LOG**: filter, e.g. `info`, `tally=debug`. Default: `info`.
//! - **LOG_FILE**: when set, logs are appended there as plain text (ANSI stripped).

use std::io::Write;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match std::env::var("LOG_FILE") {
        Ok(path) if !path.trim().is_empty() => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            let layer = tracing_subscriber::fmt::layer()
                .event_format(crate::log_format::TextWithSpanIds::new())
                .with_writer(std::sync::Mutex::new(StripAnsiWriter::new(file)))
                .with_ansi(false)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).init();
            tracing::info!(path = %path, "tally logging to file");
        }
        _ => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::sink)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).init();
        }
    }
    Ok(())
}

/// Drops ANSI CSI sequences (`ESC [ params final`) from the byte stream.
///
/// Field values such as model replies may contain escape codes; the file stays plain text.
struct StripAnsiWriter<W> {
    inner: W,
    escape: Escape,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Escape {
    None,
    /// Saw ESC.
    Start,
    /// Inside `ESC [`.
    Csi,
}

impl<W: Write> StripAnsiWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            escape: Escape::None,
        }
    }
}

impl<W: Write> Write for StripAnsiWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut plain = Vec::with_capacity(buf.len());
        for &b in buf {
            self.escape = match (self.escape, b) {
                (Escape::None, 0x1b) => Escape::Start,
                (Escape::None, _) => {
                    plain.push(b);
                    Escape::None
                }
                (Escape::Start, b'[') => Escape::Csi,
                (Escape::Start, _) => {
                    plain.push(0x1b);
                    plain.push(b);
                    Escape::None
                }
                (Escape::Csi, 0x40..=0x7e) => Escape::None,
                (Escape::Csi, _) => Escape::Csi,
            };
        }
        self.inner.write_all(&plain)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(chunks: &[&[u8]]) -> String {
        let mut w = StripAnsiWriter::new(Vec::new());
        for chunk in chunks {
            w.write_all(chunk).unwrap();
        }
        w.flush().unwrap();
        String::from_utf8(w.inner).unwrap()
    }

    #[test]
    fn strips_color_codes() {
        assert_eq!(strip(&[b"\x1b[1;32mINFO\x1b[0m done"]), "INFO done");
    }

    /// **Scenario**: An escape sequence split across two writes is still removed.
    #[test]
    fn strips_sequences_split_across_writes() {
        assert_eq!(strip(&[b"a\x1b[3", b"1mb"]), "ab");
    }

    #[test]
    fn lone_escape_is_kept() {
        assert_eq!(strip(&[b"x\x1bqy"]), "x\x1bqy");
    }
}
