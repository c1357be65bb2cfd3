//! Result sinks: a single overwrite-only slot for the latest label.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Destination for published labels. Each publish replaces the previous one.
pub trait ResultSink: Send {
    fn publish(&mut self, label: &str);

    /// User-facing problem report (e.g. camera access denied).
    fn alert(&mut self, message: &str) {
        tracing::warn!(%message, "alert");
    }
}

/// Rewrites one terminal line with `Detected: <label>`.
pub struct ConsoleSink<W: Write + Send = io::Stdout> {
    out: W,
    /// Set after the first failed write; later failures stay quiet.
    write_failed: bool,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            write_failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn check(&mut self, res: io::Result<()>) {
        if let Err(err) = res {
            if !self.write_failed {
                tracing::debug!(error = %err, "console sink write failed");
                self.write_failed = true;
            }
        }
    }
}

impl<W: Write + Send> ResultSink for ConsoleSink<W> {
    fn publish(&mut self, label: &str) {
        // Trailing spaces wipe a longer previous label.
        let res = write!(self.out, "\rDetected: {label:<12}").and_then(|()| self.out.flush());
        self.check(res);
    }

    fn alert(&mut self, message: &str) {
        let res = writeln!(self.out, "\n[alert] {message}").and_then(|()| self.out.flush());
        self.check(res);
    }
}

/// Latest label in a watch slot; subscribers only ever see the newest value.
pub struct LatestLabel {
    tx: watch::Sender<Option<String>>,
}

impl Default for LatestLabel {
    fn default() -> Self {
        Self::new()
    }
}

impl LatestLabel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Option<String> {
        self.tx.borrow().clone()
    }
}

impl ResultSink for LatestLabel {
    fn publish(&mut self, label: &str) {
        self.tx.send_replace(Some(label.to_string()));
    }
}

#[derive(Debug, Default)]
struct Recorded {
    latest: Option<String>,
    publishes: usize,
    alerts: Vec<String>,
}

/// Cloneable sink that remembers the latest label and counts publishes.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|r| r.latest.clone())
    }

    pub fn publishes(&self) -> usize {
        self.inner.lock().map(|r| r.publishes).unwrap_or(0)
    }

    pub fn alerts(&self) -> Vec<String> {
        self.inner.lock().map(|r| r.alerts.clone()).unwrap_or_default()
    }
}

impl ResultSink for RecordingSink {
    fn publish(&mut self, label: &str) {
        if let Ok(mut r) = self.inner.lock() {
            r.latest = Some(label.to_string());
            r.publishes += 1;
        }
    }

    fn alert(&mut self, message: &str) {
        if let Ok(mut r) = self.inner.lock() {
            r.alerts.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_sink_overwrites_the_same_line() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.publish("sunflower");
        sink.publish("rose");
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.starts_with("\rDetected: sunflower"));
        assert!(text.ends_with(&format!("\rDetected: {:<12}", "rose")));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn console_alert_gets_its_own_line() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.alert("camera busy");
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "\n[alert] camera busy\n");
    }

    struct ClosedPipe {
        attempts: usize,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.attempts += 1;
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn console_write_failures_are_recorded_and_survived() {
        let mut sink = ConsoleSink::new(ClosedPipe { attempts: 0 });
        assert!(!sink.write_failed);
        sink.publish("rose");
        sink.alert("camera busy");
        sink.publish("tulip");
        assert!(sink.write_failed);
        assert_eq!(sink.into_inner().attempts, 3);
    }

    #[tokio::test]
    async fn latest_label_keeps_only_newest() {
        let mut sink = LatestLabel::new();
        let mut rx = sink.subscribe();
        sink.publish("daisy");
        sink.publish("tulip");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_deref(), Some("tulip"));
        assert_eq!(sink.latest().as_deref(), Some("tulip"));
    }

    #[test]
    fn recording_sink_is_shared_between_clones() {
        let sink = RecordingSink::new();
        let mut writer = sink.clone();
        writer.publish("rose");
        writer.publish("rose");
        writer.alert("no camera");
        assert_eq!(sink.latest().as_deref(), Some("rose"));
        assert_eq!(sink.publishes(), 2);
        assert_eq!(sink.alerts(), vec!["no camera".to_string()]);
    }
}
