//! Execution trace capture
//!
//! A `tracing-subscriber` layer that buffers the events emitted while a capture
//! window is open. Installed next to the fmt layer by the binary.

use std::fmt::{self, Write as _};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::error::{AdminError, Result};

/// Upper bound on buffered events per capture.
pub const MAX_CAPTURED_EVENTS: usize = 100_000;

/// Buffers formatted events while a capture is running.
#[derive(Clone, Default)]
pub struct TraceRecorder {
    buffer: Arc<Mutex<Option<Vec<String>>>>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a capture window. Fails if one is already open.
    pub fn begin(&self) -> Result<()> {
        let mut buffer = self.buffer.lock();
        if buffer.is_some() {
            return Err(AdminError::Busy(
                "execution trace already in progress".to_string(),
            ));
        }
        *buffer = Some(Vec::new());
        Ok(())
    }

    /// Closes the window and returns what was recorded.
    pub fn finish(&self) -> Vec<String> {
        self.buffer.lock().take().unwrap_or_default()
    }

    pub fn is_capturing(&self) -> bool {
        self.buffer.lock().is_some()
    }

    /// Records every event emitted during `window`.
    ///
    /// Dropping the future before the window ends closes the capture and
    /// discards what was buffered.
    pub async fn capture(&self, window: Duration) -> Result<Vec<String>> {
        self.begin()?;
        let open = OpenWindow(self);
        tokio::time::sleep(window).await;
        let events = self.finish();
        drop(open);
        Ok(events)
    }
}

/// Closes a capture window when dropped.
struct OpenWindow<'a>(&'a TraceRecorder);

impl Drop for OpenWindow<'_> {
    fn drop(&mut self) {
        self.0.buffer.lock().take();
    }
}

impl<S> Layer<S> for TraceRecorder
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut buffer = self.buffer.lock();
        let Some(events) = buffer.as_mut() else {
            return;
        };
        if events.len() >= MAX_CAPTURED_EVENTS {
            return;
        }

        let meta = event.metadata();
        let mut line = format!(
            "{} {} {}:",
            chrono::Utc::now().to_rfc3339(),
            meta.level(),
            meta.target()
        );
        event.record(&mut FieldWriter(&mut line));
        events.push(line);
    }
}

struct FieldWriter<'a>(&'a mut String);

impl Visit for FieldWriter<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            let _ = write!(self.0, " {value}");
        } else {
            let _ = write!(self.0, " {}={value:?}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, " {value:?}");
        } else {
            let _ = write!(self.0, " {}={value:?}", field.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    fn with_recorder<F: FnOnce()>(recorder: &TraceRecorder, f: F) {
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn test_records_only_inside_window() {
        let recorder = TraceRecorder::new();
        with_recorder(&recorder, || {
            tracing::info!("before");
            recorder.begin().unwrap();
            tracing::info!(proxy = "ssh", "proxy started");
            tracing::warn!("heartbeat late");
        });
        let events = recorder.finish();
        with_recorder(&recorder, || tracing::info!("after"));

        assert_eq!(events.len(), 2);
        assert!(events[0].contains("INFO"));
        assert!(events[0].contains("proxy started"));
        assert!(events[0].contains("proxy=\"ssh\""));
        assert!(events[1].contains("WARN"));
        assert!(!recorder.is_capturing());
    }

    #[test]
    fn test_second_capture_is_busy() {
        let recorder = TraceRecorder::new();
        recorder.begin().unwrap();
        assert!(matches!(recorder.begin(), Err(AdminError::Busy(_))));
        recorder.finish();
        assert!(recorder.begin().is_ok());
    }

    #[tokio::test]
    async fn test_dropped_capture_closes_window() {
        let recorder = TraceRecorder::new();
        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), recorder.capture(Duration::from_secs(1)))
                .await;
        assert!(abandoned.is_err());

        assert!(!recorder.is_capturing());
        assert!(recorder.capture(Duration::from_millis(10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_capture_releases_window() {
        let recorder = TraceRecorder::new();
        let events = recorder.capture(Duration::from_millis(10)).await.unwrap();
        assert!(events.is_empty());
        assert!(!recorder.is_capturing());
    }
}
