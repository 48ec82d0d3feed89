//! Event sinks: structured logs and the plain-text activity log.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use homeguard_core::events::MonitorEvent;

/// Receives every event the monitor emits.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &MonitorEvent);

    /// A free-form line that is not tied to an event (startup, shutdown).
    fn note(&self, message: &str);
}

/// Forwards events to `tracing`.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &MonitorEvent) {
        let json = serde_json::to_value(&event.payload).unwrap_or_default();
        if event.payload.is_error() {
            tracing::warn!(event_id = %event.id.0, payload = %json, "{}", event.payload.message());
        } else {
            tracing::debug!(event_id = %event.id.0, payload = %json, "{}", event.payload.message());
        }
    }

    fn note(&self, message: &str) {
        tracing::info!("{message}");
    }
}

/// Appends `[YYYY-MM-DD HH:MM:SS] message` lines to a file, in local time.
///
/// Write failures are logged and otherwise ignored.
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, at: DateTime<Utc>, message: &str) {
        let line = format_line(at, message);
        if let Err(e) = self.try_append(&line) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write activity log");
        }
    }

    fn try_append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl EventSink for ActivityLog {
    fn emit(&self, event: &MonitorEvent) {
        self.append(event.timestamp, &event.payload.message());
    }

    fn note(&self, message: &str) {
        self.append(Utc::now(), message);
    }
}

fn format_line(at: DateTime<Utc>, message: &str) -> String {
    format!(
        "[{}] {message}\n",
        at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    )
}
