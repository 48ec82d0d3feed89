//! Event types emitted by the monitor.
//!
//! Events are handed to the configured sinks (structured logs and the
//! plain-text activity log) at the end of each reconciliation cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// An event emitted by the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorEvent {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl MonitorEvent {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// The event payload, tagged by type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event_type")]
pub enum EventPayload {
    // ── Registry events ───────────────────────────────────────
    /// An identity was seen for the first time.
    DeviceDiscovered {
        identity: String,
        address: String,
        hostname: String,
        vendor: String,
    },
    /// A device that was online is absent from the latest scan.
    DeviceOffline {
        identity: String,
        address: String,
        hostname: String,
        last_seen: DateTime<Utc>,
    },
    /// A scan entry was skipped because it had no usable identity.
    InvalidScanRecord { reason: String },

    // ── Error events ──────────────────────────────────────────
    /// The scan producer failed; the cycle continued with an empty snapshot.
    ScanFailed { scan_id: Uuid, error: String },
    /// The registry could not be read or written.
    RegistryError { error: String },

    // ── Lifecycle events ──────────────────────────────────────
    /// A scan pass started.
    ScanStarted { scan_id: Uuid, network: String },
    /// A full cycle completed.
    ScanCompleted {
        scan_id: Uuid,
        devices_seen: usize,
        new_devices: usize,
        went_offline: usize,
        online: usize,
        offline: usize,
        duration_ms: u64,
    },
}

impl EventPayload {
    /// Whether this event reports a failure rather than a state change.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidScanRecord { .. } | Self::ScanFailed { .. } | Self::RegistryError { .. }
        )
    }

    /// One human-readable line describing the event.
    pub fn message(&self) -> String {
        match self {
            Self::DeviceDiscovered {
                hostname, address, ..
            } => format!("New device detected: {hostname} ({address})"),
            Self::DeviceOffline {
                hostname, address, ..
            } => format!("Device went offline: {hostname} ({address})"),
            Self::InvalidScanRecord { reason } => format!("Skipped scan entry: {reason}"),
            Self::ScanFailed { error, .. } => format!("Network scan error: {error}"),
            Self::RegistryError { error } => format!("Device registry error: {error}"),
            Self::ScanStarted { network, .. } => format!("Scanning network: {network}"),
            Self::ScanCompleted {
                devices_seen,
                online,
                offline,
                ..
            } => format!(
                "Found {devices_seen} active devices; network stats: {online} online, {offline} offline"
            ),
        }
    }
}
