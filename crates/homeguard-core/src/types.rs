//! Core domain types for the HomeGuard device inventory.
//!
//! A `DeviceRecord` is what the registry persists for every endpoint ever
//! observed. An `ObservedDevice` is one raw entry of a `ScanSnapshot`, as
//! produced by a scanner adapter before it is merged into the registry.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HomeguardError, Result};

/// Vendor label used when a scanner reports no manufacturer.
pub const UNKNOWN_VENDOR: &str = "Unknown";

// ── Device Record ─────────────────────────────────────────────────

/// Reachability of a known device as of the latest scan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
}

impl DeviceStatus {
    pub fn is_online(self) -> bool {
        self == Self::Online
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => f.write_str("online"),
            Self::Offline => f.write_str("offline"),
        }
    }
}

/// One physical network endpoint ever observed.
///
/// The record's identity is the registry key, not a field: it never changes
/// once assigned, while `address` follows the device across DHCP leases.
/// Field names on disk are `ip`, `mac`, `hostname`, `vendor`, `last_seen`,
/// `status`; unknown fields are ignored on read. Timestamps are written as
/// RFC 3339 and also read in the naive local form of older files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Most recent network address.
    #[serde(rename = "ip")]
    pub address: String,
    /// Hardware address, when the scanner reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    /// Resolved name at first sighting (the raw address if resolution failed).
    pub hostname: String,
    #[serde(default = "default_vendor")]
    pub vendor: String,
    /// Absent in files written before first-seen tracking existed.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::timestamp::deserialize_option"
    )]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub last_seen: DateTime<Utc>,
    pub status: DeviceStatus,
}

impl DeviceRecord {
    /// Build a fresh online record from a scan entry observed at `seen_at`.
    ///
    /// Without a resolved hostname the record is named by its network
    /// address, or by its hardware address for a MAC-only entry.
    pub fn from_observed(device: &ObservedDevice, seen_at: DateTime<Utc>) -> Self {
        let address = device.address().unwrap_or_default().to_string();
        let hostname = device
            .hostname
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(String::from)
            .or_else(|| device.address().or(device.mac()).map(String::from))
            .unwrap_or_default();

        Self {
            address,
            mac: device.mac().map(String::from),
            hostname,
            vendor: device.vendor().to_string(),
            first_seen: Some(seen_at),
            last_seen: seen_at,
            status: DeviceStatus::Online,
        }
    }

    pub fn is_online(&self) -> bool {
        self.status.is_online()
    }
}

fn default_vendor() -> String {
    UNKNOWN_VENDOR.to_string()
}

// ── Scan Snapshot ─────────────────────────────────────────────────

/// A single device seen by one discovery pass.
///
/// Either address may be missing; an entry without both has no usable
/// identity and is rejected by [`ObservedDevice::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObservedDevice {
    pub address: Option<String>,
    pub mac: Option<String>,
    pub vendor: Option<String>,
    pub hostname: Option<String>,
}

impl ObservedDevice {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Default::default()
        }
    }

    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = Some(mac.into());
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Network address, ignoring blank values.
    pub fn address(&self) -> Option<&str> {
        non_blank(self.address.as_deref())
    }

    /// Hardware address, ignoring blank values.
    pub fn mac(&self) -> Option<&str> {
        non_blank(self.mac.as_deref())
    }

    /// Vendor label, falling back to [`UNKNOWN_VENDOR`].
    pub fn vendor(&self) -> &str {
        non_blank(self.vendor.as_deref()).unwrap_or(UNKNOWN_VENDOR)
    }

    /// Registry key: the hardware address when known, else the network address.
    ///
    /// The fallback means a device without a reported MAC gets a new identity
    /// whenever its address changes.
    pub fn identity(&self) -> Option<&str> {
        self.mac().or_else(|| self.address())
    }

    /// Return the identity, or an error if the entry cannot be keyed.
    pub fn validate(&self) -> Result<&str> {
        self.identity().ok_or_else(|| {
            HomeguardError::InvalidScanRecord(
                "entry has neither a hardware address nor a network address".to_string(),
            )
        })
    }
}

/// Canonical registry key for an identity.
///
/// Hardware addresses are compared case-insensitively: arp-scan reports them
/// in lower case, nmap in upper case. Keys are stored lower-cased.
pub fn identity_key(identity: &str) -> String {
    identity.trim().to_ascii_lowercase()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The ephemeral result of one discovery pass. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSnapshot {
    /// Observation time applied as `last_seen` to every matched record.
    pub observed_at: DateTime<Utc>,
    pub devices: Vec<ObservedDevice>,
}

impl ScanSnapshot {
    pub fn at(observed_at: DateTime<Utc>, devices: Vec<ObservedDevice>) -> Self {
        Self {
            observed_at,
            devices,
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
