//! Reconciliation: merge a scan snapshot into the device registry.
//!
//! Each entry of the snapshot is keyed by its identity. Known identities are
//! refreshed (address, last_seen, status), unknown ones are inserted. Any
//! remaining online record whose address was not seen in the snapshot goes
//! offline. Nothing is ever removed.

use std::collections::HashSet;

use homeguard_core::events::EventPayload;
use homeguard_core::{identity_key, DeviceRecord, DeviceStatus, ScanSnapshot};

use crate::registry::DeviceRegistry;

/// The outcome of one reconciliation.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Every record: new, refreshed, and untouched.
    pub registry: DeviceRegistry,
    /// New-device, offline, and invalid-entry events, in emission order.
    pub events: Vec<EventPayload>,
    pub summary: ReconcileSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub scanned: usize,
    pub new_count: usize,
    pub updated_count: usize,
    pub offline_count: usize,
    pub skipped_count: usize,
}

/// Merge `snapshot` into `registry`.
///
/// Hostname and vendor are kept from the first sighting; a refreshed record
/// only gets a new address, `last_seen`, and `status = online`. A record
/// that is already offline is left alone, so re-running with the same
/// snapshot emits no further events.
pub fn reconcile(mut registry: DeviceRegistry, snapshot: &ScanSnapshot) -> Reconciliation {
    let mut events = Vec::new();
    let mut summary = ReconcileSummary {
        scanned: snapshot.len(),
        ..Default::default()
    };
    let mut touched: HashSet<String> = HashSet::new();

    if snapshot.is_empty() {
        tracing::debug!(known = registry.len(), "Empty scan snapshot");
    }

    for device in &snapshot.devices {
        let identity = match device.validate() {
            Ok(id) => identity_key(id),
            Err(e) => {
                tracing::warn!(error = %e, vendor = device.vendor(), "Skipping scan entry");
                events.push(EventPayload::InvalidScanRecord {
                    reason: e.to_string(),
                });
                summary.skipped_count += 1;
                continue;
            }
        };

        match registry.get_mut(&identity) {
            Some(record) => {
                // A MAC-only entry keeps the last known address.
                if let Some(address) = device.address() {
                    record.address = address.to_string();
                }
                record.last_seen = snapshot.observed_at;
                record.status = DeviceStatus::Online;
                summary.updated_count += 1;
            }
            None => {
                let record = DeviceRecord::from_observed(device, snapshot.observed_at);
                tracing::info!(
                    identity = %identity,
                    address = %record.address,
                    hostname = %record.hostname,
                    vendor = %record.vendor,
                    "New device detected"
                );
                events.push(EventPayload::DeviceDiscovered {
                    identity: identity.clone(),
                    address: record.address.clone(),
                    hostname: record.hostname.clone(),
                    vendor: record.vendor.clone(),
                });
                registry.insert(&identity, record);
                summary.new_count += 1;
            }
        }

        touched.insert(identity);
    }

    let seen_addresses: HashSet<&str> = snapshot
        .devices
        .iter()
        .filter_map(|d| d.address())
        .collect();

    for (identity, record) in registry.iter_mut() {
        if touched.contains(identity)
            || !record.is_online()
            || seen_addresses.contains(record.address.as_str())
        {
            continue;
        }

        record.status = DeviceStatus::Offline;
        tracing::info!(
            identity = %identity,
            address = %record.address,
            hostname = %record.hostname,
            "Device went offline"
        );
        events.push(EventPayload::DeviceOffline {
            identity: identity.clone(),
            address: record.address.clone(),
            hostname: record.hostname.clone(),
            last_seen: record.last_seen,
        });
        summary.offline_count += 1;
    }

    Reconciliation {
        registry,
        events,
        summary,
    }
}
