//! Aggregate counts derived from the registry.

use chrono::{DateTime, Utc};
use homeguard_core::error::Result;
use serde::{Deserialize, Serialize};

use crate::registry::DeviceRegistry;
use crate::store::RegistryStore;

/// Device counts at a point in time. Always recomputed, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkStats {
    pub timestamp: DateTime<Utc>,
    pub total_devices: usize,
    pub online_devices: usize,
    pub offline_devices: usize,
}

impl NetworkStats {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Compute stats for `registry` as of now.
pub fn compute_stats(registry: &DeviceRegistry) -> NetworkStats {
    compute_stats_at(registry, Utc::now())
}

pub fn compute_stats_at(registry: &DeviceRegistry, timestamp: DateTime<Utc>) -> NetworkStats {
    let total_devices = registry.len();
    let online_devices = registry.online_count();

    NetworkStats {
        timestamp,
        total_devices,
        online_devices,
        offline_devices: total_devices - online_devices,
    }
}

/// Stats for whatever is currently persisted in `store`.
pub fn stored_stats<S: RegistryStore + ?Sized>(store: &S) -> NetworkStats {
    compute_stats(&store.load())
}

#[cfg(test)]
mod tests {
    use homeguard_core::{DeviceRecord, DeviceStatus};

    use super::*;
    use crate::store::JsonFileStore;

    fn record(status: DeviceStatus) -> DeviceRecord {
        DeviceRecord {
            address: "10.0.0.1".to_string(),
            mac: None,
            hostname: "host".to_string(),
            vendor: "Unknown".to_string(),
            first_seen: None,
            last_seen: Utc::now(),
            status,
        }
    }

    #[test]
    fn empty_registry_has_zero_counts() {
        let stats = compute_stats(&DeviceRegistry::new());
        assert_eq!(stats.total_devices, 0);
        assert_eq!(stats.online_devices, 0);
        assert_eq!(stats.offline_devices, 0);
    }

    #[test]
    fn counts_add_up() {
        let mut registry = DeviceRegistry::new();
        registry.insert("a", record(DeviceStatus::Online));
        registry.insert("b", record(DeviceStatus::Offline));
        registry.insert("c", record(DeviceStatus::Online));

        let stats = compute_stats(&registry);
        assert_eq!(stats.total_devices, 3);
        assert_eq!(stats.online_devices, 2);
        assert_eq!(stats.offline_devices, 1);
        assert_eq!(
            stats.total_devices,
            stats.online_devices + stats.offline_devices
        );
    }

    #[test]
    fn stats_from_persisted_registry() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("devices.json"));
        let mut registry = DeviceRegistry::new();
        registry.insert("a", record(DeviceStatus::Offline));
        store.save(&registry).unwrap();

        let stats = stored_stats(&store);
        assert_eq!(stats.total_devices, 1);
        assert_eq!(stats.offline_devices, 1);
    }

    #[test]
    fn stats_json_uses_original_keys() {
        let stats = compute_stats(&DeviceRegistry::new());
        let json = stats.to_json_pretty().unwrap();
        assert!(json.contains("\"total_devices\": 0"));
        assert!(json.contains("\"online_devices\": 0"));
        assert!(json.contains("\"timestamp\""));
    }
}
