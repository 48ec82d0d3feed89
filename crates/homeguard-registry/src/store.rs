//! Registry storage: the store trait and a JSON file implementation.
//!
//! The whole registry is rewritten every cycle. The file implementation
//! writes to a sibling temp file and renames it over the target, so a crash
//! mid-write leaves the previous registry intact.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::registry::DeviceRegistry;

/// Errors that can occur during registry storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt registry file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for registry persistence backends.
pub trait RegistryStore {
    /// Read the stored registry. `Ok(None)` means nothing has been stored yet.
    fn read(&self) -> Result<Option<DeviceRegistry>, StoreError>;

    /// Replace the stored registry with `registry`.
    fn save(&self, registry: &DeviceRegistry) -> Result<(), StoreError>;

    /// Load the registry, starting fresh if it is missing or unreadable.
    ///
    /// Never fails: an unreadable file is logged and treated as empty. The
    /// read error is handed back for callers that report it further.
    fn load_or_fresh(&self) -> (DeviceRegistry, Option<StoreError>) {
        match self.read() {
            Ok(registry) => (registry.unwrap_or_default(), None),
            Err(e) => {
                tracing::warn!(error = %e, "Device registry unreadable, starting fresh");
                (DeviceRegistry::new(), Some(e))
            }
        }
    }

    /// [`load_or_fresh`](Self::load_or_fresh) without the error.
    fn load(&self) -> DeviceRegistry {
        self.load_or_fresh().0
    }
}

/// File-system backed registry store.
///
/// Stores the registry as a pretty-printed JSON object keyed by identity:
/// ```text
/// {
///   "aa:bb:cc:dd:ee:01": { "ip": "192.168.1.10", "hostname": "nas.lan", ... }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "devices.json".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl RegistryStore for JsonFileStore {
    fn read(&self) -> Result<Option<DeviceRegistry>, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, registry: &DeviceRegistry) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }

        let json = serde_json::to_string_pretty(registry)?;
        let tmp = self.temp_path();

        let mut file = File::create(&tmp).map_err(|e| self.io_error(&tmp, e))?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| self.io_error(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            devices = registry.len(),
            "Device registry saved"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use homeguard_core::{DeviceRecord, DeviceStatus};

    use super::*;

    fn sample_registry() -> DeviceRegistry {
        let seen = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 15).unwrap();
        let mut registry = DeviceRegistry::new();
        registry.insert(
            "AA:BB:CC:DD:EE:01",
            DeviceRecord {
                address: "192.168.1.10".to_string(),
                mac: Some("AA:BB:CC:DD:EE:01".to_string()),
                hostname: "nas.lan".to_string(),
                vendor: "Synology".to_string(),
                first_seen: Some(seen),
                last_seen: seen,
                status: DeviceStatus::Online,
            },
        );
        registry.insert(
            "192.168.1.44",
            DeviceRecord {
                address: "192.168.1.44".to_string(),
                mac: None,
                hostname: "192.168.1.44".to_string(),
                vendor: "Unknown".to_string(),
                first_seen: None,
                last_seen: seen,
                status: DeviceStatus::Offline,
            },
        );
        registry
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("devices.json"));
        let registry = sample_registry();

        store.save(&registry).unwrap();
        let loaded = store.read().unwrap().unwrap();

        assert_eq!(loaded, registry);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("devices.json"));

        assert!(store.read().unwrap().is_none());
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.json");
        fs::write(&path, "{ \"AA:BB\": { \"ip\": ").unwrap();
        let store = JsonFileStore::new(&path);

        assert!(matches!(store.read(), Err(StoreError::Corrupt { .. })));
        assert!(store.load().is_empty());

        let (registry, error) = store.load_or_fresh();
        assert!(registry.is_empty());
        assert!(matches!(error, Some(StoreError::Corrupt { .. })));
    }

    #[test]
    fn missing_file_reports_no_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("devices.json"));

        let (registry, error) = store.load_or_fresh();
        assert!(registry.is_empty());
        assert!(error.is_none());
    }

    #[test]
    fn reads_legacy_registry_file() {
        // arp-scan entries keyed by lower-case MAC, nmap entries keyed by IP
        // without mac or vendor; naive local timestamps.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.json");
        fs::write(
            &path,
            r#"{
  "aa:bb:cc:dd:ee:01": {
    "ip": "192.168.1.10",
    "mac": "aa:bb:cc:dd:ee:01",
    "hostname": "nas.lan",
    "vendor": "Synology Incorporated",
    "last_seen": "2026-03-01T10:00:00.123456",
    "status": "online"
  },
  "192.168.1.44": {
    "ip": "192.168.1.44",
    "hostname": "192.168.1.44",
    "last_seen": "2026-03-01T09:58:12",
    "status": "offline"
  }
}"#,
        )
        .unwrap();
        let store = JsonFileStore::new(&path);

        let registry = store.read().unwrap().unwrap();
        assert_eq!(registry.len(), 2);

        let nas = registry.get("AA:BB:CC:DD:EE:01").unwrap();
        assert_eq!(nas.vendor, "Synology Incorporated");
        assert!(nas.is_online());
        assert_eq!(nas.first_seen, None);

        let other = registry.get("192.168.1.44").unwrap();
        assert_eq!(other.vendor, "Unknown");
        assert_eq!(other.mac, None);
        assert_eq!(other.status, DeviceStatus::Offline);

        store.save(&registry).unwrap();
        assert_eq!(store.read().unwrap().unwrap(), registry);
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("devices.json");
        let store = JsonFileStore::new(&path);

        store.save(&sample_registry()).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("data/nested/.devices.json.tmp").exists());
    }

    #[test]
    fn save_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("devices.json"));

        store.save(&sample_registry()).unwrap();
        store.save(&DeviceRegistry::new()).unwrap();

        let loaded = store.read().unwrap().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap().trim(), "{}");
    }

    #[test]
    fn save_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let store = JsonFileStore::new(blocker.join("devices.json"));

        let result = store.save(&sample_registry());
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }

    #[test]
    fn file_is_keyed_by_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("devices.json"));
        store.save(&sample_registry()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["aa:bb:cc:dd:ee:01"]["ip"], "192.168.1.10");
        assert_eq!(raw["192.168.1.44"]["status"], "offline");
    }
}
