//! Configuration for the homeguard-netmon daemon.

use std::path::PathBuf;
use std::time::Duration;

use ipnet::IpNet;
use serde::Deserialize;

use crate::error::{NetmonError, Result};

/// Top-level monitor configuration.
///
/// Loaded from `homeguard.toml` `[netmon]` section or
/// `HOMEGUARD_NETMON__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct NetmonConfig {
    /// Directory holding the registry and the activity log (default: "/data").
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Registry file name inside `data_dir`.
    #[serde(default = "default_devices_file")]
    pub devices_file: String,

    /// Activity log file name inside `data_dir`.
    #[serde(default = "default_activity_log")]
    pub activity_log: String,

    /// Seconds between scan cycles.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Path to the arp-scan binary.
    #[serde(default = "default_arp_scan_path")]
    pub arp_scan_path: String,

    #[serde(default = "default_arp_scan_timeout")]
    pub arp_scan_timeout_secs: u64,

    /// Path to the nmap binary, used when arp-scan is not installed.
    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    #[serde(default = "default_nmap_timeout")]
    pub nmap_timeout_secs: u64,

    /// Reverse-resolve hostnames of newly seen devices.
    #[serde(default = "default_true")]
    pub resolve_hostnames: bool,

    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_ms: u64,

    /// CIDR to scan; derived from the local address (as a /24) when unset.
    #[serde(default)]
    pub network: Option<String>,
}

impl NetmonConfig {
    pub fn devices_path(&self) -> PathBuf {
        self.data_dir.join(&self.devices_file)
    }

    pub fn activity_log_path(&self) -> PathBuf {
        self.data_dir.join(&self.activity_log)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    /// The configured network override, if any.
    pub fn network_override(&self) -> Result<Option<IpNet>> {
        self.network
            .as_deref()
            .map(|cidr| {
                cidr.trim()
                    .parse::<IpNet>()
                    .map(|net| net.trunc())
                    .map_err(|e| NetmonError::Config(format!("invalid network {cidr:?}: {e}")))
            })
            .transpose()
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data")
}

fn default_devices_file() -> String {
    "devices.json".to_string()
}

fn default_activity_log() -> String {
    "network_activity.log".to_string()
}

fn default_scan_interval() -> u64 {
    60
}

fn default_arp_scan_path() -> String {
    "arp-scan".to_string()
}

fn default_arp_scan_timeout() -> u64 {
    30
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_nmap_timeout() -> u64 {
    60
}

fn default_resolve_timeout() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

impl Default for NetmonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            devices_file: default_devices_file(),
            activity_log: default_activity_log(),
            scan_interval_secs: default_scan_interval(),
            arp_scan_path: default_arp_scan_path(),
            arp_scan_timeout_secs: default_arp_scan_timeout(),
            nmap_path: default_nmap_path(),
            nmap_timeout_secs: default_nmap_timeout(),
            resolve_hostnames: default_true(),
            resolve_timeout_ms: default_resolve_timeout(),
            network: None,
        }
    }
}

/// Load `[netmon]` from `<file_prefix>.toml` and `HOMEGUARD_NETMON__*`.
///
/// A missing file or section yields the defaults.
pub fn load_netmon_config(file_prefix: &str) -> Result<NetmonConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("HOMEGUARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| NetmonError::Config(e.to_string()))?;

    match cfg.get::<NetmonConfig>("netmon") {
        Ok(c) => Ok(c),
        Err(e) => {
            tracing::debug!(error = %e, "No usable [netmon] section, using defaults");
            Ok(NetmonConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NetmonConfig::default();
        assert_eq!(config.devices_path(), PathBuf::from("/data/devices.json"));
        assert_eq!(
            config.activity_log_path(),
            PathBuf::from("/data/network_activity.log")
        );
        assert_eq!(config.scan_interval(), Duration::from_secs(60));
        assert_eq!(config.arp_scan_timeout_secs, 30);
        assert_eq!(config.nmap_timeout_secs, 60);
        assert!(config.resolve_hostnames);
        assert!(config.network_override().unwrap().is_none());
    }

    #[test]
    fn test_network_override_is_truncated() {
        let config = NetmonConfig {
            network: Some("192.168.1.77/24".to_string()),
            ..Default::default()
        };
        let net = config.network_override().unwrap().unwrap();
        assert_eq!(net.to_string(), "192.168.1.0/24");
    }

    #[test]
    fn test_invalid_network_override() {
        let config = NetmonConfig {
            network: Some("not-a-cidr".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.network_override(),
            Err(NetmonError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("homeguard");
        std::fs::write(
            dir.path().join("homeguard.toml"),
            "[netmon]\ndata_dir = \"/tmp/hg\"\nscan_interval_secs = 120\nresolve_hostnames = false\n",
        )
        .unwrap();

        let config = load_netmon_config(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/hg"));
        assert_eq!(config.scan_interval_secs, 120);
        assert!(!config.resolve_hostnames);
        assert_eq!(config.devices_file, "devices.json");
    }
}
