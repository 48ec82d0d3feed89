//! Scan producers.
//!
//! A [`ScanProducer`] yields the devices currently reachable on the local
//! segment. The concrete producers run an external discovery tool as a
//! child process via `tokio::process::Command` and parse its output.

use std::io::ErrorKind;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use homeguard_core::ObservedDevice;
use ipnet::IpNet;
use tokio::process::Command;

use crate::arp_scan;
use crate::config::NetmonConfig;
use crate::error::{NetmonError, Result};
use crate::nmap_xml;

/// Source of scan snapshots.
#[async_trait]
pub trait ScanProducer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Discover the devices currently reachable on `network`.
    async fn scan(&self, network: &IpNet) -> Result<Vec<ObservedDevice>>;
}

/// Run an external tool to completion and return its stdout.
///
/// The child is killed if it outlives `timeout_secs`.
pub(crate) async fn run_tool(
    tool: &'static str,
    path: &str,
    args: &[&str],
    timeout_secs: u64,
) -> Result<Vec<u8>> {
    let mut cmd = Command::new(path);
    cmd.args(args).kill_on_drop(true);

    let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output()).await
    {
        Err(_) => {
            return Err(NetmonError::ToolTimeout {
                tool,
                secs: timeout_secs,
            })
        }
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
            return Err(NetmonError::ToolNotFound {
                tool,
                path: path.to_string(),
            })
        }
        Ok(Err(e)) => return Err(e.into()),
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        return Err(NetmonError::ToolFailed {
            tool,
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}

/// `arp-scan --localnet`: fast layer-2 sweep with MAC vendors.
pub struct ArpScanProducer {
    path: String,
    timeout_secs: u64,
}

impl ArpScanProducer {
    pub fn new(path: &str, timeout_secs: u64) -> Self {
        Self {
            path: path.to_string(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl ScanProducer for ArpScanProducer {
    fn name(&self) -> &'static str {
        "arp-scan"
    }

    async fn scan(&self, _network: &IpNet) -> Result<Vec<ObservedDevice>> {
        let stdout = run_tool(
            "arp-scan",
            &self.path,
            &["--localnet", "--quiet"],
            self.timeout_secs,
        )
        .await?;

        Ok(arp_scan::parse_arp_scan(&String::from_utf8_lossy(&stdout)))
    }
}

/// `nmap -sn`: ping sweep of the given network, XML on stdout.
pub struct NmapProducer {
    path: String,
    timeout_secs: u64,
}

impl NmapProducer {
    pub fn new(path: &str, timeout_secs: u64) -> Self {
        Self {
            path: path.to_string(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl ScanProducer for NmapProducer {
    fn name(&self) -> &'static str {
        "nmap"
    }

    async fn scan(&self, network: &IpNet) -> Result<Vec<ObservedDevice>> {
        let target = network.to_string();
        let stdout = run_tool(
            "nmap",
            &self.path,
            &["-sn", "-oX", "-", "--noninteractive", target.as_str()],
            self.timeout_secs,
        )
        .await?;

        let run = nmap_xml::parse_nmap_xml(&stdout)?;
        Ok(run
            .hosts
            .iter()
            .filter(|h| h.is_up())
            .map(|h| ObservedDevice {
                address: h.ipv4().map(String::from),
                mac: h.mac().map(str::to_ascii_lowercase),
                vendor: h.mac_vendor().map(String::from),
                hostname: h.hostname().map(String::from),
            })
            .collect())
    }
}

/// Try `primary`; if its tool is not installed, use `fallback`.
///
/// Only a missing tool triggers the fallback. A timeout or a failed run of
/// the primary is returned as is.
pub struct FallbackProducer {
    primary: Box<dyn ScanProducer>,
    fallback: Box<dyn ScanProducer>,
}

impl FallbackProducer {
    pub fn new(primary: Box<dyn ScanProducer>, fallback: Box<dyn ScanProducer>) -> Self {
        Self { primary, fallback }
    }

    /// arp-scan with nmap as fallback, as configured.
    pub fn from_config(config: &NetmonConfig) -> Self {
        Self::new(
            Box::new(ArpScanProducer::new(
                &config.arp_scan_path,
                config.arp_scan_timeout_secs,
            )),
            Box::new(NmapProducer::new(
                &config.nmap_path,
                config.nmap_timeout_secs,
            )),
        )
    }
}

#[async_trait]
impl ScanProducer for FallbackProducer {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn scan(&self, network: &IpNet) -> Result<Vec<ObservedDevice>> {
        let start = Instant::now();

        let devices = match self.primary.scan(network).await {
            Err(NetmonError::ToolNotFound { path, .. }) => {
                tracing::warn!(
                    tool = self.primary.name(),
                    path = %path,
                    fallback = self.fallback.name(),
                    "Scanner not installed, using fallback"
                );
                self.fallback.scan(network).await?
            }
            other => other?,
        };

        tracing::info!(
            network = %network,
            devices = devices.len(),
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Network scan complete"
        );

        Ok(devices)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct Fixed {
        name: &'static str,
        result: fn() -> Result<Vec<ObservedDevice>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ScanProducer for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn scan(&self, _network: &IpNet) -> Result<Vec<ObservedDevice>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn net() -> IpNet {
        "192.168.1.0/24".parse().unwrap()
    }

    fn fallback_pair(
        primary: fn() -> Result<Vec<ObservedDevice>>,
    ) -> (FallbackProducer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = FallbackProducer::new(
            Box::new(Fixed {
                name: "primary",
                result: primary,
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(Fixed {
                name: "fallback",
                result: || Ok(vec![ObservedDevice::new("192.168.1.9")]),
                calls: calls.clone(),
            }),
        );
        (producer, calls)
    }

    #[tokio::test]
    async fn test_missing_tool_uses_fallback() {
        let (producer, fallback_calls) = fallback_pair(|| {
            Err(NetmonError::ToolNotFound {
                tool: "arp-scan",
                path: "arp-scan".to_string(),
            })
        });

        let devices = producer.scan(&net()).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_not_retried() {
        let (producer, fallback_calls) = fallback_pair(|| {
            Err(NetmonError::ToolTimeout {
                tool: "arp-scan",
                secs: 30,
            })
        });

        let result = producer.scan(&net()).await;
        assert!(matches!(result, Err(NetmonError::ToolTimeout { .. })));
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let (producer, fallback_calls) =
            fallback_pair(|| Ok(vec![ObservedDevice::new("192.168.1.1").with_mac("AA:BB")]));

        let devices = producer.scan(&net()).await.unwrap();
        assert_eq!(devices[0].identity(), Some("AA:BB"));
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_binary_reported() {
        let result = run_tool("arp-scan", "/nonexistent/homeguard-arp-scan", &[], 5).await;
        assert!(matches!(result, Err(NetmonError::ToolNotFound { .. })));
    }
}
