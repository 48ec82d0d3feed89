//! Best-effort hostname resolution.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use homeguard_core::ObservedDevice;
use tokio::task::JoinSet;

/// Maps a network address to a human-readable name.
#[async_trait]
pub trait HostnameResolver: Send + Sync {
    /// Resolve `address`; returns the address itself when no name is found.
    async fn resolve(&self, address: &str) -> String;
}

/// Reverse DNS via the system resolver, bounded by a timeout.
pub struct DnsResolver {
    timeout: Duration,
}

impl DnsResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HostnameResolver for DnsResolver {
    async fn resolve(&self, address: &str) -> String {
        let Ok(ip) = address.parse::<IpAddr>() else {
            return address.to_string();
        };

        let lookup = tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&ip));
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(Ok(name))) if !name.is_empty() && name != address => name,
            Ok(Ok(Err(e))) => {
                tracing::debug!(address, error = %e, "Reverse lookup failed");
                address.to_string()
            }
            Err(_) => {
                tracing::debug!(address, "Reverse lookup timed out");
                address.to_string()
            }
            _ => address.to_string(),
        }
    }
}

/// Fill in missing hostnames for the devices selected by `needs_name`.
///
/// Lookups run concurrently; entries without a network address are left
/// alone.
pub async fn resolve_hostnames<F>(
    resolver: Arc<dyn HostnameResolver>,
    devices: &mut [ObservedDevice],
    needs_name: F,
) where
    F: Fn(&ObservedDevice) -> bool,
{
    let mut lookups = JoinSet::new();

    for (idx, device) in devices.iter().enumerate() {
        if device.hostname.is_some() || !needs_name(device) {
            continue;
        }
        let Some(address) = device.address().map(String::from) else {
            continue;
        };
        let resolver = resolver.clone();
        lookups.spawn(async move {
            let name = resolver.resolve(&address).await;
            (idx, name)
        });
    }

    while let Some(joined) = lookups.join_next().await {
        match joined {
            Ok((idx, name)) => devices[idx].hostname = Some(name),
            Err(e) => tracing::warn!(error = %e, "Hostname lookup task failed"),
        }
    }
}
