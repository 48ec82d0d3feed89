//! One monitoring cycle: scan → resolve → load → reconcile → save.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use homeguard_core::events::{EventPayload, MonitorEvent};
use homeguard_core::ScanSnapshot;
use homeguard_registry::{
    compute_stats, reconcile, DeviceRegistry, JsonFileStore, NetworkStats, ReconcileSummary,
    Reconciliation, RegistryStore,
};
use ipnet::IpNet;
use uuid::Uuid;

use crate::activity::{ActivityLog, EventSink, TracingSink};
use crate::config::NetmonConfig;
use crate::error::Result;
use crate::network;
use crate::resolver::{self, DnsResolver, HostnameResolver};
use crate::scanner::{FallbackProducer, ScanProducer};

/// What a completed cycle did.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub scan_id: Uuid,
    pub network: IpNet,
    pub summary: ReconcileSummary,
    pub stats: NetworkStats,
    pub duration_ms: u64,
}

/// Owns the collaborators of a monitoring cycle.
///
/// Cycles take `&mut self`, so at most one runs at a time.
pub struct MonitorCycle {
    store: Box<dyn RegistryStore + Send + Sync>,
    producer: Box<dyn ScanProducer>,
    resolver: Option<Arc<dyn HostnameResolver>>,
    sinks: Vec<Box<dyn EventSink>>,
    network: Option<IpNet>,
    /// Reconciled registry whose save failed; used instead of reloading.
    unsaved: Option<DeviceRegistry>,
}

impl MonitorCycle {
    pub fn new(
        store: Box<dyn RegistryStore + Send + Sync>,
        producer: Box<dyn ScanProducer>,
    ) -> Self {
        Self {
            store,
            producer,
            resolver: None,
            sinks: Vec::new(),
            network: None,
            unsaved: None,
        }
    }

    /// The production wiring: JSON registry under `data_dir`, arp-scan with
    /// nmap fallback, reverse DNS, tracing plus the activity log.
    pub fn from_config(config: &NetmonConfig) -> Result<Self> {
        let mut cycle = Self::new(
            Box::new(JsonFileStore::new(config.devices_path())),
            Box::new(FallbackProducer::from_config(config)),
        )
        .with_sink(Box::new(TracingSink))
        .with_sink(Box::new(ActivityLog::new(config.activity_log_path())));

        if config.resolve_hostnames {
            cycle = cycle.with_resolver(Arc::new(DnsResolver::new(config.resolve_timeout())));
        }
        if let Some(net) = config.network_override()? {
            cycle = cycle.with_network(net);
        }
        Ok(cycle)
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HostnameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Scan this network instead of detecting the local one.
    pub fn with_network(mut self, network: IpNet) -> Self {
        self.network = Some(network);
        self
    }

    /// Whether a reconciled registry is waiting to be saved.
    pub fn has_unsaved(&self) -> bool {
        self.unsaved.is_some()
    }

    /// Retry saving a registry left over from a failed cycle.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(registry) = self.unsaved.take() {
            if let Err(e) = self.store.save(&registry) {
                self.unsaved = Some(registry);
                return Err(e.into());
            }
            tracing::info!(devices = registry.len(), "Unsaved device registry flushed");
        }
        Ok(())
    }

    /// Write a free-form line to every sink.
    pub fn note(&self, message: &str) {
        for sink in &self.sinks {
            sink.note(message);
        }
    }

    /// Run one full cycle.
    ///
    /// A scan failure is reported and treated as an empty scan. A save
    /// failure is returned, and the reconciled registry is kept for the next
    /// cycle.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        let start = Instant::now();
        let scan_id = Uuid::new_v4();

        let network = match self.network {
            Some(net) => net,
            None => match network::detect_network().await {
                Ok(info) => info.network,
                Err(e) => {
                    self.note(&format!("Could not determine network configuration: {e}"));
                    return Err(e);
                }
            },
        };

        self.emit(EventPayload::ScanStarted {
            scan_id,
            network: network.to_string(),
        });

        let mut devices = match self.producer.scan(&network).await {
            Ok(devices) => devices,
            Err(e) => {
                tracing::warn!(scan_id = %scan_id, error = %e, "Scan failed, treating as empty");
                self.emit(EventPayload::ScanFailed {
                    scan_id,
                    error: e.to_string(),
                });
                Vec::new()
            }
        };
        let observed_at = Utc::now();

        let registry = self.load_registry();

        // Names are only kept from a device's first sighting.
        if let Some(resolver) = &self.resolver {
            resolver::resolve_hostnames(resolver.clone(), &mut devices, |d| {
                d.identity().is_some_and(|id| !registry.contains(id))
            })
            .await;
        }

        let snapshot = ScanSnapshot::at(observed_at, devices);
        let Reconciliation {
            registry,
            events,
            summary,
        } = reconcile(registry, &snapshot);

        for payload in events {
            self.emit(payload);
        }

        let stats = compute_stats(&registry);

        if let Err(e) = self.store.save(&registry) {
            tracing::error!(scan_id = %scan_id, error = %e, "Failed to save device registry");
            self.emit(EventPayload::RegistryError {
                error: e.to_string(),
            });
            self.unsaved = Some(registry);
            return Err(e.into());
        }

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.emit(EventPayload::ScanCompleted {
            scan_id,
            devices_seen: summary.scanned,
            new_devices: summary.new_count,
            went_offline: summary.offline_count,
            online: stats.online_devices,
            offline: stats.offline_devices,
            duration_ms,
        });

        tracing::info!(
            scan_id = %scan_id,
            network = %network,
            seen = summary.scanned,
            new = summary.new_count,
            offline = summary.offline_count,
            skipped = summary.skipped_count,
            total = stats.total_devices,
            duration_ms,
            "Monitor cycle complete"
        );

        Ok(CycleReport {
            scan_id,
            network,
            summary,
            stats,
            duration_ms,
        })
    }

    /// The registry to reconcile against: an unsaved one from a failed
    /// cycle, else whatever is on disk. Unreadable files start fresh.
    fn load_registry(&mut self) -> DeviceRegistry {
        if let Some(registry) = self.unsaved.take() {
            tracing::info!(devices = registry.len(), "Reusing unsaved device registry");
            return registry;
        }

        let (registry, error) = self.store.load_or_fresh();
        if let Some(e) = error {
            self.emit(EventPayload::RegistryError {
                error: e.to_string(),
            });
        }
        registry
    }

    fn emit(&self, payload: EventPayload) {
        let event = MonitorEvent::new(payload);
        for sink in &self.sinks {
            sink.emit(&event);
        }
    }
}
