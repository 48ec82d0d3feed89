//! HomeGuard device registry.
//!
//! The registry maps a stable device identity (hardware address, or network
//! address when none is known) to the last known state of that device. Each
//! scan cycle loads it from disk, merges a fresh scan snapshot into it with
//! [`reconcile`], and writes the whole registry back. Records are never
//! removed; devices only move between online and offline.

pub mod reconcile;
pub mod registry;
pub mod stats;
pub mod store;

pub use reconcile::{reconcile, ReconcileSummary, Reconciliation};
pub use registry::DeviceRegistry;
pub use stats::{compute_stats, compute_stats_at, stored_stats, NetworkStats};
pub use store::{JsonFileStore, RegistryStore, StoreError};
