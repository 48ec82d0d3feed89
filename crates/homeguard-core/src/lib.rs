//! homeguard-core: Shared types, events, and error handling for HomeGuard.
//!
//! This crate provides the foundational types used across the monitor:
//! - Device records and their online/offline status
//! - Scan snapshots as handed over by a scan producer
//! - Event types for the activity log and structured logging
//! - Timestamp parsing for current and legacy registry files
//! - Common error types

pub mod error;
pub mod events;
pub mod timestamp;
pub mod types;

pub use error::HomeguardError;
pub use types::{identity_key, DeviceRecord, DeviceStatus, ObservedDevice, ScanSnapshot};
