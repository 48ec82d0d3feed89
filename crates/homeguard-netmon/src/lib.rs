//! homeguard-netmon: Home network device monitor.
//!
//! Periodically discovers devices on the local segment with arp-scan (or
//! nmap as a fallback), resolves their names, and merges each scan into the
//! persistent device registry. Notable changes go to the activity log.

pub mod activity;
pub mod arp_scan;
pub mod config;
pub mod cycle;
pub mod error;
pub mod network;
pub mod nmap_xml;
pub mod resolver;
pub mod scanner;
pub mod scheduler;
