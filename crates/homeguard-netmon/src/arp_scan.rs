//! arp-scan output parsing.
//!
//! `arp-scan --localnet --quiet` prints one tab-separated line per responding
//! host: `IP \t MAC \t Vendor`. Header and summary lines have no tabs.

use std::net::IpAddr;

use homeguard_core::ObservedDevice;

/// Parse arp-scan stdout into observed devices.
///
/// Lines with fewer than two tab-separated fields, or whose first field is
/// not an IP address, are ignored. MAC addresses are lower-cased, the form
/// arp-scan itself prints and the registry keys on.
pub fn parse_arp_scan(output: &str) -> Vec<ObservedDevice> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<ObservedDevice> {
    let mut parts = line.split('\t').map(str::trim);
    let ip = parts.next()?;
    let mac = parts.next()?;
    ip.parse::<IpAddr>().ok()?;

    let mut device = ObservedDevice::new(ip);
    if !mac.is_empty() {
        device = device.with_mac(mac.to_ascii_lowercase());
    }
    // arp-scan prints "(Unknown)" for OUIs missing from its database.
    if let Some(vendor) = parts.next().filter(|v| !v.is_empty() && !v.starts_with("(Unknown")) {
        device = device.with_vendor(vendor);
    }
    Some(device)
}
