//! Local network configuration: default gateway, local address, and the
//! network segment to scan.

use std::net::{IpAddr, Ipv4Addr};

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use tokio::net::UdpSocket;

use crate::error::{NetmonError, Result};
use crate::scanner::run_tool;

/// Probe target used to pick the outbound interface when no gateway is known.
/// Connecting a UDP socket sends no packets.
const PROBE_TARGET: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub gateway: Option<IpAddr>,
    pub local_ip: IpAddr,
    pub network: IpNet,
}

/// Discover the local network. The gateway is optional; the local address
/// is not.
pub async fn detect_network() -> Result<NetworkInfo> {
    let gateway = match run_tool("ip", "ip", &["route", "show", "default"], 5).await {
        Ok(stdout) => parse_default_gateway(&String::from_utf8_lossy(&stdout)),
        Err(e) => {
            tracing::debug!(error = %e, "Could not read default route");
            None
        }
    };

    let local_ip = local_address(gateway).await?;
    let network = local_network(local_ip);

    tracing::debug!(
        gateway = ?gateway,
        local_ip = %local_ip,
        network = %network,
        "Network configuration detected"
    );

    Ok(NetworkInfo {
        gateway,
        local_ip,
        network,
    })
}

/// Extract `<ip>` from an `ip route show default` line `default via <ip> ...`.
pub fn parse_default_gateway(output: &str) -> Option<IpAddr> {
    output.lines().find_map(|line| {
        let mut words = line.split_whitespace();
        if words.next()? != "default" || words.next()? != "via" {
            return None;
        }
        words.next()?.parse().ok()
    })
}

/// The segment a local address belongs to: its /24 (or /64 for IPv6).
pub fn local_network(ip: IpAddr) -> IpNet {
    match ip {
        IpAddr::V4(v4) => IpNet::V4(Ipv4Net::new(v4, 24).map_or_else(
            |_| Ipv4Net::from(v4),
            |net| net.trunc(),
        )),
        IpAddr::V6(v6) => IpNet::V6(Ipv6Net::new(v6, 64).map_or_else(
            |_| Ipv6Net::from(v6),
            |net| net.trunc(),
        )),
    }
}

async fn local_address(gateway: Option<IpAddr>) -> Result<IpAddr> {
    let target = gateway.filter(IpAddr::is_ipv4).unwrap_or(PROBE_TARGET);

    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket
        .connect((target, 9))
        .await
        .map_err(|e| NetmonError::NetworkInfo(format!("no route to {target}: {e}")))?;
    let local = socket.local_addr()?.ip();

    if local.is_unspecified() || local.is_loopback() {
        return Err(NetmonError::NetworkInfo(format!(
            "no usable local address (got {local})"
        )));
    }
    Ok(local)
}
