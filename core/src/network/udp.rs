use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::Context;
use neti_protocols::udp;
use tokio::net::UdpSocket;
use tokio::time::timeout;

const RECV_BUFFER_LEN: usize = 1500;

/// A port counts as open only when an application reply comes back.
/// Silence, ICMP port-unreachable and timeouts all read as closed.
pub async fn probe_port(target: Ipv4Addr, port: u16, probe_timeout: Duration) -> anyhow::Result<bool> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .context("binding udp probe socket")?;
    socket
        .connect((target, port))
        .await
        .with_context(|| format!("connecting udp socket to {target}:{port}"))?;

    let payload: Vec<u8> = udp::probe_payload(port);
    let sent = timeout(probe_timeout, socket.send(&payload)).await;
    if !matches!(sent, Ok(Ok(_))) {
        timeout(probe_timeout, socket.send(&payload))
            .await
            .context("udp send timed out")?
            .with_context(|| format!("sending udp probe to {target}:{port}"))?;
    }

    let mut buf = [0u8; RECV_BUFFER_LEN];
    match timeout(probe_timeout, socket.recv(&mut buf)).await {
        Ok(Ok(n)) => Ok(n > 0),
        Ok(Err(_)) | Err(_) => Ok(false),
    }
}

pub async fn probe_sweep(target: Ipv4Addr, ports: &[u16], probe_timeout: Duration) -> BTreeSet<u16> {
    let mut open: BTreeSet<u16> = BTreeSet::new();
    for &port in ports {
        match probe_port(target, port, probe_timeout).await {
            Ok(true) => {
                open.insert(port);
            }
            Ok(false) => {}
            Err(e) => tracing::trace!("udp {target}:{port}: {e:#}"),
        }
    }
    open
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
