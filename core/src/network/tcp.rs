use std::collections::BTreeSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

/// Full connect; the stream is dropped (closed) immediately on success.
pub async fn handshake_probe(addr: SocketAddr, probe_timeout: Duration) -> bool {
    match timeout(probe_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            tracing::trace!("tcp {addr}: {e}");
            false
        }
        Err(_elapsed) => false,
    }
}

/// Tries each port in turn and returns the ones that accepted a connection.
pub async fn connect_sweep(target: Ipv4Addr, ports: &[u16], probe_timeout: Duration) -> BTreeSet<u16> {
    let mut open: BTreeSet<u16> = BTreeSet::new();
    for &port in ports {
        if handshake_probe(SocketAddr::from((target, port)), probe_timeout).await {
            open.insert(port);
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
