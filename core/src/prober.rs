//! Per-host reachability.
//!
//! A host is reachable when ICMP answers or any probed port is open. The UDP
//! sweep only runs once ICMP or TCP has shown the host is there, since an
//! unanswered UDP probe says nothing about a host that may not exist.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use neti_common::config::{Config, DEFAULT_TCP_PORTS, DEFAULT_UDP_PORTS, ProbeOptions};
use neti_common::network::host::Discovery;

use crate::network::{icmp, tcp, udp};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub icmp_latency: Option<Duration>,
    pub tcp_ports: BTreeSet<u16>,
    pub udp_ports: BTreeSet<u16>,
}

impl ProbeOutcome {
    pub fn icmp_reachable(&self) -> bool {
        self.icmp_latency.is_some()
    }

    pub fn reachable(&self) -> bool {
        self.icmp_reachable() || !self.tcp_ports.is_empty() || !self.udp_ports.is_empty()
    }

    pub fn open_ports(&self) -> BTreeSet<u16> {
        self.tcp_ports.union(&self.udp_ports).copied().collect()
    }

    /// `None` for unreachable hosts. UDP never counts: it only runs once ICMP or TCP answered.
    pub fn discovery(&self) -> Option<Discovery> {
        Discovery::from_signals(self.icmp_reachable(), !self.tcp_ports.is_empty())
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, ip: Ipv4Addr, timeout: Duration, options: ProbeOptions) -> ProbeOutcome;
}

/// The three raw checks a [`NetworkProber`] combines.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn echo(&self, ip: Ipv4Addr, timeout: Duration) -> Option<Duration>;
    async fn tcp_sweep(&self, ip: Ipv4Addr, ports: &[u16], timeout: Duration) -> BTreeSet<u16>;
    async fn udp_sweep(&self, ip: Ipv4Addr, ports: &[u16], timeout: Duration) -> BTreeSet<u16>;
}

/// Raw sockets and the OS network stack.
pub struct SystemTransport;

#[async_trait]
impl ProbeTransport for SystemTransport {
    async fn echo(&self, ip: Ipv4Addr, timeout: Duration) -> Option<Duration> {
        match tokio::task::spawn_blocking(move || icmp::ping(ip, timeout)).await {
            Ok(Ok(latency)) => latency,
            Ok(Err(e)) => {
                tracing::debug!("ICMP probe of {ip} failed: {e:#}");
                None
            }
            Err(e) => {
                tracing::debug!("ICMP probe task for {ip} aborted: {e}");
                None
            }
        }
    }

    async fn tcp_sweep(&self, ip: Ipv4Addr, ports: &[u16], timeout: Duration) -> BTreeSet<u16> {
        tcp::connect_sweep(ip, ports, timeout).await
    }

    async fn udp_sweep(&self, ip: Ipv4Addr, ports: &[u16], timeout: Duration) -> BTreeSet<u16> {
        udp::probe_sweep(ip, ports, timeout).await
    }
}

pub struct NetworkProber<T: ProbeTransport = SystemTransport> {
    transport: T,
    tcp_ports: Vec<u16>,
    udp_ports: Vec<u16>,
}

impl NetworkProber<SystemTransport> {
    pub fn new() -> Self {
        Self::with_transport(SystemTransport)
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new().with_ports(config.tcp_ports.clone(), config.udp_ports.clone())
    }
}

impl Default for NetworkProber<SystemTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ProbeTransport> NetworkProber<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            tcp_ports: DEFAULT_TCP_PORTS.to_vec(),
            udp_ports: DEFAULT_UDP_PORTS.to_vec(),
        }
    }

    pub fn with_ports(mut self, tcp_ports: Vec<u16>, udp_ports: Vec<u16>) -> Self {
        self.tcp_ports = tcp_ports;
        self.udp_ports = udp_ports;
        self
    }
}

#[async_trait]
impl<T: ProbeTransport> Prober for NetworkProber<T> {
    async fn probe(&self, ip: Ipv4Addr, timeout: Duration, options: ProbeOptions) -> ProbeOutcome {
        let icmp_latency = self.transport.echo(ip, timeout).await;

        let tcp_ports = if options.use_tcp {
            self.transport.tcp_sweep(ip, &self.tcp_ports, timeout).await
        } else {
            BTreeSet::new()
        };

        let responsive = icmp_latency.is_some() || !tcp_ports.is_empty();
        let udp_ports = if options.use_udp && responsive {
            self.transport.udp_sweep(ip, &self.udp_ports, timeout).await
        } else {
            BTreeSet::new()
        };

        ProbeOutcome {
            icmp_latency,
            tcp_ports,
            udp_ports,
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
