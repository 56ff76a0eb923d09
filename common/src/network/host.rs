use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use pnet::util::MacAddr;

/// Which probes proved a host reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discovery {
    Icmp,
    Tcp,
    IcmpAndTcp,
}

impl Discovery {
    /// `None` when neither ICMP nor TCP answered.
    pub fn from_signals(icmp: bool, tcp: bool) -> Option<Self> {
        match (icmp, tcp) {
            (true, true) => Some(Discovery::IcmpAndTcp),
            (true, false) => Some(Discovery::Icmp),
            (false, true) => Some(Discovery::Tcp),
            (false, false) => None,
        }
    }
}

impl fmt::Display for Discovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Discovery::Icmp => "ICMP",
            Discovery::Tcp => "TCP",
            Discovery::IcmpAndTcp => "ICMP+TCP",
        };
        f.write_str(label)
    }
}

/// A reachable host, built once by the pipeline that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub address: Ipv4Addr,
    pub mac: Option<MacAddr>,
    pub vendor: Option<String>,
    pub hostname: Option<String>,
    pub open_ports: BTreeSet<u16>,
    pub icmp_latency: Option<Duration>,
    pub discovered_via: Discovery,
    /// Wall-clock time spent probing and enriching this host.
    pub elapsed: Duration,
}

impl HostRecord {
    pub fn new(address: Ipv4Addr, discovered_via: Discovery) -> Self {
        Self {
            address,
            mac: None,
            vendor: None,
            hostname: None,
            open_ports: BTreeSet::new(),
            icmp_latency: None,
            discovered_via,
            elapsed: Duration::ZERO,
        }
    }
}

/// The outcome of a finished scan, hosts ascending by numeric address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub hosts: Vec<HostRecord>,
    pub total_candidates: usize,
    pub completed_count: usize,
}

/// Snapshot handed to progress observers after every finished pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub completed: usize,
    pub total: usize,
    pub found: usize,
}

pub fn sort_hosts(hosts: &mut [HostRecord]) {
    hosts.sort_by_key(|host| u32::from(host.address));
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
