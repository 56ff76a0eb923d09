use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_ARP_SETTLE: Duration = Duration::from_millis(50);

/// Largest block scanned without an explicit override: one `/16`.
pub const DEFAULT_MAX_CANDIDATES: u64 = 1 << 16;

/// Well-known TCP services probed when TCP discovery is enabled.
pub const DEFAULT_TCP_PORTS: &[u16] = &[21, 22, 23, 25, 53, 80, 135, 139, 443, 445];

/// UDP services probed on hosts that already answered ICMP or TCP.
pub const DEFAULT_UDP_PORTS: &[u16] = &[53, 67, 68, 69, 123, 137, 138, 161, 500, 514];

/// Which optional probes run after ICMP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeOptions {
    pub use_tcp: bool,
    pub use_udp: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on probe pipelines running at the same time.
    pub concurrency: usize,
    /// Deadline for every individual probe step (ICMP wait, TCP connect, UDP reply).
    pub timeout: Duration,
    pub use_tcp: bool,
    pub use_udp: bool,
    /// Disables reverse DNS lookups for discovered hosts.
    pub no_dns: bool,
    /// Caps a reverse lookup. `None` leaves it to the system resolver.
    pub dns_timeout: Option<Duration>,
    pub tcp_ports: Vec<u16>,
    pub udp_ports: Vec<u16>,
    /// Pause between provoking ARP and re-reading the neighbor table.
    pub arp_settle: Duration,
    /// Subnets covering more addresses than this are refused before expansion.
    pub max_candidates: u64,
    /// IEEE `oui.txt` used for vendor names instead of the embedded database.
    pub oui_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            use_tcp: false,
            use_udp: false,
            no_dns: false,
            dns_timeout: None,
            tcp_ports: DEFAULT_TCP_PORTS.to_vec(),
            udp_ports: DEFAULT_UDP_PORTS.to_vec(),
            arp_settle: DEFAULT_ARP_SETTLE,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            oui_file: None,
        }
    }
}

impl Config {
    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            use_tcp: self.use_tcp,
            use_udp: self.use_udp,
        }
    }

    /// A semaphore with zero permits would never let a pipeline start.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
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
