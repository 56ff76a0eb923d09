//! Sources for the operating system's IPv4 neighbor (ARP) table.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use neti_common::network::mac;
use pnet::util::MacAddr;

use super::{ArpCache, lock_cache};

#[cfg(any(target_os = "macos", test))]
mod darwin;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "macos")]
pub use darwin::DarwinRoutingSocket;
#[cfg(target_os = "windows")]
pub use windows::WindowsNeighborApi;

pub const PROC_NET_ARP: &str = "/proc/net/arp";

pub trait NeighborSource: Send + Sync {
    /// Reads the current table. Zero MACs may be returned; the cache drops them.
    fn read_table(&self) -> anyhow::Result<Vec<(Ipv4Addr, MacAddr)>>;

    fn is_supported(&self) -> bool {
        true
    }

    /// Fills `cache` unless another caller already did.
    ///
    /// The `loaded` flag is re-checked after taking the lock, so callers racing
    /// past an unlocked check still read the table only once.
    fn load(&self, cache: &Mutex<ArpCache>) {
        let mut cache = lock_cache(cache);
        if cache.is_loaded() {
            return;
        }

        match self.read_table() {
            Ok(entries) => {
                let added = entries
                    .into_iter()
                    .filter(|(ip, mac)| cache.insert(*ip, *mac))
                    .count();
                tracing::trace!("neighbor table loaded, {added} new entries");
                cache.mark_loaded();
            }
            Err(e) => tracing::debug!("neighbor table unavailable: {e:#}"),
        }
    }
}

/// Linux: the kernel's text table under procfs.
pub struct LinuxProcNetArp {
    path: PathBuf,
}

impl LinuxProcNetArp {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for LinuxProcNetArp {
    fn default() -> Self {
        Self::new(PROC_NET_ARP)
    }
}

impl NeighborSource for LinuxProcNetArp {
    fn read_table(&self) -> anyhow::Result<Vec<(Ipv4Addr, MacAddr)>> {
        let file = File::open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        Ok(parse_proc_net_arp(BufReader::new(file)))
    }
}

/// Parses `IP address  HW type  Flags  HW address  Mask  Device` rows.
pub fn parse_proc_net_arp(reader: impl BufRead) -> Vec<(Ipv4Addr, MacAddr)> {
    reader
        .lines()
        .map_while(Result::ok)
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let ip: Ipv4Addr = fields[0].parse().ok()?;
            let mac: MacAddr = mac::parse_mac(fields[3])?;
            Some((ip, mac))
        })
        .collect()
}

/// Platforms without a neighbor table reader. Every lookup past the local
/// interfaces yields nothing.
pub struct Unsupported;

impl NeighborSource for Unsupported {
    fn read_table(&self) -> anyhow::Result<Vec<(Ipv4Addr, MacAddr)>> {
        Ok(Vec::new())
    }

    fn is_supported(&self) -> bool {
        false
    }
}

#[cfg(target_os = "linux")]
pub fn for_current_platform() -> Box<dyn NeighborSource> {
    Box::new(LinuxProcNetArp::default())
}

#[cfg(target_os = "windows")]
pub fn for_current_platform() -> Box<dyn NeighborSource> {
    Box::new(WindowsNeighborApi)
}

#[cfg(target_os = "macos")]
pub fn for_current_platform() -> Box<dyn NeighborSource> {
    Box::new(DarwinRoutingSocket)
}

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
pub fn for_current_platform() -> Box<dyn NeighborSource> {
    Box::new(Unsupported)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
