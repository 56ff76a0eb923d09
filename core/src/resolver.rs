//! IPv4 to MAC resolution.
//!
//! [`MacResolver::resolve`] walks five sources in order and stops at the first hit:
//!
//! 1. the in-memory cache,
//! 2. the addresses bound to local "up" interfaces,
//! 3. the OS neighbor table, loaded once,
//! 4. a forced reload of the neighbor table,
//! 5. a reload after provoking the kernel into ARPing for the target.
//!
//! The cache and its `loaded` flag share one mutex. Platform loaders take that
//! mutex themselves and re-check the flag, so concurrent resolvers converge on a
//! single table read.

use std::collections::HashMap;
use std::net::{Ipv4Addr, UdpSocket};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Context;
use neti_common::config::DEFAULT_ARP_SETTLE;
use neti_common::network::mac;
use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;
use pnet::util::MacAddr;

pub mod neighbor;

pub use neighbor::NeighborSource;

/// Discard service; nothing needs to listen, the datagram only has to leave.
const ARP_TRIGGER_PORT: u16 = 9;

pub type InterfaceLister = Box<dyn Fn() -> Vec<NetworkInterface> + Send + Sync>;

/// Append-only IP to MAC map plus the "neighbor table loaded" gate.
#[derive(Debug, Default)]
pub struct ArpCache {
    entries: HashMap<Ipv4Addr, MacAddr>,
    loaded: bool,
}

impl ArpCache {
    pub fn get(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.entries.get(&ip).copied()
    }

    /// Stores `mac` unless it is all-zero or `ip` already has an entry.
    pub fn insert(&mut self, ip: Ipv4Addr, mac: MacAddr) -> bool {
        if !mac::is_valid_mac(mac) || self.entries.contains_key(&ip) {
            return false;
        }
        self.entries.insert(ip, mac);
        true
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub fn reset_loaded(&mut self) {
        self.loaded = false;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn lock_cache(cache: &Mutex<ArpCache>) -> MutexGuard<'_, ArpCache> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct MacResolver {
    cache: Mutex<ArpCache>,
    source: Box<dyn NeighborSource>,
    interfaces: InterfaceLister,
    arp_settle: Duration,
}

impl MacResolver {
    /// Resolver backed by the neighbor table of the running OS.
    pub fn new() -> Self {
        Self::with_source(neighbor::for_current_platform())
    }

    pub fn with_source(source: Box<dyn NeighborSource>) -> Self {
        let mut cache = ArpCache::default();
        if !source.is_supported() {
            tracing::debug!("no neighbor table source on {}", std::env::consts::OS);
            cache.mark_loaded();
        }

        Self {
            cache: Mutex::new(cache),
            source,
            interfaces: Box::new(datalink::interfaces),
            arp_settle: DEFAULT_ARP_SETTLE,
        }
    }

    pub fn with_interfaces(mut self, interfaces: InterfaceLister) -> Self {
        self.interfaces = interfaces;
        self
    }

    pub fn with_arp_settle(mut self, arp_settle: Duration) -> Self {
        self.arp_settle = arp_settle;
        self
    }

    /// Blocking; returns `None` when no source knows `ip`.
    pub fn resolve(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        if let Some(mac) = self.cached(ip) {
            return Some(mac);
        }

        if let Some(mac) = self.local_interface_mac(ip) {
            lock_cache(&self.cache).insert(ip, mac);
            return Some(mac);
        }

        if !self.source.is_supported() {
            return None;
        }

        self.ensure_loaded();
        if let Some(mac) = self.cached(ip) {
            return Some(mac);
        }

        self.reload();
        if let Some(mac) = self.cached(ip) {
            return Some(mac);
        }

        if let Err(e) = provoke_arp(ip) {
            tracing::trace!("ARP trigger for {ip} failed: {e:#}");
        }
        if !self.arp_settle.is_zero() {
            std::thread::sleep(self.arp_settle);
        }
        self.reload();
        self.cached(ip)
    }

    pub fn cached(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        lock_cache(&self.cache).get(ip)
    }

    fn local_interface_mac(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        (self.interfaces)()
            .into_iter()
            .filter(NetworkInterface::is_up)
            .find(|iface| {
                iface
                    .ips
                    .iter()
                    .any(|net| matches!(net, IpNetwork::V4(v4) if v4.ip() == ip))
            })
            .and_then(|iface| iface.mac)
            .filter(|mac| mac::is_valid_mac(*mac))
    }

    fn ensure_loaded(&self) {
        if lock_cache(&self.cache).is_loaded() {
            return;
        }
        self.source.load(&self.cache);
    }

    fn reload(&self) {
        lock_cache(&self.cache).reset_loaded();
        self.source.load(&self.cache);
    }
}

impl Default for MacResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// A zero-byte datagram toward `ip` makes the kernel resolve its link address.
fn provoke_arp(ip: Ipv4Addr) -> anyhow::Result<()> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).context("binding ARP trigger socket")?;
    socket
        .send_to(&[], (ip, ARP_TRIGGER_PORT))
        .with_context(|| format!("sending ARP trigger to {ip}"))?;
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
