//! # Address enumeration
//!
//! Expands a CIDR block such as `192.168.1.0/24` into the ordered list of
//! candidate hosts probed by a scan.

use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid subnet '{input}': {reason}")]
    InvalidSubnet { input: String, reason: String },

    #[error("subnet '{input}' spans {count} addresses, more than the limit of {limit}")]
    TooManyCandidates { input: String, count: u64, limit: u64 },
}

impl AddressError {
    fn invalid(input: &str, reason: impl Into<String>) -> Self {
        AddressError::InvalidSubnet {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A continuous, inclusive range of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> + Clone {
        let start: u32 = u32::from(self.start_addr);
        let end: u32 = u32::from(self.end_addr);
        (start..=end).map(Ipv4Addr::from)
    }

    /// Number of addresses in the range, as `u64` so a `/0` block fits.
    pub fn len(&self) -> u64 {
        let start: u64 = u32::from(self.start_addr).into();
        let end: u64 = u32::from(self.end_addr).into();
        (end + 1).saturating_sub(start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Creates the range covering the whole network block of `ip/prefix`.
///
/// Host bits in `ip` are masked off, so `192.168.1.77/24` covers `.0` to `.255`.
pub fn cidr_range(ip: Ipv4Addr, prefix: u8) -> anyhow::Result<Ipv4Range> {
    let network = Ipv4Network::new(ip, prefix)?;
    Ok(Ipv4Range::new(network.network(), network.broadcast()))
}

/// Parses CIDR notation (`a.b.c.d/len`) into the covered network block.
pub fn parse_cidr(input: &str) -> Result<Ipv4Range, AddressError> {
    let trimmed = input.trim();
    let Some((ip_str, prefix_str)) = trimmed.split_once('/') else {
        return Err(AddressError::invalid(input, "expected <address>/<prefix>"));
    };

    let ip: Ipv4Addr = ip_str
        .parse()
        .map_err(|e| AddressError::invalid(input, format!("bad address '{ip_str}': {e}")))?;

    let prefix: u8 = prefix_str
        .parse()
        .map_err(|e| AddressError::invalid(input, format!("bad prefix '{prefix_str}': {e}")))?;

    cidr_range(ip, prefix).map_err(|e| AddressError::invalid(input, e.to_string()))
}

/// Fails with [`AddressError::TooManyCandidates`] when `cidr` covers more than
/// `limit` addresses. Nothing is allocated, so a `/0` is rejected just as cheaply.
pub fn ensure_within(cidr: &str, limit: u64) -> Result<Ipv4Range, AddressError> {
    let range = parse_cidr(cidr)?;
    if range.len() > limit {
        return Err(AddressError::TooManyCandidates {
            input: cidr.to_string(),
            count: range.len(),
            limit,
        });
    }
    Ok(range)
}

/// Expands `cidr` into every candidate host address, ascending.
///
/// When the block holds more than two addresses the first (network) and last
/// (broadcast) are dropped. Blocks of one or two addresses (`/32`, `/31`) are
/// returned whole.
pub fn expand(cidr: &str) -> Result<Vec<Ipv4Addr>, AddressError> {
    let range = parse_cidr(cidr)?;
    let mut addrs: Vec<Ipv4Addr> = range.iter().collect();

    if addrs.len() > 2 {
        addrs.pop();
        addrs.remove(0);
    }

    Ok(addrs)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
