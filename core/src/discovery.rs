//! # Network Discovery Service
//!
//! Implements the "discover a subnet" use case.
//!
//! This service expands the subnet into candidates, hands them to the
//! [`Scanner`], and enriches the reachable hosts with vendor names.

use neti_common::config::DEFAULT_MAX_CANDIDATES;
use neti_common::network::host::{HostRecord, ScanResult};
use neti_common::network::range::{self, AddressError};
use neti_common::vendors::VendorRepository;

use crate::scanner::{ProgressCallback, Scanner};

/// Application Service for Network Discovery.
///
/// Orchestrates the discovery process by:
/// 1. expanding the CIDR into candidate addresses,
/// 2. delegating the probing to the [`Scanner`],
/// 3. resolving MAC addresses to vendor names.
pub struct DiscoveryService {
    vendor_repo: Box<dyn VendorRepository>,
    scanner: Scanner,
    max_candidates: u64,
}

impl DiscoveryService {
    pub fn new(vendor_repo: Box<dyn VendorRepository>, scanner: Scanner) -> Self {
        Self {
            vendor_repo,
            scanner,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    pub fn with_max_candidates(mut self, max_candidates: u64) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Scans every host address of `cidr`.
    ///
    /// Malformed input fails with [`AddressError::InvalidSubnet`], and blocks
    /// larger than the configured limit with [`AddressError::TooManyCandidates`],
    /// both before any packet is sent. Everything else degrades per host.
    pub async fn perform_discovery(
        &self,
        cidr: &str,
        on_progress: Option<ProgressCallback>,
    ) -> Result<ScanResult, AddressError> {
        range::ensure_within(cidr, self.max_candidates)?;
        let candidates = range::expand(cidr)?;
        tracing::debug!("{cidr} expands to {} candidates", candidates.len());

        let mut result = self.scanner.scan(&candidates, on_progress).await;
        self.enrich_vendors(&mut result.hosts);

        Ok(result)
    }

    fn enrich_vendors(&self, hosts: &mut [HostRecord]) {
        for host in hosts.iter_mut() {
            if let Some(mac) = host.mac
                && let Some(vendor) = self.vendor_repo.vendor_for(mac)
            {
                host.vendor = Some(vendor);
            }
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
