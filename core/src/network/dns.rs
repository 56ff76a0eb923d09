//! Reverse DNS through the platform resolver.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use dns_lookup::lookup_addr;

/// Blocking PTR lookup. Failures and answers that just echo the address are `None`.
pub fn reverse_lookup(ip: Ipv4Addr) -> Option<String> {
    match lookup_addr(&IpAddr::V4(ip)) {
        Ok(name) => normalize_hostname(&name, ip),
        Err(e) => {
            tracing::trace!("reverse lookup for {ip} failed: {e}");
            None
        }
    }
}

/// Runs [`reverse_lookup`] off the async runtime, optionally time-boxed.
pub async fn reverse_lookup_async(ip: Ipv4Addr, limit: Option<Duration>) -> Option<String> {
    let lookup = tokio::task::spawn_blocking(move || reverse_lookup(ip));
    let joined = match limit {
        Some(limit) => match tokio::time::timeout(limit, lookup).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::debug!("reverse lookup for {ip} exceeded {limit:?}");
                return None;
            }
        },
        None => lookup.await,
    };
    joined.ok().flatten()
}

fn normalize_hostname(name: &str, ip: Ipv4Addr) -> Option<String> {
    let name = name.trim().trim_end_matches('.');
    if name.is_empty() || name == ip.to_string() {
        return None;
    }
    Some(name.to_string())
}
