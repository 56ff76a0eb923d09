use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use neti_common::config::Config;
use pnet::util::MacAddr;

use crate::network::dns;
use crate::resolver::MacResolver;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub mac: Option<MacAddr>,
    pub hostname: Option<String>,
}

/// Resolves who a host is once it has answered ICMP.
#[async_trait]
pub trait Identifier: Send + Sync {
    async fn identify(&self, ip: Ipv4Addr) -> Identity;
}

pub struct SystemIdentifier {
    resolver: Arc<MacResolver>,
    reverse_dns: bool,
    dns_timeout: Option<Duration>,
}

impl SystemIdentifier {
    pub fn new(resolver: Arc<MacResolver>) -> Self {
        Self {
            resolver,
            reverse_dns: true,
            dns_timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let resolver = MacResolver::new().with_arp_settle(config.arp_settle);
        Self {
            resolver: Arc::new(resolver),
            reverse_dns: !config.no_dns,
            dns_timeout: config.dns_timeout,
        }
    }

    pub fn with_reverse_dns(mut self, enabled: bool, limit: Option<Duration>) -> Self {
        self.reverse_dns = enabled;
        self.dns_timeout = limit;
        self
    }

    async fn mac(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        let resolver = self.resolver.clone();
        match tokio::task::spawn_blocking(move || resolver.resolve(ip)).await {
            Ok(mac) => mac,
            Err(e) => {
                tracing::debug!("MAC resolution for {ip} aborted: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl Identifier for SystemIdentifier {
    async fn identify(&self, ip: Ipv4Addr) -> Identity {
        let mac = self.mac(ip).await;
        let hostname = if self.reverse_dns {
            dns::reverse_lookup_async(ip, self.dns_timeout).await
        } else {
            None
        };
        Identity { mac, hostname }
    }
}
