use std::collections::{BTreeSet, HashMap};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use neti_common::config::{Config, ProbeOptions};
use neti_common::network::host::{Discovery, ScanResult};
use neti_common::network::range::AddressError;
use neti_common::vendors::VendorRepository;
use neti_core::discovery::DiscoveryService;
use neti_core::identify::{Identifier, Identity, SystemIdentifier};
use neti_core::prober::{ProbeOutcome, Prober};
use neti_core::resolver::{MacResolver, NeighborSource};
use neti_core::scanner::Scanner;
use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use pnet::util::MacAddr;

/// Replies from a fixed table and remembers which addresses were probed.
#[derive(Default)]
struct RecordingProber {
    outcomes: HashMap<Ipv4Addr, ProbeOutcome>,
    probed: Mutex<Vec<Ipv4Addr>>,
}

#[async_trait]
impl Prober for RecordingProber {
    async fn probe(&self, ip: Ipv4Addr, _timeout: Duration, _options: ProbeOptions) -> ProbeOutcome {
        self.probed.lock().unwrap().push(ip);
        self.outcomes.get(&ip).cloned().unwrap_or_default()
    }
}

struct NamedHosts;

#[async_trait]
impl Identifier for NamedHosts {
    async fn identify(&self, ip: Ipv4Addr) -> Identity {
        Identity {
            mac: Some(MacAddr::new(0x34, 0xcf, 0xf6, 0, 0, ip.octets()[3])),
            hostname: Some(format!("host{}.lan", ip.octets()[3])),
        }
    }
}

struct OuiVendor;

impl VendorRepository for OuiVendor {
    fn vendor_for(&self, mac: MacAddr) -> Option<String> {
        (mac.0 == 0x34).then(|| "Example Devices".to_string())
    }
}

/// Fails the test if the neighbor table is ever consulted.
struct UntouchedTable(Arc<AtomicUsize>);

impl NeighborSource for UntouchedTable {
    fn read_table(&self) -> anyhow::Result<Vec<(Ipv4Addr, MacAddr)>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

fn icmp_up() -> ProbeOutcome {
    ProbeOutcome {
        icmp_latency: Some(Duration::from_millis(1)),
        ..Default::default()
    }
}

fn service_with(prober: Arc<RecordingProber>, config: &Config) -> DiscoveryService {
    let scanner = Scanner::with_components(config, prober, Arc::new(NamedHosts));
    DiscoveryService::new(Box::new(OuiVendor), scanner)
}

#[tokio::test]
async fn slash_30_probes_only_the_two_hosts() {
    let prober = Arc::new(RecordingProber {
        outcomes: HashMap::from([
            (Ipv4Addr::new(192, 168, 1, 1), icmp_up()),
            (Ipv4Addr::new(192, 168, 1, 2), icmp_up()),
        ]),
        ..Default::default()
    });
    let service = service_with(prober.clone(), &Config::default());

    let result: ScanResult = service.perform_discovery("192.168.1.0/30", None).await.unwrap();

    let mut probed = prober.probed.lock().unwrap().clone();
    probed.sort();
    assert_eq!(probed, vec![Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2)]);

    assert_eq!(result.total_candidates, 2);
    assert_eq!(result.completed_count, 2);
    let addresses: Vec<Ipv4Addr> = result.hosts.iter().map(|h| h.address).collect();
    assert_eq!(addresses, vec![Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2)]);

    let first = &result.hosts[0];
    assert_eq!(first.hostname.as_deref(), Some("host1.lan"));
    assert_eq!(first.vendor.as_deref(), Some("Example Devices"));
    assert_eq!(first.discovered_via, Discovery::Icmp);
}

#[tokio::test]
async fn malformed_subnet_sends_nothing() {
    let prober = Arc::new(RecordingProber::default());
    let service = service_with(prober.clone(), &Config::default());

    let err = service.perform_discovery("not-a-subnet", None).await.unwrap_err();

    assert!(matches!(err, AddressError::InvalidSubnet { .. }));
    assert!(prober.probed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn icmp_filtered_host_found_over_tcp_has_no_identity() {
    let target = Ipv4Addr::new(10, 20, 0, 9);
    let prober = Arc::new(RecordingProber {
        outcomes: HashMap::from([(
            target,
            ProbeOutcome {
                tcp_ports: BTreeSet::from([80]),
                ..Default::default()
            },
        )]),
        ..Default::default()
    });
    let config = Config {
        use_tcp: true,
        ..Config::default()
    };
    let service = service_with(prober, &config);

    let result = service.perform_discovery("10.20.0.0/28", None).await.unwrap();

    assert_eq!(result.total_candidates, 14);
    assert_eq!(result.completed_count, 14);
    assert_eq!(result.hosts.len(), 1);
    let host = &result.hosts[0];
    assert_eq!(host.address, target);
    assert_eq!(host.discovered_via, Discovery::Tcp);
    assert_eq!(host.mac, None);
    assert_eq!(host.hostname, None);
    assert_eq!(host.vendor, None);
    assert_eq!(host.open_ports, BTreeSet::from([80]));
}

#[tokio::test]
async fn own_interface_address_resolves_without_neighbor_table() {
    let own_ip = Ipv4Addr::new(192, 168, 50, 10);
    let own_mac = MacAddr::new(0x34, 0xcf, 0xf6, 0x10, 0x20, 0x30);
    let reads = Arc::new(AtomicUsize::new(0));

    let resolver = MacResolver::with_source(Box::new(UntouchedTable(reads.clone())))
        .with_interfaces(Box::new(move || {
            vec![NetworkInterface {
                name: "eth0".to_string(),
                description: String::new(),
                index: 2,
                mac: Some(own_mac),
                ips: vec![IpNetwork::V4(Ipv4Network::new(own_ip, 24).unwrap())],
                flags: 1,
            }]
        }))
        .with_arp_settle(Duration::ZERO);
    let identifier = SystemIdentifier::new(Arc::new(resolver)).with_reverse_dns(false, None);

    let prober = Arc::new(RecordingProber {
        outcomes: HashMap::from([(own_ip, icmp_up())]),
        ..Default::default()
    });
    let scanner = Scanner::with_components(&Config::default(), prober, Arc::new(identifier));
    let service = DiscoveryService::new(Box::new(OuiVendor), scanner);

    let result = service.perform_discovery("192.168.50.10/32", None).await.unwrap();

    assert_eq!(result.hosts.len(), 1);
    assert_eq!(result.hosts[0].mac, Some(own_mac));
    assert_eq!(result.hosts[0].vendor.as_deref(), Some("Example Devices"));
    assert_eq!(reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn loopback_listener_found_with_real_probes() {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = Config {
        use_tcp: true,
        no_dns: true,
        timeout: Duration::from_millis(300),
        tcp_ports: vec![port],
        arp_settle: Duration::ZERO,
        ..Config::default()
    };
    let service = DiscoveryService::new(Box::new(OuiVendor), Scanner::new(&config));

    let result = service.perform_discovery("127.0.0.1/32", None).await.unwrap();

    assert_eq!(result.hosts.len(), 1);
    let host = &result.hosts[0];
    assert_eq!(host.address, Ipv4Addr::LOCALHOST);
    assert!(host.open_ports.contains(&port));
    assert!(matches!(host.discovered_via, Discovery::Tcp | Discovery::IcmpAndTcp));
}

#[tokio::test]
#[ignore]
async fn loopback_answers_icmp_when_privileged() {
    let config = Config {
        no_dns: true,
        ..Config::default()
    };
    let service = DiscoveryService::new(Box::new(OuiVendor), Scanner::new(&config));

    let result = service.perform_discovery("127.0.0.1/32", None).await.unwrap();
    assert_eq!(result.hosts.len(), 1);
    assert!(result.hosts[0].icmp_latency.is_some());
}
