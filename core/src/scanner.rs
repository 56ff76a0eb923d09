//! Bounded fan-out of per-host probe pipelines.
//!
//! Every candidate gets its own task immediately; a semaphore caps how many of
//! them are past acquisition at once. Results, the completion counter and the
//! progress callback share one mutex, so progress is reported in strictly
//! increasing order even though hosts finish in any order.

use std::net::Ipv4Addr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use neti_common::config::{Config, ProbeOptions};
use neti_common::network::host::{self, HostRecord, ScanProgress, ScanResult};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::identify::{Identifier, SystemIdentifier};
use crate::prober::{NetworkProber, Prober};

/// Invoked once per finished candidate, under the aggregate lock. Keep it fast.
pub type ProgressCallback = Box<dyn Fn(ScanProgress) + Send + Sync>;

#[derive(Default)]
struct Aggregate {
    hosts: Vec<HostRecord>,
    completed: usize,
}

struct Shared {
    aggregate: Mutex<Aggregate>,
    on_progress: Option<ProgressCallback>,
    total: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Aggregate> {
        self.aggregate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `record`, bumps the counter and reports, all under one lock.
    fn finish_one(&self, record: Option<HostRecord>) {
        let mut aggregate = self.lock();
        if let Some(record) = record {
            aggregate.hosts.push(record);
        }
        aggregate.completed += 1;

        if let Some(on_progress) = &self.on_progress {
            let progress = ScanProgress {
                completed: aggregate.completed,
                total: self.total,
                found: aggregate.hosts.len(),
            };
            // Already counted: a callback panic must not reach the join loop.
            if panic::catch_unwind(AssertUnwindSafe(|| on_progress(progress))).is_err() {
                tracing::warn!("progress callback panicked at {}/{}", progress.completed, self.total);
            }
        }
    }
}

pub struct Scanner {
    prober: Arc<dyn Prober>,
    identifier: Arc<dyn Identifier>,
    concurrency: usize,
    timeout: Duration,
    options: ProbeOptions,
}

impl Scanner {
    /// Scanner wired to raw sockets, the OS neighbor table and system DNS.
    pub fn new(config: &Config) -> Self {
        Self::with_components(
            config,
            Arc::new(NetworkProber::from_config(config)),
            Arc::new(SystemIdentifier::from_config(config)),
        )
    }

    pub fn with_components(
        config: &Config,
        prober: Arc<dyn Prober>,
        identifier: Arc<dyn Identifier>,
    ) -> Self {
        Self {
            prober,
            identifier,
            concurrency: config.effective_concurrency(),
            timeout: config.timeout,
            options: config.probe_options(),
        }
    }

    /// Probes every candidate and returns the reachable ones sorted by address.
    ///
    /// Runs to completion; `completed_count` always equals `total_candidates`.
    pub async fn scan(&self, candidates: &[Ipv4Addr], on_progress: Option<ProgressCallback>) -> ScanResult {
        let total: usize = candidates.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let shared = Arc::new(Shared {
            aggregate: Mutex::new(Aggregate::default()),
            on_progress,
            total,
        });

        tracing::debug!(
            "scanning {total} candidates, {} at a time, timeout {:?}",
            self.concurrency,
            self.timeout
        );

        let mut tasks: JoinSet<()> = JoinSet::new();
        for &ip in candidates {
            let semaphore = semaphore.clone();
            let shared = shared.clone();
            let prober = self.prober.clone();
            let identifier = self.identifier.clone();
            let (timeout, options) = (self.timeout, self.options);

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        tracing::debug!("semaphore closed before probing {ip}: {e}");
                        shared.finish_one(None);
                        return;
                    }
                };
                let record = run_pipeline(ip, prober.as_ref(), identifier.as_ref(), timeout, options).await;
                shared.finish_one(record);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                // The task died before reporting; count it so the scan still completes.
                tracing::warn!("probe task failed: {e}");
                shared.finish_one(None);
            }
        }

        let aggregate = std::mem::take(&mut *shared.lock());
        let mut hosts = aggregate.hosts;
        host::sort_hosts(&mut hosts);

        ScanResult {
            hosts,
            total_candidates: total,
            completed_count: aggregate.completed,
        }
    }
}

/// Probe one host; enrich it with MAC and hostname only if ICMP answered.
async fn run_pipeline(
    ip: Ipv4Addr,
    prober: &dyn Prober,
    identifier: &dyn Identifier,
    timeout: Duration,
    options: ProbeOptions,
) -> Option<HostRecord> {
    let start = Instant::now();
    let outcome = prober.probe(ip, timeout, options).await;
    let via = outcome.discovery()?;

    let mut record = HostRecord::new(ip, via);
    record.icmp_latency = outcome.icmp_latency;
    record.open_ports = outcome.open_ports();

    if outcome.icmp_reachable() {
        let identity = identifier.identify(ip).await;
        record.mac = identity.mac;
        record.hostname = identity.hostname;
    }

    record.elapsed = start.elapsed();
    tracing::debug!("{ip} is up via {via}");
    Some(record)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identify::Identity;
    use crate::prober::ProbeOutcome;
    use async_trait::async_trait;
    use neti_common::network::host::Discovery;
    use pnet::util::MacAddr;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers from a fixed table and records peak concurrent probes.
    #[derive(Default)]
    struct FakeProber {
        outcomes: HashMap<Ipv4Addr, ProbeOutcome>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        delay: Duration,
        panic_on: Option<Ipv4Addr>,
    }

    #[async_trait]
    impl Prober for FakeProber {
        async fn probe(&self, ip: Ipv4Addr, _timeout: Duration, _options: ProbeOptions) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.panic_on == Some(ip) {
                panic!("prober failed on {ip}");
            }
            self.outcomes.get(&ip).cloned().unwrap_or_default()
        }
    }

    #[derive(Default)]
    struct FakeIdentifier {
        calls: AtomicUsize,
    }

    const MAC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x01);

    #[async_trait]
    impl Identifier for FakeIdentifier {
        async fn identify(&self, ip: Ipv4Addr) -> Identity {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Identity {
                mac: Some(MAC),
                hostname: Some(format!("host-{}", ip.octets()[3])),
            }
        }
    }

    fn icmp_up() -> ProbeOutcome {
        ProbeOutcome {
            icmp_latency: Some(Duration::from_millis(2)),
            ..Default::default()
        }
    }

    fn tcp_up(port: u16) -> ProbeOutcome {
        ProbeOutcome {
            tcp_ports: BTreeSet::from([port]),
            ..Default::default()
        }
    }

    fn candidates(n: u8) -> Vec<Ipv4Addr> {
        (1..=n).map(|i| Ipv4Addr::new(10, 0, 0, i)).collect()
    }

    fn config(concurrency: usize) -> Config {
        Config {
            concurrency,
            use_tcp: true,
            ..Config::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_concurrency() {
        let prober = Arc::new(FakeProber {
            delay: Duration::from_millis(10),
            ..Default::default()
        });
        let scanner = Scanner::with_components(&config(3), prober.clone(), Arc::new(FakeIdentifier::default()));

        let result = scanner.scan(&candidates(30), None).await;

        assert_eq!(prober.calls.load(Ordering::SeqCst), 30);
        assert!(prober.peak.load(Ordering::SeqCst) <= 3);
        assert!(prober.peak.load(Ordering::SeqCst) >= 1);
        assert_eq!(result.completed_count, 30);
        assert!(result.hosts.is_empty());
    }

    #[tokio::test]
    async fn output_sorted_regardless_of_input_order() {
        let ips = [
            Ipv4Addr::new(10, 0, 0, 200),
            Ipv4Addr::new(10, 0, 0, 3),
            Ipv4Addr::new(10, 0, 1, 1),
            Ipv4Addr::new(10, 0, 0, 20),
        ];
        let outcomes = ips.iter().map(|ip| (*ip, icmp_up())).collect();
        let prober = Arc::new(FakeProber {
            outcomes,
            ..Default::default()
        });
        let scanner = Scanner::with_components(&config(2), prober, Arc::new(FakeIdentifier::default()));

        let result = scanner.scan(&ips, None).await;
        let addresses: Vec<Ipv4Addr> = result.hosts.iter().map(|h| h.address).collect();
        assert_eq!(
            addresses,
            vec![
                Ipv4Addr::new(10, 0, 0, 3),
                Ipv4Addr::new(10, 0, 0, 20),
                Ipv4Addr::new(10, 0, 0, 200),
                Ipv4Addr::new(10, 0, 1, 1),
            ]
        );
    }

    #[tokio::test]
    async fn tcp_only_host_has_no_mac_or_hostname() {
        let tcp_host = Ipv4Addr::new(10, 0, 0, 2);
        let icmp_host = Ipv4Addr::new(10, 0, 0, 1);
        let prober = Arc::new(FakeProber {
            outcomes: HashMap::from([(tcp_host, tcp_up(80)), (icmp_host, icmp_up())]),
            ..Default::default()
        });
        let identifier = Arc::new(FakeIdentifier::default());
        let scanner = Scanner::with_components(&config(20), prober, identifier.clone());

        let result = scanner.scan(&candidates(4), None).await;
        assert_eq!(result.hosts.len(), 2);

        let icmp = &result.hosts[0];
        assert_eq!(icmp.discovered_via, Discovery::Icmp);
        assert_eq!(icmp.mac, Some(MAC));
        assert_eq!(icmp.hostname.as_deref(), Some("host-1"));

        let tcp = &result.hosts[1];
        assert_eq!(tcp.address, tcp_host);
        assert_eq!(tcp.discovered_via, Discovery::Tcp);
        assert_eq!(tcp.mac, None);
        assert_eq!(tcp.hostname, None);
        assert_eq!(tcp.open_ports, BTreeSet::from([80]));

        assert_eq!(identifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn progress_is_monotonic_and_complete() {
        let ips = candidates(25);
        let outcomes = ips.iter().step_by(5).map(|ip| (*ip, icmp_up())).collect();
        let prober = Arc::new(FakeProber {
            outcomes,
            delay: Duration::from_millis(2),
            ..Default::default()
        });
        let scanner = Scanner::with_components(&config(4), prober, Arc::new(FakeIdentifier::default()));

        let seen: Arc<Mutex<Vec<ScanProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback = Box::new(move |p| sink.lock().unwrap().push(p));

        let result = scanner.scan(&ips, Some(callback)).await;
        let seen = seen.lock().unwrap();

        assert_eq!(seen.len(), 25);
        for (i, progress) in seen.iter().enumerate() {
            assert_eq!(progress.completed, i + 1);
            assert_eq!(progress.total, 25);
        }
        assert!(seen.windows(2).all(|w| w[0].found <= w[1].found));
        assert_eq!(seen.last().map(|p| p.found), Some(5));
        assert_eq!(result.completed_count, result.total_candidates);
        assert_eq!(result.hosts.len(), 5);
    }

    #[tokio::test]
    async fn empty_candidate_list() {
        let scanner = Scanner::with_components(
            &config(20),
            Arc::new(FakeProber::default()),
            Arc::new(FakeIdentifier::default()),
        );
        let result = scanner.scan(&[], None).await;
        assert_eq!(result, ScanResult::default());
    }

    #[tokio::test]
    async fn latency_and_elapsed_recorded() {
        let ip = Ipv4Addr::new(10, 0, 0, 1);
        let prober = Arc::new(FakeProber {
            outcomes: HashMap::from([(ip, icmp_up())]),
            delay: Duration::from_millis(5),
            ..Default::default()
        });
        let scanner = Scanner::with_components(&config(1), prober, Arc::new(FakeIdentifier::default()));

        let result = scanner.scan(&[ip], None).await;
        let host = &result.hosts[0];
        assert_eq!(host.icmp_latency, Some(Duration::from_millis(2)));
        assert!(host.elapsed >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn panicking_pipeline_is_still_counted() {
        let ips = candidates(6);
        let broken = ips[2];
        let outcomes = ips.iter().map(|ip| (*ip, icmp_up())).collect();
        let prober = Arc::new(FakeProber {
            outcomes,
            panic_on: Some(broken),
            ..Default::default()
        });
        let scanner = Scanner::with_components(&config(2), prober, Arc::new(FakeIdentifier::default()));

        let result = scanner.scan(&ips, None).await;

        assert_eq!(result.total_candidates, 6);
        assert_eq!(result.completed_count, result.total_candidates);
        assert_eq!(result.hosts.len(), 5);
        assert!(result.hosts.iter().all(|h| h.address != broken));
    }

    #[tokio::test]
    async fn panicking_progress_callback_counts_each_host_once() {
        let ips = candidates(8);
        let outcomes = ips.iter().map(|ip| (*ip, icmp_up())).collect();
        let prober = Arc::new(FakeProber {
            outcomes,
            ..Default::default()
        });
        let scanner = Scanner::with_components(&config(3), prober, Arc::new(FakeIdentifier::default()));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let callback: ProgressCallback = Box::new(move |p| {
            counter.fetch_add(1, Ordering::SeqCst);
            if p.completed == 1 {
                panic!("callback failed");
            }
        });

        let result = scanner.scan(&ips, Some(callback)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 8);
        assert_eq!(result.completed_count, 8);
        assert_eq!(result.hosts.len(), 8);
    }
}
