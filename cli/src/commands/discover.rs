use std::time::{Duration, Instant};

use colored::*;
use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::{mprint, terminal::{colors, format, print}};
use neti_common::config::Config;
use neti_common::network::host::{HostRecord, ScanProgress, ScanResult};
use neti_common::network::range;
use neti_common::vendors;
use neti_common::{error, info, success, warn};
use neti_core::discovery::DiscoveryService;
use neti_core::scanner::{ProgressCallback, Scanner};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.blue} [{bar:30.green/bright_black}] {pos}/{len} {msg}";

pub async fn discover(subnet: &str, cfg: &Config) -> anyhow::Result<()> {
    if !is_root::is_root() {
        warn!("Not running with root privileges: ICMP needs raw sockets, hosts may only show up via --tcp");
    }
    print_parameters(subnet, cfg);

    if let Ok(block) = range::parse_cidr(subnet) {
        info!("Searching for hosts from {} to {}", block.start_addr, block.end_addr);
    }
    if let Some(path) = &cfg.oui_file {
        info!("Vendor names from {}", path.display());
    }

    let service = DiscoveryService::new(vendors::repository(cfg.oui_file.as_deref()), Scanner::new(cfg))
        .with_max_candidates(cfg.max_candidates);

    let span = info_span!("discovery", indicatif.pb_show = true);
    span.pb_set_style(&ProgressStyle::with_template(PROGRESS_TEMPLATE)?.progress_chars("━╸ "));
    span.pb_set_message("hosts found: 0");
    let guard = span.enter();

    let start_time: Instant = Instant::now();
    let result = service
        .perform_discovery(subnet, Some(progress_reporter(span.clone())))
        .await;

    drop(guard);
    drop(span);

    let result: ScanResult = match result {
        Ok(result) => result,
        Err(e @ range::AddressError::TooManyCandidates { .. }) => {
            error!("{e}; raise --max-hosts to scan it anyway");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    discovery_ends(&result, start_time.elapsed());
    Ok(())
}

fn progress_reporter(span: Span) -> ProgressCallback {
    Box::new(move |progress: ScanProgress| {
        span.pb_set_length(progress.total as u64);
        span.pb_set_position(progress.completed as u64);
        span.pb_set_message(&format!("hosts found: {}", progress.found));
    })
}

fn print_parameters(subnet: &str, cfg: &Config) {
    let mut probes: Vec<&str> = vec!["ICMP"];
    if cfg.use_tcp {
        probes.push("TCP");
    }
    if cfg.use_udp {
        probes.push("UDP");
    }

    let key_width: usize = "Concurrency".len();
    print::header("getting ready for discovery");
    print::aligned_line("Subnet", subnet.color(colors::IPV4_ADDR), key_width);
    print::aligned_line("Probes", probes.join(", "), key_width);
    print::aligned_line("Concurrency", cfg.effective_concurrency(), key_width);
    print::aligned_line("Timeout", format!("{}ms", cfg.timeout.as_millis()), key_width);
}

fn discovery_ends(result: &ScanResult, total_time: Duration) {
    if result.hosts.is_empty() {
        print::header("ZERO HOSTS DETECTED");
        print::no_results();
        return;
    }

    print::header("Network Discovery");
    print_hosts(&result.hosts);
    print_summary(result, total_time);
}

fn print_hosts(hosts: &[HostRecord]) {
    for (idx, host) in hosts.iter().enumerate() {
        print_host_tree(host, idx);
        if idx + 1 != hosts.len() {
            mprint!();
        }
    }
}

fn print_summary(result: &ScanResult, total_time: Duration) {
    let responded: ColoredString =
        format!("{}/{} hosts", result.hosts.len(), result.total_candidates).bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: String = format!("Discovery Complete: {responded} responded in {total_time}")
        .color(colors::TEXT_DEFAULT)
        .to_string();

    print::fat_separator();
    print::centerln(&output);
    success!("{} of {} candidates probed", result.completed_count, result.total_candidates);
}

fn print_host_tree(host: &HostRecord, idx: usize) {
    let hostname = host.hostname.as_deref().unwrap_or("No hostname");
    print::tree_head(idx, hostname);

    let mut details: Vec<format::Detail> = vec![format::ipv4_to_detail(host.address)];
    details.extend(format::mac_to_detail(host.mac));
    details.extend(format::vendor_to_detail(host.vendor.as_deref()));
    details.extend(format::ports_to_detail(&host.open_ports));
    details.extend(format::latency_to_detail(host.icmp_latency));
    details.push(format::via_to_detail(host.discovered_via));

    print::as_tree_one_level(details);
}
