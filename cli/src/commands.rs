pub mod discover;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use neti_common::config::{Config, DEFAULT_CONCURRENCY, DEFAULT_MAX_CANDIDATES};

#[derive(Parser, Debug)]
#[command(name = "neti")]
#[command(about = "Find live hosts on an IPv4 subnet.")]
#[command(version)]
pub struct CommandLine {
    /// Subnet in CIDR notation, e.g. 192.168.1.0/24
    pub subnet: String,

    /// Also connect to well-known TCP ports (finds hosts that drop ICMP)
    #[arg(long)]
    pub tcp: bool,

    /// Also probe well-known UDP ports on hosts that already answered
    #[arg(long)]
    pub udp: bool,

    /// Maximum number of hosts probed at the same time
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-probe timeout in milliseconds
    #[arg(short, long, default_value_t = 500)]
    pub timeout: u64,

    /// Skip reverse DNS lookups
    #[arg(long)]
    pub no_dns: bool,

    /// Give up on a reverse DNS lookup after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub dns_timeout: Option<u64>,

    /// Refuse subnets spanning more addresses than this
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_CANDIDATES)]
    pub max_hosts: u64,

    /// Read vendor names from an IEEE oui.txt instead of the built-in database
    #[arg(long, value_name = "PATH")]
    pub oui_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn to_config(&self) -> Config {
        Config {
            concurrency: self.concurrency,
            timeout: Duration::from_millis(self.timeout),
            use_tcp: self.tcp,
            use_udp: self.udp,
            no_dns: self.no_dns,
            dns_timeout: self.dns_timeout.map(Duration::from_millis),
            max_candidates: self.max_hosts,
            oui_file: self.oui_file.clone(),
            ..Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_config() {
        let cli = CommandLine::try_parse_from(["neti", "10.0.0.0/24"]).unwrap();
        let cfg = cli.to_config();
        assert_eq!(cli.subnet, "10.0.0.0/24");
        assert_eq!(cfg.concurrency, 20);
        assert_eq!(cfg.timeout, Duration::from_millis(500));
        assert!(!cfg.use_tcp && !cfg.use_udp && !cfg.no_dns);
        assert_eq!(cfg.dns_timeout, None);
        assert_eq!(cfg.max_candidates, 65_536);
        assert_eq!(cfg.oui_file, None);
    }

    #[test]
    fn flags_are_mapped() {
        let cli = CommandLine::try_parse_from([
            "neti", "192.168.1.0/28", "--tcp", "--udp", "-c", "5", "-t", "250", "--no-dns",
            "--dns-timeout", "800", "-vv",
        ])
        .unwrap();
        let cfg = cli.to_config();
        assert!(cfg.use_tcp && cfg.use_udp && cfg.no_dns);
        assert_eq!(cfg.concurrency, 5);
        assert_eq!(cfg.timeout, Duration::from_millis(250));
        assert_eq!(cfg.dns_timeout, Some(Duration::from_millis(800)));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn vendor_file_and_host_limit_are_mapped() {
        let cli = CommandLine::try_parse_from([
            "neti", "10.0.0.0/8", "--max-hosts", "16777216", "--oui-file", "/usr/share/ieee-data/oui.txt",
        ])
        .unwrap();
        let cfg = cli.to_config();
        assert_eq!(cfg.max_candidates, 1 << 24);
        assert_eq!(cfg.oui_file, Some(PathBuf::from("/usr/share/ieee-data/oui.txt")));
    }

    #[test]
    fn subnet_is_required() {
        assert!(CommandLine::try_parse_from(["neti"]).is_err());
    }
}
