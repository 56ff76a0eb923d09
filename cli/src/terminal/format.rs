use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

use colored::*;
use neti_common::network::host::Discovery;
use neti_common::network::mac;
use pnet::util::MacAddr;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn ipv4_to_detail(ip: Ipv4Addr) -> Detail {
    ("IPv4".to_string(), ip.to_string().color(colors::IPV4_ADDR))
}

pub fn mac_to_detail(mac: Option<MacAddr>) -> Option<Detail> {
    let mac = mac?;
    Some(("MAC".to_string(), mac::format_mac(mac).color(colors::MAC_ADDR)))
}

pub fn vendor_to_detail(vendor: Option<&str>) -> Option<Detail> {
    let vendor = vendor?;
    Some(("Vendor".to_string(), vendor.color(colors::VENDOR)))
}

pub fn ports_to_detail(ports: &BTreeSet<u16>) -> Option<Detail> {
    if ports.is_empty() {
        return None;
    }
    Some(("Ports".to_string(), join_ports(ports).color(colors::PORTS)))
}

pub fn latency_to_detail(latency: Option<Duration>) -> Option<Detail> {
    let latency = latency?;
    Some(("Latency".to_string(), format_latency(latency).color(colors::LATENCY)))
}

pub fn via_to_detail(via: Discovery) -> Detail {
    ("Via".to_string(), via.to_string().color(colors::TEXT_DEFAULT))
}

fn join_ports(ports: &BTreeSet<u16>) -> String {
    ports
        .iter()
        .map(u16::to_string)
        .collect::<Vec<String>>()
        .join(", ")
}

fn format_latency(latency: Duration) -> String {
    let ms = latency.as_secs_f64() * 1000.0;
    if ms < 1.0 {
        format!("{:.0}µs", latency.as_secs_f64() * 1_000_000.0)
    } else {
        format!("{ms:.1}ms")
    }
}
