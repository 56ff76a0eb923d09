//! Per-host network primitives used by the prober and identifier.

pub mod dns;
pub mod icmp;
pub mod tcp;
pub mod udp;
