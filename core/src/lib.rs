//! Host discovery engine.
//!
//! * [`scanner`]: bounded fan-out of per-host pipelines and result aggregation.
//! * [`prober`]: ICMP, TCP and UDP reachability checks for one host.
//! * [`identify`]: MAC and hostname lookup for hosts that answered ICMP.
//! * [`resolver`]: the IPv4 to MAC resolver and OS neighbor-table sources.
//! * [`discovery`]: the subnet-in, sorted-hosts-out use case.

pub mod discovery;
pub mod identify;
pub mod network;
pub mod prober;
pub mod resolver;
pub mod scanner;
