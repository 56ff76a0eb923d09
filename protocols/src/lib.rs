//! Wire formats used by the probe engine.

pub mod dns;
pub mod icmp;
pub mod ntp;
pub mod udp;
