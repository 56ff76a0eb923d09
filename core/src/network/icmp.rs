use std::net::Ipv4Addr;
use std::time::Duration;

#[cfg(unix)]
use anyhow::Context;
#[cfg(unix)]
use pnet::{
    packet::{Packet, icmp::IcmpPacket, ip::IpNextHeaderProtocols},
    transport::{self, TransportChannelType, TransportProtocol},
};
#[cfg(unix)]
use std::{net::IpAddr, time::Instant};

#[cfg(unix)]
use neti_protocols::icmp;

#[cfg(unix)]
const TRANSPORT_BUFFER_SIZE: usize = 4096;
/// Read deadline re-armed on every poll so the probe never overruns its timeout.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[cfg(unix)]
const CHANNEL_TYPE_ICMP: TransportChannelType =
    TransportChannelType::Layer4(TransportProtocol::Ipv4(IpNextHeaderProtocols::Icmp));

/// Sends one Echo-Request and waits up to `timeout` for the matching reply.
///
/// Blocking. `Ok(None)` means no valid reply arrived; replies from other hosts,
/// other packet types and other identifiers are skipped.
#[cfg(unix)]
pub fn ping(target: Ipv4Addr, timeout: Duration) -> anyhow::Result<Option<Duration>> {
    let (mut tx, mut rx) = transport::transport_channel(TRANSPORT_BUFFER_SIZE, CHANNEL_TYPE_ICMP)
        .context("opening raw ICMP socket")?;

    let identifier: u16 = icmp::process_identifier();
    let request: Vec<u8> = icmp::create_echo_request(identifier, 1, icmp::ECHO_PAYLOAD)?;
    let packet = IcmpPacket::new(&request).context("wrapping echo request")?;

    let target_ip = IpAddr::V4(target);
    let start = Instant::now();
    let deadline = start + timeout;
    tx.send_to(packet, target_ip)
        .with_context(|| format!("sending echo request to {target}"))?;

    let mut replies = transport::icmp_packet_iter(&mut rx);
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }

        match replies.next_with_timeout(POLL_INTERVAL.min(deadline - now)) {
            Ok(Some((reply, source))) => {
                if source == target_ip && icmp::is_echo_reply(reply.packet(), identifier) {
                    return Ok(Some(start.elapsed()));
                }
            }
            Ok(None) => {}
            Err(e) => tracing::trace!("ICMP read for {target}: {e}"),
        }
    }
}

#[cfg(not(unix))]
pub fn ping(target: Ipv4Addr, _timeout: Duration) -> anyhow::Result<Option<Duration>> {
    anyhow::bail!("raw ICMP polling is not available on this platform ({target} skipped)")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
