use anyhow::Context;
use pnet::packet::Packet;
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{self, IcmpCode, IcmpPacket, IcmpTypes};

pub const ICMP_ECHO_HDR_LEN: usize = 8;
pub const ECHO_PAYLOAD: &[u8] = b"ping";

/// Builds an ICMPv4 Echo-Request with a valid checksum.
pub fn create_echo_request(identifier: u16, sequence: u16, payload: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut buffer: Vec<u8> = vec![0u8; ICMP_ECHO_HDR_LEN + payload.len()];
    {
        let mut echo: MutableEchoRequestPacket =
            MutableEchoRequestPacket::new(&mut buffer).context("creating echo request packet")?;
        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(IcmpCode::new(0));
        echo.set_identifier(identifier);
        echo.set_sequence_number(sequence);
        echo.set_payload(payload);
        echo.set_checksum(0);
    }

    let csm: u16 = {
        let icmp_pkt = IcmpPacket::new(&buffer).context("reading back echo request")?;
        icmp::checksum(&icmp_pkt)
    };
    let mut echo = MutableEchoRequestPacket::new(&mut buffer).context("setting checksum")?;
    echo.set_checksum(csm);

    Ok(buffer)
}

/// True when `bytes` is an Echo-Reply carrying `identifier`.
pub fn is_echo_reply(bytes: &[u8], identifier: u16) -> bool {
    let Some(packet) = IcmpPacket::new(bytes) else {
        return false;
    };
    if packet.get_icmp_type() != IcmpTypes::EchoReply {
        return false;
    }
    EchoReplyPacket::new(packet.packet())
        .map(|reply| reply.get_identifier() == identifier)
        .unwrap_or(false)
}

/// Identifier derived from the process id, as `ping` does.
pub fn process_identifier() -> u16 {
    (std::process::id() & 0xffff) as u16
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
