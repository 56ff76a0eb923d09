use anyhow::Context;
use pnet::packet::dns::{DnsClass, DnsQuery, DnsType, MutableDnsPacket, Opcode, Retcode};

pub const DNS_HDR_LEN: usize = 12;

const QTYPE_TXT: DnsType = DnsType(16);
const QCLASS_CHAOS: DnsClass = DnsClass(3);

/// `version.bind` CHAOS TXT, answered by most authoritative and recursive servers.
pub fn create_version_query(id: u16) -> anyhow::Result<Vec<u8>> {
    let query: DnsQuery = DnsQuery {
        qname: encode_dns_name("version.bind"),
        qtype: QTYPE_TXT,
        qclass: QCLASS_CHAOS,
        payload: Vec::new(),
    };
    create_query_packet(&query, id)
}

fn create_query_packet(query: &DnsQuery, id: u16) -> anyhow::Result<Vec<u8>> {
    let q_fixed_len: usize = 4;
    let qlen: usize = query.qname.len() + q_fixed_len;
    let total: usize = DNS_HDR_LEN + qlen;
    let mut buffer: Vec<u8> = vec![0u8; total];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).context("creating dns header")?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_authoriative(0);
        dns.set_is_truncated(0);
        dns.set_is_recursion_desirable(0);
        dns.set_is_recursion_available(0);
        dns.set_zero_reserved(0);
        dns.set_is_non_authenticated_data(0);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
        dns.set_response_count(0);
        dns.set_authority_rr_count(0);
        dns.set_additional_rr_count(0);
    }

    let mut cursor: usize = DNS_HDR_LEN;

    buffer[cursor..cursor + query.qname.len()].copy_from_slice(&query.qname);
    cursor += query.qname.len();

    buffer[cursor..cursor + 2].copy_from_slice(&query.qtype.0.to_be_bytes());
    cursor += 2;

    buffer[cursor..cursor + 2].copy_from_slice(&query.qclass.0.to_be_bytes());

    Ok(buffer)
}

fn encode_dns_name(name: &str) -> Vec<u8> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
