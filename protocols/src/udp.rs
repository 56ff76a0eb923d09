use crate::{dns, ntp};

pub const GENERIC_PAYLOAD: &[u8] = b"probe";

const DNS_PORT: u16 = 53;
const NTP_PORT: u16 = 123;
const DNS_PROBE_ID: u16 = 0x6e74;

/// Chooses the datagram sent to `port`. Services that ignore junk get a real request.
pub fn probe_payload(port: u16) -> Vec<u8> {
    match port {
        DNS_PORT => match dns::create_version_query(DNS_PROBE_ID) {
            Ok(query) => query,
            Err(e) => {
                tracing::trace!("falling back to generic DNS probe: {e}");
                GENERIC_PAYLOAD.to_vec()
            }
        },
        NTP_PORT => ntp::create_client_request(),
        _ => GENERIC_PAYLOAD.to_vec(),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
