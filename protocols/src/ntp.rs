pub const NTP_PACKET_LEN: usize = 48;

const LI_NONE: u8 = 0;
const VERSION_3: u8 = 3;
const MODE_CLIENT: u8 = 3;

/// Minimal NTPv3 client request: header byte set, every other field zero.
pub fn create_client_request() -> Vec<u8> {
    let mut buffer: Vec<u8> = vec![0u8; NTP_PACKET_LEN];
    buffer[0] = (LI_NONE << 6) | (VERSION_3 << 3) | MODE_CLIENT;
    buffer
}
