use pnet::util::MacAddr;

/// Renders a MAC as upper-case, colon separated hex (`00:1A:2B:3C:4D:5E`).
pub fn format_mac(mac: MacAddr) -> String {
    mac.to_string().to_uppercase()
}

/// The all-zero address marks incomplete neighbor entries and is never a real MAC.
pub fn is_valid_mac(mac: MacAddr) -> bool {
    mac != MacAddr::zero()
}

/// Parses `aa:bb:cc:dd:ee:ff` or `aa-bb-cc-dd-ee-ff`, rejecting the zero address.
pub fn parse_mac(s: &str) -> Option<MacAddr> {
    let normalized: String = s.trim().replace('-', ":");
    let mac: MacAddr = normalized.parse().ok()?;
    is_valid_mac(mac).then_some(mac)
}

/// Upper-case 6 hex digit OUI prefix, e.g. `001A2B`.
pub fn oui_prefix(mac: MacAddr) -> String {
    let MacAddr(a, b, c, ..) = mac;
    format!("{a:02X}{b:02X}{c:02X}")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_mac_is_upper_case() {
        let mac = MacAddr::new(0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e);
        assert_eq!(format_mac(mac), "00:1A:2B:3C:4D:5E");
    }

    #[test]
    fn parse_mac_accepts_both_separators() {
        let expected = MacAddr::new(0xa8, 0xa1, 0x59, 0x13, 0x41, 0x46);
        assert_eq!(parse_mac("a8:a1:59:13:41:46"), Some(expected));
        assert_eq!(parse_mac("A8-A1-59-13-41-46"), Some(expected));
    }

    #[test]
    fn parse_mac_rejects_zero_and_garbage() {
        assert_eq!(parse_mac("00:00:00:00:00:00"), None);
        assert_eq!(parse_mac("not-a-mac"), None);
        assert_eq!(parse_mac("aa:bb:cc"), None);
        assert_eq!(parse_mac(""), None);
    }

    #[test]
    fn oui_prefix_takes_first_three_octets() {
        let mac = MacAddr::new(0x34, 0xcf, 0xf6, 0x9a, 0x11, 0x22);
        assert_eq!(oui_prefix(mac), "34CFF6");
    }
}
