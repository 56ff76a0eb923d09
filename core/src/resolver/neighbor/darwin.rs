//! BSD routing-socket dump of link-layer routes (`NET_RT_FLAGS` / `RTF_LLINFO`).

use std::net::Ipv4Addr;

use pnet::util::MacAddr;

const AF_INET: u8 = 2;
const AF_LINK: u8 = 18;
const SOCKADDR_DL_DATA_OFFSET: usize = 8;

#[cfg(target_os = "macos")]
pub struct DarwinRoutingSocket;

#[cfg(target_os = "macos")]
impl super::NeighborSource for DarwinRoutingSocket {
    fn read_table(&self) -> anyhow::Result<Vec<(Ipv4Addr, MacAddr)>> {
        let dump: Vec<u8> = sysctl_route_dump()?;
        Ok(parse_route_dump(&dump, std::mem::size_of::<libc::rt_msghdr>()))
    }
}

#[cfg(target_os = "macos")]
fn sysctl_route_dump() -> anyhow::Result<Vec<u8>> {
    use std::ptr;

    let mut mib: [libc::c_int; 6] = [
        libc::CTL_NET,
        libc::PF_ROUTE,
        0,
        libc::AF_INET,
        libc::NET_RT_FLAGS,
        libc::RTF_LLINFO,
    ];
    let mut len: libc::size_t = 0;

    // SAFETY: a null buffer asks the kernel for the required length only.
    let ret = unsafe {
        libc::sysctl(mib.as_mut_ptr(), mib.len() as u32, ptr::null_mut(), &mut len, ptr::null_mut(), 0)
    };
    anyhow::ensure!(ret == 0, "sysctl size query failed: {}", std::io::Error::last_os_error());

    let mut buf: Vec<u8> = vec![0u8; len];
    // SAFETY: `buf` is `len` bytes long and `len` is updated to the bytes written.
    let ret = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            mib.len() as u32,
            buf.as_mut_ptr().cast(),
            &mut len,
            ptr::null_mut(),
            0,
        )
    };
    anyhow::ensure!(ret == 0, "sysctl route dump failed: {}", std::io::Error::last_os_error());

    buf.truncate(len);
    Ok(buf)
}

/// Walks `rt_msghdr` records; each is followed by a `sockaddr_in` (destination)
/// and a `sockaddr_dl` (gateway) carrying the hardware address.
pub(super) fn parse_route_dump(buf: &[u8], hdr_len: usize) -> Vec<(Ipv4Addr, MacAddr)> {
    let mut entries = Vec::new();
    let mut offset: usize = 0;

    while offset + 2 <= buf.len() {
        let msg_len = u16::from_ne_bytes([buf[offset], buf[offset + 1]]) as usize;
        if msg_len == 0 || offset + msg_len > buf.len() {
            break;
        }
        if let Some(entry) = parse_route_message(&buf[offset..offset + msg_len], hdr_len) {
            entries.push(entry);
        }
        offset += msg_len;
    }

    entries
}

fn parse_route_message(msg: &[u8], hdr_len: usize) -> Option<(Ipv4Addr, MacAddr)> {
    let sin = msg.get(hdr_len..)?;
    let sin_len = *sin.first()? as usize;
    if *sin.get(1)? != AF_INET {
        return None;
    }
    let addr: [u8; 4] = sin.get(4..8)?.try_into().ok()?;
    let ip = Ipv4Addr::from(addr);

    let sdl = sin.get(sockaddr_roundup(sin_len)..)?;
    if *sdl.get(1)? != AF_LINK {
        return None;
    }
    let name_len = *sdl.get(5)? as usize;
    let addr_len = *sdl.get(6)? as usize;
    if addr_len != 6 {
        return None;
    }
    let start = SOCKADDR_DL_DATA_OFFSET + name_len;
    let hw: &[u8] = sdl.get(start..start + 6)?;

    Some((ip, MacAddr::new(hw[0], hw[1], hw[2], hw[3], hw[4], hw[5])))
}

/// Routing sockaddrs are padded to 4-byte boundaries; a zero length still takes 4.
fn sockaddr_roundup(len: usize) -> usize {
    if len == 0 { 4 } else { (len + 3) & !3 }
}
