use std::net::Ipv4Addr;

use pnet::util::MacAddr;
use windows::Win32::Foundation::{ERROR_INSUFFICIENT_BUFFER, FALSE, NO_ERROR};
use windows::Win32::NetworkManagement::IpHelper::{GetIpNetTable, MIB_IPNETROW_LH, MIB_IPNETTABLE};

/// IP Helper `GetIpNetTable`.
pub struct WindowsNeighborApi;

impl super::NeighborSource for WindowsNeighborApi {
    fn read_table(&self) -> anyhow::Result<Vec<(Ipv4Addr, MacAddr)>> {
        let mut size: u32 = 0;
        // SAFETY: a null table pointer makes the call report the required size.
        let ret = unsafe { GetIpNetTable(None, &mut size, FALSE) };
        anyhow::ensure!(
            ret == ERROR_INSUFFICIENT_BUFFER.0,
            "GetIpNetTable size query returned {ret}"
        );

        // u32 storage keeps the table header aligned.
        let mut buf: Vec<u32> = vec![0u32; (size as usize).div_ceil(4)];
        let table = buf.as_mut_ptr().cast::<MIB_IPNETTABLE>();
        // SAFETY: `buf` holds at least `size` bytes.
        let ret = unsafe { GetIpNetTable(Some(table), &mut size, FALSE) };
        anyhow::ensure!(ret == NO_ERROR.0, "GetIpNetTable returned {ret}");

        // SAFETY: on success the kernel wrote `dwNumEntries` rows after the count.
        let rows: &[MIB_IPNETROW_LH] = unsafe {
            let count = (*table).dwNumEntries as usize;
            std::slice::from_raw_parts((*table).table.as_ptr(), count)
        };

        Ok(rows
            .iter()
            .filter(|row| row.dwPhysAddrLen == 6)
            .map(|row| {
                let ip = Ipv4Addr::from(row.dwAddr.to_ne_bytes());
                let b = row.bPhysAddr;
                (ip, MacAddr::new(b[0], b[1], b[2], b[3], b[4], b[5]))
            })
            .collect())
    }
}
