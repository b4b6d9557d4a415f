//! IPv4 arithmetic and option value encoding shared by handlers.

use std::net::Ipv4Addr;
use std::time::Duration;

/// Number of addresses in the inclusive range `start..=stop`.
///
/// Returns 0 when `stop` is below `start`.
pub fn ip_range(start: Ipv4Addr, stop: Ipv4Addr) -> u64 {
    let start = u32::from(start) as u64;
    let stop = u32::from(stop) as u64;
    if stop < start { 0 } else { stop - start + 1 }
}

/// Returns `start + offset`, wrapping at 255.255.255.255.
pub fn ip_add(start: Ipv4Addr, offset: u32) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(start).wrapping_add(offset))
}

/// Offset of `ip` from `start`, or `None` when `ip` lies below it.
pub fn ip_offset(start: Ipv4Addr, ip: Ipv4Addr) -> Option<u32> {
    u32::from(ip).checked_sub(u32::from(start))
}

/// Whether `ip` falls in the inclusive range `start..=stop`.
pub fn ip_in_range(start: Ipv4Addr, stop: Ipv4Addr, ip: Ipv4Addr) -> bool {
    start <= ip && ip <= stop
}

/// Concatenates addresses into a single option value.
pub fn join_ips(addresses: &[Ipv4Addr]) -> Vec<u8> {
    addresses.iter().flat_map(|ip| ip.octets()).collect()
}

/// Encodes a lease duration as big-endian whole seconds.
///
/// Durations beyond `u32::MAX` seconds saturate, which clients read as an
/// infinite lease.
pub fn lease_time_bytes(duration: Duration) -> [u8; 4] {
    u32::try_from(duration.as_secs())
        .unwrap_or(u32::MAX)
        .to_be_bytes()
}
