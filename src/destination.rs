//! Reply destination selection per RFC 2131 §4.1.
//!
//! A server reply goes to exactly one of three places: the relay agent that
//! forwarded the request, the client's own unicast address, or the limited
//! broadcast address. Which one is decided from the *request*, never the
//! reply, using this precedence:
//!
//! 1. GIADDR set: unicast to the relay agent.
//! 2. CIADDR set: unicast to the client's current address.
//! 3. Broadcast flag set: broadcast.
//! 4. yiaddr set: unicast to it. The dispatch loop fills yiaddr from the UDP
//!    source address when the client left it empty.
//! 5. Otherwise broadcast.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::packet::Packet;

/// UDP port DHCP clients listen on.
pub const CLIENT_PORT: u16 = 68;

/// UDP port DHCP servers listen on.
pub const SERVER_PORT: u16 = 67;

/// Where a reply must be sent and which broadcast flag it must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub address: SocketAddrV4,
    /// True iff `address` is the limited broadcast address. Written to the
    /// reply's flags before sending.
    pub broadcast: bool,
}

/// Picks the reply destination for `request`.
///
/// The port is `source_port` when known, otherwise [`CLIENT_PORT`]. A port
/// of 0 counts as unknown.
pub fn select_destination(request: &Packet, source_port: Option<u16>) -> Destination {
    let ip = if !request.giaddr().is_unspecified() {
        request.giaddr()
    } else if !request.ciaddr().is_unspecified() {
        request.ciaddr()
    } else if request.broadcast() {
        Ipv4Addr::BROADCAST
    } else if !request.yiaddr().is_unspecified() {
        request.yiaddr()
    } else {
        Ipv4Addr::BROADCAST
    };

    let port = match source_port {
        Some(port) if port != 0 => port,
        _ => CLIENT_PORT,
    };

    Destination {
        address: SocketAddrV4::new(ip, port),
        broadcast: ip.is_broadcast(),
    }
}
