//! DHCP packet codec per RFC 2131.
//!
//! A DHCP packet consists of a fixed 236-byte header followed by a 4-byte
//! magic cookie and variable-length options. [`Packet`] keeps the raw wire
//! bytes and exposes each field through accessors at its fixed offset, so a
//! received datagram can be inspected and a reply can be sent without an
//! intermediate decode/encode step.
//!
//! # Packet Structure
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     op (1)    |   htype (1)   |   hlen (1)    |   hops (1)    |
//! +---------------+---------------+---------------+---------------+
//! |                            xid (4)                            |
//! +-------------------------------+-------------------------------+
//! |           secs (2)            |           flags (2)           |
//! +-------------------------------+-------------------------------+
//! |                          ciaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          yiaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          siaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          giaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          chaddr (16)                          |
//! +---------------------------------------------------------------+
//! |                          sname (64)                           |
//! +---------------------------------------------------------------+
//! |                          file (128)                           |
//! +---------------------------------------------------------------+
//! |                    magic cookie (4) = 99.130.83.99            |
//! +---------------------------------------------------------------+
//! |                          options (variable)                   |
//! +---------------------------------------------------------------+
//! ```
//!
//! # Lifecycle
//!
//! A packet built with [`Packet::new`] is "open for options": its last byte
//! is the End marker and [`Packet::add_option`] may append more. Once
//! [`Packet::pad_to_min_size`] has run the packet is closed and further
//! appends fail with [`Error::OptionsClosed`].
//!
//! # References
//!
//! - RFC 2131: Dynamic Host Configuration Protocol
//! - RFC 951: Bootstrap Protocol (BOOTP)

use std::net::Ipv4Addr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::helpers::lease_time_bytes;
use crate::options::{DhcpOption, MessageType, OptionCode, Options};

/// DHCP magic cookie that identifies DHCP packets (vs BOOTP).
pub const MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];

const OP_OFFSET: usize = 0;
const HTYPE_OFFSET: usize = 1;
const HLEN_OFFSET: usize = 2;
const HOPS_OFFSET: usize = 3;
const XID_OFFSET: usize = 4;
const SECS_OFFSET: usize = 8;
const FLAGS_OFFSET: usize = 10;
const CIADDR_OFFSET: usize = 12;
const YIADDR_OFFSET: usize = 16;
const SIADDR_OFFSET: usize = 20;
const GIADDR_OFFSET: usize = 24;
const CHADDR_OFFSET: usize = 28;
const SNAME_OFFSET: usize = 44;
const SNAME_SIZE: usize = 64;
const FILE_OFFSET: usize = 108;
const FILE_SIZE: usize = 128;
const MAGIC_COOKIE_OFFSET: usize = 236;
const OPTIONS_OFFSET: usize = 240;

/// Broadcast bit within the first flags byte.
const BROADCAST_BIT: u8 = 0x80;

/// Smallest datagram that can hold the fixed header and magic cookie.
pub const MIN_PACKET_SIZE: usize = OPTIONS_OFFSET;

/// Length every outbound packet is padded to.
///
/// Some BOOTP-era clients reject shorter UDP payloads.
pub const MIN_REPLY_SIZE: usize = 272;

/// Capacity of the chaddr field; hlen may not exceed it.
pub const MAX_HLEN: usize = 16;

/// BOOTP/DHCP operation code for client requests.
pub const BOOTREQUEST: u8 = 1;

/// BOOTP/DHCP operation code for server replies.
pub const BOOTREPLY: u8 = 2;

/// Hardware type for Ethernet (most common).
pub const HTYPE_ETHERNET: u8 = 1;

/// Hardware address length for Ethernet (6 bytes).
pub const HLEN_ETHERNET: u8 = 6;

fn read_ip(bytes: &[u8], offset: usize) -> Ipv4Addr {
    Ipv4Addr::new(
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    )
}

/// Reads the GIADDR field of a raw datagram of at least [`MIN_PACKET_SIZE`] bytes.
pub(crate) fn giaddr_of(bytes: &[u8]) -> Ipv4Addr {
    read_ip(bytes, GIADDR_OFFSET)
}

/// One DHCP/BOOTP message as raw wire bytes.
///
/// The buffer is always at least [`MIN_PACKET_SIZE`] bytes long and its
/// hlen field never exceeds [`MAX_HLEN`]; every constructor enforces this,
/// so field accessors cannot read out of bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet(Vec<u8>);

impl Packet {
    /// Creates an empty packet with the given op code.
    ///
    /// The result is 241 bytes: zeroed header, Ethernet hardware type, the
    /// magic cookie, and a lone End marker in the options region.
    pub fn new(op_code: u8) -> Self {
        let mut bytes = vec![0u8; OPTIONS_OFFSET + 1];
        bytes[OP_OFFSET] = op_code;
        bytes[HTYPE_OFFSET] = HTYPE_ETHERNET;
        bytes[MAGIC_COOKIE_OFFSET..OPTIONS_OFFSET].copy_from_slice(&MAGIC_COOKIE);
        bytes[OPTIONS_OFFSET] = u8::from(OptionCode::End);
        Self(bytes)
    }

    /// Copies a received datagram into a packet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPacket`] if the datagram is shorter than
    /// 240 bytes or its hardware address length exceeds 16.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::try_from(data.to_vec())
    }

    /// Builds a client-originated request.
    ///
    /// Sets the hardware address, transaction ID, optional client IP and
    /// broadcast flag, then appends the message type followed by `options`
    /// in the order given, and pads the result.
    ///
    /// # Errors
    ///
    /// Returns an error if `chaddr` is longer than 16 bytes or any option
    /// value exceeds 255 bytes.
    pub fn request(
        message_type: MessageType,
        chaddr: &[u8],
        ciaddr: Option<Ipv4Addr>,
        xid: u32,
        broadcast: bool,
        options: &[DhcpOption],
    ) -> Result<Self> {
        let mut packet = Self::new(BOOTREQUEST);
        packet.set_chaddr(chaddr)?;
        packet.set_xid(xid);
        if let Some(ciaddr) = ciaddr {
            packet.set_ciaddr(ciaddr);
        }
        packet.set_broadcast(broadcast);
        packet.add_option(OptionCode::MessageType, &[message_type as u8])?;
        for option in options {
            packet.add_option(option.code, &option.value)?;
        }
        packet.pad_to_min_size();
        Ok(packet)
    }

    /// Builds a server reply correlated to `request`.
    ///
    /// The transaction ID, flags, GIADDR, hardware address and seconds are
    /// copied from the request and yiaddr is set to `yiaddr`. Options are
    /// appended in this order: message type, server identifier, lease time
    /// (only when `lease` is `Some`), then `options` as given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptionTooLong`] if any option value exceeds 255 bytes.
    pub fn reply(
        request: &Packet,
        message_type: MessageType,
        server_id: Ipv4Addr,
        yiaddr: Ipv4Addr,
        lease: Option<Duration>,
        options: &[DhcpOption],
    ) -> Result<Self> {
        let mut packet = Self::new(BOOTREPLY);
        packet.set_xid(request.xid());
        packet.set_flags(request.flags());
        packet.set_yiaddr(yiaddr);
        packet.set_giaddr(request.giaddr());
        packet.set_chaddr(request.chaddr())?;
        packet.set_secs(request.secs());
        packet.add_option(OptionCode::MessageType, &[message_type as u8])?;
        packet.add_option(OptionCode::ServerIdentifier, &server_id.octets())?;
        if let Some(lease) = lease {
            packet.add_option(OptionCode::IpAddressLeaseTime, &lease_time_bytes(lease))?;
        }
        for option in options {
            packet.add_option(option.code, &option.value)?;
        }
        packet.pad_to_min_size();
        Ok(packet)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true: every packet holds at least the fixed header.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Operation code: [`BOOTREQUEST`] (1) or [`BOOTREPLY`] (2).
    pub fn op_code(&self) -> u8 {
        self.0[OP_OFFSET]
    }

    pub fn set_op_code(&mut self, op_code: u8) {
        self.0[OP_OFFSET] = op_code;
    }

    /// Hardware address type. [`HTYPE_ETHERNET`] (1) for Ethernet.
    pub fn htype(&self) -> u8 {
        self.0[HTYPE_OFFSET]
    }

    pub fn set_htype(&mut self, htype: u8) {
        self.0[HTYPE_OFFSET] = htype;
    }

    /// Hardware address length, at most [`MAX_HLEN`].
    pub fn hlen(&self) -> u8 {
        self.0[HLEN_OFFSET]
    }

    /// Hop count, incremented by relay agents.
    pub fn hops(&self) -> u8 {
        self.0[HOPS_OFFSET]
    }

    pub fn set_hops(&mut self, hops: u8) {
        self.0[HOPS_OFFSET] = hops;
    }

    /// Transaction ID chosen by client, echoed in replies.
    pub fn xid(&self) -> u32 {
        let b = &self.0[XID_OFFSET..XID_OFFSET + 4];
        u32::from_be_bytes([b[0], b[1], b[2], b[3]])
    }

    pub fn set_xid(&mut self, xid: u32) {
        self.0[XID_OFFSET..XID_OFFSET + 4].copy_from_slice(&xid.to_be_bytes());
    }

    /// Seconds elapsed since client began address acquisition.
    pub fn secs(&self) -> u16 {
        u16::from_be_bytes([self.0[SECS_OFFSET], self.0[SECS_OFFSET + 1]])
    }

    pub fn set_secs(&mut self, secs: u16) {
        self.0[SECS_OFFSET..SECS_OFFSET + 2].copy_from_slice(&secs.to_be_bytes());
    }

    /// Flags. Bit 15 (0x8000) = broadcast flag.
    pub fn flags(&self) -> u16 {
        u16::from_be_bytes([self.0[FLAGS_OFFSET], self.0[FLAGS_OFFSET + 1]])
    }

    pub fn set_flags(&mut self, flags: u16) {
        self.0[FLAGS_OFFSET..FLAGS_OFFSET + 2].copy_from_slice(&flags.to_be_bytes());
    }

    /// Returns true if the client requested broadcast replies.
    ///
    /// Clients set this when they cannot receive unicast before
    /// their IP is configured (RFC 2131 §4.1).
    pub fn broadcast(&self) -> bool {
        self.0[FLAGS_OFFSET] & BROADCAST_BIT != 0
    }

    /// Sets or clears the broadcast bit, leaving the other flag bits alone.
    pub fn set_broadcast(&mut self, broadcast: bool) {
        if self.broadcast() == broadcast {
            return;
        }
        self.0[FLAGS_OFFSET] ^= BROADCAST_BIT;
    }

    /// Client IP address (set by client in RENEWING/REBINDING states).
    pub fn ciaddr(&self) -> Ipv4Addr {
        read_ip(&self.0, CIADDR_OFFSET)
    }

    pub fn set_ciaddr(&mut self, ip: Ipv4Addr) {
        self.0[CIADDR_OFFSET..CIADDR_OFFSET + 4].copy_from_slice(&ip.octets());
    }

    /// "Your" IP address - the address being assigned to the client.
    pub fn yiaddr(&self) -> Ipv4Addr {
        read_ip(&self.0, YIADDR_OFFSET)
    }

    pub fn set_yiaddr(&mut self, ip: Ipv4Addr) {
        self.0[YIADDR_OFFSET..YIADDR_OFFSET + 4].copy_from_slice(&ip.octets());
    }

    /// Server IP address (next server in BOOTP, or DHCP server).
    pub fn siaddr(&self) -> Ipv4Addr {
        read_ip(&self.0, SIADDR_OFFSET)
    }

    pub fn set_siaddr(&mut self, ip: Ipv4Addr) {
        self.0[SIADDR_OFFSET..SIADDR_OFFSET + 4].copy_from_slice(&ip.octets());
    }

    /// Gateway IP address - set by relay agents.
    pub fn giaddr(&self) -> Ipv4Addr {
        giaddr_of(&self.0)
    }

    pub fn set_giaddr(&mut self, ip: Ipv4Addr) {
        self.0[GIADDR_OFFSET..GIADDR_OFFSET + 4].copy_from_slice(&ip.octets());
    }

    /// Client hardware address, the first `hlen` bytes of the chaddr field.
    pub fn chaddr(&self) -> &[u8] {
        let len = self.hlen() as usize;
        &self.0[CHADDR_OFFSET..CHADDR_OFFSET + len]
    }

    /// Stores a hardware address and sets hlen to its length.
    ///
    /// Bytes of the 16-byte field beyond the address are zeroed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPacket`] if `chaddr` is longer than 16 bytes.
    pub fn set_chaddr(&mut self, chaddr: &[u8]) -> Result<()> {
        if chaddr.len() > MAX_HLEN {
            return Err(Error::InvalidPacket(format!(
                "Hardware address length {} exceeds maximum {}",
                chaddr.len(),
                MAX_HLEN
            )));
        }
        let field = &mut self.0[CHADDR_OFFSET..CHADDR_OFFSET + MAX_HLEN];
        field.fill(0);
        field[..chaddr.len()].copy_from_slice(chaddr);
        self.0[HLEN_OFFSET] = chaddr.len() as u8;
        Ok(())
    }

    /// Legacy BOOTP server host name field.
    pub fn sname(&self) -> &[u8] {
        &self.0[SNAME_OFFSET..SNAME_OFFSET + SNAME_SIZE]
    }

    /// Writes the server host name, truncated to 64 bytes.
    pub fn set_sname(&mut self, sname: &[u8]) {
        let len = sname.len().min(SNAME_SIZE);
        let field = &mut self.0[SNAME_OFFSET..SNAME_OFFSET + SNAME_SIZE];
        field.fill(0);
        field[..len].copy_from_slice(&sname[..len]);
    }

    /// Legacy BOOTP boot file name field.
    pub fn file(&self) -> &[u8] {
        &self.0[FILE_OFFSET..FILE_OFFSET + FILE_SIZE]
    }

    /// Writes the boot file name, truncated to 128 bytes.
    pub fn set_file(&mut self, file: &[u8]) {
        let len = file.len().min(FILE_SIZE);
        let field = &mut self.0[FILE_OFFSET..FILE_OFFSET + FILE_SIZE];
        field.fill(0);
        field[..len].copy_from_slice(&file[..len]);
    }

    /// Returns true if bytes 236..240 hold the DHCP magic cookie.
    pub fn has_magic_cookie(&self) -> bool {
        self.0[MAGIC_COOKIE_OFFSET..OPTIONS_OFFSET] == MAGIC_COOKIE
    }

    /// Raw options region, everything after the magic cookie.
    pub fn options_bytes(&self) -> &[u8] {
        &self.0[OPTIONS_OFFSET..]
    }

    /// Scans the options region into a table.
    ///
    /// The scan never fails:
    /// - it stops at End or when fewer than 2 bytes remain;
    /// - Pad bytes are skipped one at a time;
    /// - an option whose length overruns the buffer is omitted and ends the scan;
    /// - a repeated code keeps its last value.
    pub fn parse_options(&self) -> Options {
        let mut options = Options::new();
        let data = self.options_bytes();
        let mut index = 0;

        while data.len() - index >= 2 {
            let code = data[index];

            if code == u8::from(OptionCode::End) {
                break;
            }

            if code == u8::from(OptionCode::Pad) {
                index += 1;
                continue;
            }

            let length = data[index + 1] as usize;
            let start = index + 2;
            if start + length > data.len() {
                break;
            }

            options.insert(OptionCode::from(code), &data[start..start + length]);
            index = start + length;
        }

        options
    }

    /// Appends one option in place of the trailing End marker, then
    /// re-appends End.
    ///
    /// # Errors
    ///
    /// - [`Error::OptionsClosed`] if the packet no longer ends with End
    ///   (for example after [`pad_to_min_size`](Self::pad_to_min_size))
    /// - [`Error::OptionTooLong`] if `value` is longer than 255 bytes
    pub fn add_option(&mut self, code: OptionCode, value: &[u8]) -> Result<()> {
        if self.0.last() != Some(&u8::from(OptionCode::End)) || self.0.len() <= OPTIONS_OFFSET {
            return Err(Error::OptionsClosed);
        }
        let len = u8::try_from(value.len()).map_err(|_| Error::OptionTooLong {
            code: u8::from(code),
            len: value.len(),
        })?;

        self.0.pop();
        self.0.reserve(value.len() + 3);
        self.0.push(u8::from(code));
        self.0.push(len);
        self.0.extend_from_slice(value);
        self.0.push(u8::from(OptionCode::End));
        Ok(())
    }

    /// Removes every option, leaving a lone End marker.
    ///
    /// Also reopens a padded packet for [`add_option`](Self::add_option).
    pub fn strip_options(&mut self) {
        self.0.truncate(OPTIONS_OFFSET);
        self.0.push(u8::from(OptionCode::End));
    }

    /// Zero-pads the packet to [`MIN_REPLY_SIZE`] bytes.
    ///
    /// Must be the last change made to a packet before it is sent.
    pub fn pad_to_min_size(&mut self) {
        if self.0.len() < MIN_REPLY_SIZE {
            self.0.resize(MIN_REPLY_SIZE, 0);
        }
    }
}

impl TryFrom<Vec<u8>> for Packet {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < MIN_PACKET_SIZE {
            return Err(Error::InvalidPacket(format!(
                "Packet too short: {} bytes (minimum {})",
                bytes.len(),
                MIN_PACKET_SIZE
            )));
        }

        let hlen = bytes[HLEN_OFFSET] as usize;
        if hlen > MAX_HLEN {
            return Err(Error::InvalidPacket(format!(
                "Hardware address length {} exceeds maximum {}",
                hlen, MAX_HLEN
            )));
        }

        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Packet> for Vec<u8> {
    fn from(packet: Packet) -> Self {
        packet.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];

    fn create_discover_bytes() -> Vec<u8> {
        let mut packet = vec![0u8; 300];

        packet[0] = BOOTREQUEST;
        packet[1] = HTYPE_ETHERNET;
        packet[2] = HLEN_ETHERNET;
        packet[3] = 0;

        packet[4..8].copy_from_slice(&0x12345678u32.to_be_bytes());
        packet[8..10].copy_from_slice(&7u16.to_be_bytes());
        packet[10..12].copy_from_slice(&0x8000u16.to_be_bytes());

        packet[28..34].copy_from_slice(&MAC);

        packet[236..240].copy_from_slice(&MAGIC_COOKIE);

        packet[240] = 53;
        packet[241] = 1;
        packet[242] = 1;

        packet[243] = 55;
        packet[244] = 3;
        packet[245] = 1;
        packet[246] = 3;
        packet[247] = 6;

        packet[248] = 255;

        packet
    }

    #[test]
    fn test_from_bytes_discover() {
        let packet = Packet::from_bytes(&create_discover_bytes()).unwrap();

        assert_eq!(packet.op_code(), BOOTREQUEST);
        assert_eq!(packet.htype(), HTYPE_ETHERNET);
        assert_eq!(packet.hlen(), HLEN_ETHERNET);
        assert_eq!(packet.xid(), 0x12345678);
        assert_eq!(packet.secs(), 7);
        assert!(packet.broadcast());
        assert_eq!(packet.chaddr(), &MAC);
        assert!(packet.has_magic_cookie());

        let options = packet.parse_options();
        assert_eq!(options.message_type(), Some(MessageType::Discover));
        assert_eq!(options.parameter_request_list(), Some(&[1u8, 3, 6][..]));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_from_bytes_too_short() {
        let result = Packet::from_bytes(&[0u8; 239]);
        assert!(matches!(result, Err(Error::InvalidPacket(_))));
        assert!(Packet::from_bytes(&[0u8; 240]).is_ok());
    }

    #[test]
    fn test_from_bytes_hlen_too_large() {
        let mut data = create_discover_bytes();
        data[2] = 17;
        let result = Packet::from_bytes(&data);
        assert!(matches!(result, Err(Error::InvalidPacket(_))));

        data[2] = 16;
        assert_eq!(Packet::from_bytes(&data).unwrap().chaddr().len(), 16);
    }

    #[test]
    fn test_new_packet_layout() {
        let packet = Packet::new(BOOTREPLY);
        let bytes = packet.as_bytes();

        assert_eq!(bytes.len(), 241);
        assert_eq!(bytes[0], BOOTREPLY);
        assert_eq!(bytes[1], HTYPE_ETHERNET);
        assert_eq!(&bytes[236..240], &MAGIC_COOKIE);
        assert_eq!(bytes[240], 255);
        assert!(packet.parse_options().is_empty());
    }

    #[test]
    fn test_parse_options_skips_pad() {
        let mut data = create_discover_bytes();
        data[240..249].fill(0);
        data[240] = 0;
        data[241] = 0;
        data[242] = 53;
        data[243] = 1;
        data[244] = 3;
        data[245] = 255;

        let options = Packet::from_bytes(&data).unwrap().parse_options();
        assert_eq!(options.len(), 1);
        assert_eq!(options.message_type(), Some(MessageType::Request));
    }

    #[test]
    fn test_parse_options_omits_overrun() {
        let mut data = create_discover_bytes();
        data.truncate(249);
        data[248] = 12;
        data.push(10);
        data.extend_from_slice(b"host");

        let options = Packet::from_bytes(&data).unwrap().parse_options();
        assert_eq!(options.len(), 2);
        assert!(!options.contains(OptionCode::HostName));
    }

    #[test]
    fn test_parse_options_tolerates_missing_end() {
        let mut data = create_discover_bytes();
        data.truncate(248);
        data.push(12);

        let options = Packet::from_bytes(&data).unwrap().parse_options();
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_add_option_keeps_end_marker() {
        let mut packet = Packet::new(BOOTREPLY);
        packet.add_option(OptionCode::HostName, b"node1").unwrap();
        packet.add_option(OptionCode::from(224), &[]).unwrap();

        let bytes = packet.as_bytes();
        assert_eq!(&bytes[240..247], &[12, 5, b'n', b'o', b'd', b'e', b'1']);
        assert_eq!(&bytes[247..249], &[224, 0]);
        assert_eq!(bytes.last(), Some(&255));

        let options = packet.parse_options();
        assert_eq!(options.get(OptionCode::HostName), Some(&b"node1"[..]));
        assert_eq!(options.get(OptionCode::Unassigned(224)), Some(&[][..]));
    }

    #[test]
    fn test_add_option_rejects_long_value() {
        let mut packet = Packet::new(BOOTREPLY);
        let result = packet.add_option(OptionCode::HostName, &[b'a'; 256]);
        let Err(Error::OptionTooLong { code, len }) = result else {
            panic!("expected OptionTooLong, got {:?}", result);
        };
        assert_eq!((code, len), (12, 256));
        assert_eq!(packet.len(), 241);
        let longest = [b'a'; 255];
        assert!(packet.add_option(OptionCode::HostName, &longest).is_ok());
    }

    #[test]
    fn test_add_option_after_padding_fails() {
        let mut packet = Packet::new(BOOTREPLY);
        packet.pad_to_min_size();
        assert_eq!(packet.len(), MIN_REPLY_SIZE);
        assert!(matches!(
            packet.add_option(OptionCode::HostName, b"x"),
            Err(Error::OptionsClosed)
        ));

        packet.strip_options();
        assert_eq!(packet.len(), 241);
        assert!(packet.add_option(OptionCode::HostName, b"x").is_ok());
    }

    #[test]
    fn test_pad_keeps_long_packets() {
        let mut packet = Packet::new(BOOTREPLY);
        packet
            .add_option(OptionCode::Message, &[b'm'; 100])
            .unwrap();
        let before = packet.len();
        packet.pad_to_min_size();
        assert_eq!(packet.len(), before);
    }

    #[test]
    fn test_set_chaddr_updates_hlen() {
        let mut packet = Packet::from_bytes(&create_discover_bytes()).unwrap();
        packet.set_chaddr(&[0xaa, 0xbb]).unwrap();
        assert_eq!(packet.hlen(), 2);
        assert_eq!(packet.chaddr(), &[0xaa, 0xbb]);
        assert_eq!(&packet.as_bytes()[30..44], &[0u8; 14]);

        assert!(packet.set_chaddr(&[0u8; 17]).is_err());
        assert_eq!(packet.hlen(), 2);
    }

    #[test]
    fn test_broadcast_flag() {
        let mut packet = Packet::new(BOOTREPLY);
        packet.set_flags(0x0001);
        assert!(!packet.broadcast());

        packet.set_broadcast(true);
        assert!(packet.broadcast());
        assert_eq!(packet.flags(), 0x8001);

        packet.set_broadcast(true);
        assert_eq!(packet.flags(), 0x8001);

        packet.set_broadcast(false);
        assert_eq!(packet.flags(), 0x0001);
    }

    #[test]
    fn test_address_fields() {
        let mut packet = Packet::new(BOOTREPLY);
        packet.set_ciaddr(Ipv4Addr::new(192, 168, 1, 5));
        packet.set_yiaddr(Ipv4Addr::new(192, 168, 1, 9));
        packet.set_siaddr(Ipv4Addr::new(192, 168, 1, 1));
        packet.set_giaddr(Ipv4Addr::new(10, 0, 0, 1));

        assert_eq!(&packet.as_bytes()[12..16], &[192, 168, 1, 5]);
        assert_eq!(&packet.as_bytes()[16..20], &[192, 168, 1, 9]);
        assert_eq!(&packet.as_bytes()[20..24], &[192, 168, 1, 1]);
        assert_eq!(&packet.as_bytes()[24..28], &[10, 0, 0, 1]);
        assert_eq!(packet.ciaddr(), Ipv4Addr::new(192, 168, 1, 5));
        assert_eq!(packet.yiaddr(), Ipv4Addr::new(192, 168, 1, 9));
        assert_eq!(packet.siaddr(), Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(packet.giaddr(), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_giaddr_of_raw_datagram() {
        let mut packet = Packet::new(BOOTREQUEST);
        packet.set_giaddr(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(giaddr_of(packet.as_bytes()), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(giaddr_of(&create_discover_bytes()), Ipv4Addr::UNSPECIFIED);
    }

    #[test]
    fn test_sname_and_file_truncate() {
        let mut packet = Packet::new(BOOTREPLY);
        packet.set_sname(b"tftp.example");
        packet.set_file(&[b'f'; 200]);

        assert_eq!(&packet.sname()[..12], b"tftp.example");
        assert_eq!(packet.sname()[12], 0);
        assert_eq!(packet.file(), &[b'f'; 128][..]);
        assert!(packet.has_magic_cookie());
    }

    #[test]
    fn test_request_builder() {
        let packet = Packet::request(
            MessageType::Discover,
            &MAC,
            None,
            0xdeadbeef,
            true,
            &[DhcpOption::new(
                OptionCode::ParameterRequestList,
                vec![1, 3, 6],
            )],
        )
        .unwrap();

        assert_eq!(packet.op_code(), BOOTREQUEST);
        assert_eq!(packet.chaddr(), &MAC);
        assert_eq!(packet.xid(), 0xdeadbeef);
        assert!(packet.broadcast());
        assert_eq!(packet.ciaddr(), Ipv4Addr::UNSPECIFIED);
        assert_eq!(packet.len(), MIN_REPLY_SIZE);
        assert_eq!(&packet.options_bytes()[..8], &[53, 1, 1, 55, 3, 1, 3, 6]);
    }

    #[test]
    fn test_reply_copies_correlation_fields() {
        let mut request = Packet::from_bytes(&create_discover_bytes()).unwrap();
        request.set_giaddr(Ipv4Addr::new(10, 0, 0, 1));

        let reply = Packet::reply(
            &request,
            MessageType::Offer,
            Ipv4Addr::new(192, 168, 1, 1),
            Ipv4Addr::new(192, 168, 1, 100),
            Some(Duration::from_secs(3600)),
            &[DhcpOption::ip(
                OptionCode::SubnetMask,
                Ipv4Addr::new(255, 255, 255, 0),
            )],
        )
        .unwrap();

        assert_eq!(reply.op_code(), BOOTREPLY);
        assert_eq!(reply.xid(), request.xid());
        assert_eq!(reply.flags(), request.flags());
        assert_eq!(reply.giaddr(), request.giaddr());
        assert_eq!(reply.chaddr(), request.chaddr());
        assert_eq!(reply.secs(), request.secs());
        assert_eq!(reply.yiaddr(), Ipv4Addr::new(192, 168, 1, 100));
        assert!(reply.len() >= MIN_REPLY_SIZE);

        assert_eq!(
            &reply.options_bytes()[..19],
            &[
                53, 1, 2, 54, 4, 192, 168, 1, 1, 51, 4, 0, 0, 0x0e, 0x10, 1, 4, 255, 255
            ]
        );
    }

    #[test]
    fn test_reply_without_lease_omits_lease_time() {
        let request = Packet::from_bytes(&create_discover_bytes()).unwrap();
        let reply = Packet::reply(
            &request,
            MessageType::Nak,
            Ipv4Addr::new(192, 168, 1, 1),
            Ipv4Addr::UNSPECIFIED,
            None,
            &[],
        )
        .unwrap();

        let options = reply.parse_options();
        assert_eq!(options.message_type(), Some(MessageType::Nak));
        assert!(!options.contains(OptionCode::IpAddressLeaseTime));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_try_from_vec() {
        let packet = Packet::try_from(create_discover_bytes()).unwrap();
        let bytes: Vec<u8> = packet.clone().into();
        assert_eq!(bytes, create_discover_bytes());
        assert_eq!(packet.as_ref(), &bytes[..]);
    }
}
