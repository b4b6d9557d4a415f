//! DHCP options as defined in RFC 2132.
//!
//! DHCP uses options to convey configuration parameters between servers and clients.
//! Each option has a code (1 byte), length (1 byte), and variable-length data.
//!
//! The core keeps option values as raw bytes: interpreting them is the
//! handler's job. [`Options`] is the table the codec produces for each
//! inbound packet, and [`DhcpOption`] is the (code, value) pair used when
//! building replies.
//!
//! # References
//!
//! - RFC 2132: DHCP Options and BOOTP Vendor Extensions
//! - RFC 3046: DHCP Relay Agent Information Option (Option 82)

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::helpers::{join_ips, lease_time_bytes};

/// How a named option's value is written in human-authored configuration.
///
/// Used by [`option_map`](crate::option_map) to translate JSON values into
/// wire bytes. The codec itself never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `"255.255.255.0"` -> 4 bytes.
    Ipv4,
    /// `["10.0.0.1", "10.0.0.2"]` -> 4 bytes per address.
    Ipv4List,
    /// `["10.0.0.0 255.0.0.0"]` -> 8 bytes per pair.
    Ipv4PairList,
    /// Signed 32-bit, two's complement big-endian.
    I32,
    U32,
    U16,
    U8,
    /// `[576, 1500]` -> 2 bytes per entry.
    U16List,
    /// `true` -> `[1]`, `false` -> `[0]`.
    Flag,
    /// UTF-8 string bytes, no terminator.
    Text,
    /// Array of raw byte values.
    Bytes,
    /// Pad and End carry no value and cannot be configured.
    Reserved,
}

macro_rules! option_codes {
    ($( $(#[$meta:meta])* $name:ident = $value:literal => $kind:ident, )*) => {
        /// DHCP option codes as defined in RFC 2132 and later extensions.
        ///
        /// The mapping to wire codes is total in both directions: every named
        /// variant has a code, and codes without a name become
        /// [`Unassigned`](Self::Unassigned). Always build codes through
        /// [`From<u8>`] so a named code is never represented as `Unassigned`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum OptionCode {
            $( $(#[$meta])* $name, )*
            /// A code with no name in this table, preserved as-is.
            Unassigned(u8),
        }

        impl OptionCode {
            /// Every named code, in ascending table order.
            pub const NAMED: &'static [OptionCode] = &[$(OptionCode::$name,)*];

            /// Returns the option's name, e.g. `"SubnetMask"`.
            pub fn name(&self) -> Option<&'static str> {
                match self {
                    $(Self::$name => Some(stringify!($name)),)*
                    Self::Unassigned(_) => None,
                }
            }

            /// Looks up a named code, e.g. `"Router"` -> [`OptionCode::Router`].
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($name) => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// Returns how this option's value is written in configuration.
            pub fn kind(&self) -> ValueKind {
                match self {
                    $(Self::$name => ValueKind::$kind,)*
                    Self::Unassigned(_) => ValueKind::Bytes,
                }
            }
        }

        impl From<OptionCode> for u8 {
            fn from(code: OptionCode) -> u8 {
                match code {
                    $(OptionCode::$name => $value,)*
                    OptionCode::Unassigned(value) => value,
                }
            }
        }

        impl From<u8> for OptionCode {
            fn from(value: u8) -> Self {
                match value {
                    $($value => Self::$name,)*
                    other => Self::Unassigned(other),
                }
            }
        }
    };
}

option_codes! {
    /// Padding (no operation). Used for alignment.
    Pad = 0 => Reserved,
    /// Subnet mask (RFC 2132 §3.3).
    SubnetMask = 1 => Ipv4,
    TimeOffset = 2 => I32,
    /// Router/gateway addresses (RFC 2132 §3.5).
    Router = 3 => Ipv4List,
    TimeServer = 4 => Ipv4List,
    NameServer = 5 => Ipv4List,
    /// DNS server addresses (RFC 2132 §3.8).
    DomainNameServer = 6 => Ipv4List,
    LogServer = 7 => Ipv4List,
    CookieServer = 8 => Ipv4List,
    LprServer = 9 => Ipv4List,
    ImpressServer = 10 => Ipv4List,
    ResourceLocationServer = 11 => Ipv4List,
    /// Client hostname (RFC 2132 §3.14).
    HostName = 12 => Text,
    BootFileSize = 13 => U16,
    MeritDumpFile = 14 => Text,
    /// Domain name for DNS resolution (RFC 2132 §3.17).
    DomainName = 15 => Text,
    SwapServer = 16 => Ipv4,
    RootPath = 17 => Text,
    ExtensionsPath = 18 => Text,

    // IP layer parameters per host
    IpForwarding = 19 => Flag,
    NonLocalSourceRouting = 20 => Flag,
    PolicyFilter = 21 => Ipv4PairList,
    MaximumDatagramReassemblySize = 22 => U16,
    DefaultIpTimeToLive = 23 => U8,
    PathMtuAgingTimeout = 24 => U32,
    PathMtuPlateauTable = 25 => U16List,

    // IP layer parameters per interface
    /// Interface MTU (RFC 2132 §5.1).
    InterfaceMtu = 26 => U16,
    AllSubnetsAreLocal = 27 => Flag,
    /// Broadcast address (RFC 2132 §5.3).
    BroadcastAddress = 28 => Ipv4,
    PerformMaskDiscovery = 29 => Flag,
    MaskSupplier = 30 => Flag,
    PerformRouterDiscovery = 31 => Flag,
    RouterSolicitationAddress = 32 => Ipv4,
    StaticRoute = 33 => Ipv4PairList,

    // Link layer parameters per interface
    TrailerEncapsulation = 34 => Flag,
    ArpCacheTimeout = 35 => U32,
    EthernetEncapsulation = 36 => Flag,

    // TCP parameters
    TcpDefaultTtl = 37 => U8,
    TcpKeepaliveInterval = 38 => U32,
    TcpKeepaliveGarbage = 39 => Flag,

    // Application and service parameters
    NisDomain = 40 => Text,
    NisServers = 41 => Ipv4List,
    NtpServers = 42 => Ipv4List,
    VendorSpecificInformation = 43 => Bytes,
    NetbiosNameServer = 44 => Ipv4List,
    NetbiosDatagramDistributionServer = 45 => Ipv4List,
    NetbiosNodeType = 46 => U8,
    NetbiosScope = 47 => Text,
    XWindowFontServer = 48 => Ipv4List,
    XWindowDisplayManager = 49 => Ipv4List,

    // DHCP extensions
    /// Requested IP address (RFC 2132 §9.1).
    RequestedIpAddress = 50 => Ipv4,
    /// IP address lease time in seconds (RFC 2132 §9.2).
    IpAddressLeaseTime = 51 => U32,
    /// Option overload - sname/file fields carry options (RFC 2132 §9.3).
    Overload = 52 => U8,
    /// DHCP message type (RFC 2132 §9.6).
    MessageType = 53 => U8,
    /// Server identifier (RFC 2132 §9.7).
    ServerIdentifier = 54 => Ipv4,
    /// Parameter request list (RFC 2132 §9.8).
    ParameterRequestList = 55 => Bytes,
    Message = 56 => Text,
    MaximumMessageSize = 57 => U16,
    /// Renewal time T1 (RFC 2132 §9.11).
    RenewalTime = 58 => U32,
    /// Rebinding time T2 (RFC 2132 §9.12).
    RebindingTime = 59 => U32,
    VendorClassIdentifier = 60 => Text,
    /// Client identifier (RFC 2132 §9.14).
    ClientIdentifier = 61 => Bytes,

    NisPlusDomain = 64 => Text,
    NisPlusServers = 65 => Ipv4List,
    TftpServerName = 66 => Text,
    BootFileName = 67 => Text,
    MobileIpHomeAgent = 68 => Ipv4List,
    SmtpServer = 69 => Ipv4List,
    Pop3Server = 70 => Ipv4List,
    NntpServer = 71 => Ipv4List,
    WwwServer = 72 => Ipv4List,
    FingerServer = 73 => Ipv4List,
    IrcServer = 74 => Ipv4List,
    StreetTalkServer = 75 => Ipv4List,
    StreetTalkDirectoryAssistance = 76 => Ipv4List,

    /// Relay agent information (RFC 3046).
    RelayAgentInformation = 82 => Bytes,

    TzPosixString = 100 => Text,
    TzDatabaseString = 101 => Text,

    /// Classless static routes (RFC 3442).
    ClasslessStaticRoute = 121 => Bytes,

    /// End of options marker.
    End = 255 => Reserved,
}

impl std::fmt::Display for OptionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, u8::from(*self)),
            None => write!(f, "Unassigned ({})", u8::from(*self)),
        }
    }
}

/// DHCP message types (Option 53) as defined in RFC 2132 §9.6.
///
/// These values indicate the purpose of a DHCP message in the protocol exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Client broadcast to locate servers.
    Discover = 1,
    /// Server response to DISCOVER with IP offer.
    Offer = 2,
    /// Client request for offered parameters.
    Request = 3,
    /// Client indicates address is already in use.
    Decline = 4,
    /// Server acknowledgement with configuration.
    Ack = 5,
    /// Server negative acknowledgement.
    Nak = 6,
    /// Client releases IP address.
    Release = 7,
    /// Client requests config without IP allocation.
    Inform = 8,
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Discover),
            2 => Ok(Self::Offer),
            3 => Ok(Self::Request),
            4 => Ok(Self::Decline),
            5 => Ok(Self::Ack),
            6 => Ok(Self::Nak),
            7 => Ok(Self::Release),
            8 => Ok(Self::Inform),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discover => write!(f, "DISCOVER"),
            Self::Offer => write!(f, "OFFER"),
            Self::Request => write!(f, "REQUEST"),
            Self::Decline => write!(f, "DECLINE"),
            Self::Ack => write!(f, "ACK"),
            Self::Nak => write!(f, "NAK"),
            Self::Release => write!(f, "RELEASE"),
            Self::Inform => write!(f, "INFORM"),
        }
    }
}

/// A single option: code plus raw value bytes.
///
/// Values are not validated beyond their length; a value longer than 255
/// bytes is rejected when it is appended to a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpOption {
    pub code: OptionCode,
    pub value: Vec<u8>,
}

impl DhcpOption {
    pub fn new(code: OptionCode, value: impl Into<Vec<u8>>) -> Self {
        Self {
            code,
            value: value.into(),
        }
    }

    /// DHCP message type (Option 53).
    pub fn message_type(message_type: MessageType) -> Self {
        Self::new(OptionCode::MessageType, [message_type as u8])
    }

    /// Server identifier (Option 54).
    pub fn server_identifier(server_ip: Ipv4Addr) -> Self {
        Self::ip(OptionCode::ServerIdentifier, server_ip)
    }

    /// Lease time (Option 51) as whole seconds.
    pub fn lease_time(duration: Duration) -> Self {
        Self::new(OptionCode::IpAddressLeaseTime, lease_time_bytes(duration))
    }

    pub fn ip(code: OptionCode, address: Ipv4Addr) -> Self {
        Self::new(code, address.octets())
    }

    /// An option holding several addresses back to back, e.g. Router or DNS.
    pub fn ips(code: OptionCode, addresses: &[Ipv4Addr]) -> Self {
        Self::new(code, join_ips(addresses))
    }

    pub fn u32(code: OptionCode, value: u32) -> Self {
        Self::new(code, value.to_be_bytes())
    }

    /// Encodes the option to its wire format (code + length + data).
    ///
    /// Values longer than 255 bytes are truncated; use
    /// [`Packet::add_option`](crate::Packet::add_option) to get an error instead.
    pub fn encode(&self) -> Vec<u8> {
        let len = self.value.len().min(255);
        let mut result = Vec::with_capacity(len + 2);
        result.push(u8::from(self.code));
        result.push(len as u8);
        result.extend_from_slice(&self.value[..len]);
        result
    }
}

/// Option table for one packet: option code to raw value.
///
/// Produced fresh by [`Packet::parse_options`](crate::Packet::parse_options)
/// for every inbound packet. Lookup order is irrelevant; serialization order
/// is chosen by the caller through [`select_order`](Self::select_order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    entries: HashMap<u8, Vec<u8>>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: OptionCode) -> Option<&[u8]> {
        self.entries.get(&u8::from(code)).map(Vec::as_slice)
    }

    pub fn contains(&self, code: OptionCode) -> bool {
        self.entries.contains_key(&u8::from(code))
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn insert(&mut self, code: OptionCode, value: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.entries.insert(u8::from(code), value.into())
    }

    pub fn remove(&mut self, code: OptionCode) -> Option<Vec<u8>> {
        self.entries.remove(&u8::from(code))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (OptionCode, &[u8])> {
        self.entries
            .iter()
            .map(|(code, value)| (OptionCode::from(*code), value.as_slice()))
    }

    /// Returns the DHCP message type (Option 53).
    ///
    /// `None` when the option is absent, not exactly one byte, or outside
    /// the 1..=8 range.
    pub fn message_type(&self) -> Option<MessageType> {
        match self.get(OptionCode::MessageType)? {
            [value] => MessageType::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Returns the parameter request list (Option 55) if present.
    pub fn parameter_request_list(&self) -> Option<&[u8]> {
        self.get(OptionCode::ParameterRequestList)
    }

    /// Returns the options named in `order`, in that order.
    ///
    /// Codes not present in the table are skipped, as are repeats. The
    /// usual `order` is the client's parameter request list, and the result
    /// is meant for the `options` argument of [`Packet::reply`](crate::Packet::reply).
    pub fn select_order(&self, order: &[u8]) -> Vec<DhcpOption> {
        let mut seen = HashSet::with_capacity(order.len());
        order
            .iter()
            .filter(|code| seen.insert(**code))
            .filter_map(|code| {
                self.entries
                    .get(code)
                    .map(|value| DhcpOption::new(OptionCode::from(*code), value.clone()))
            })
            .collect()
    }

    /// Same as [`select_order`](Self::select_order), except that a missing
    /// `order` selects every option in unspecified order.
    pub fn select_order_or_all(&self, order: Option<&[u8]>) -> Vec<DhcpOption> {
        match order {
            Some(order) => self.select_order(order),
            None => self
                .iter()
                .map(|(code, value)| DhcpOption::new(code, value))
                .collect(),
        }
    }
}

impl FromIterator<DhcpOption> for Options {
    fn from_iter<I: IntoIterator<Item = DhcpOption>>(iter: I) -> Self {
        let mut options = Options::new();
        for option in iter {
            options.insert(option.code, option.value);
        }
        options
    }
}

impl Extend<DhcpOption> for Options {
    fn extend<I: IntoIterator<Item = DhcpOption>>(&mut self, iter: I) {
        for option in iter {
            self.insert(option.code, option.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_conversions() {
        for value in 1..=8u8 {
            let msg_type = MessageType::try_from(value).unwrap();
            assert_eq!(msg_type as u8, value);
        }
        assert!(MessageType::try_from(0).is_err());
        assert!(MessageType::try_from(9).is_err());
    }

    #[test]
    fn test_option_code_mapping_is_total() {
        for value in 0..=255u8 {
            let code = OptionCode::from(value);
            assert_eq!(u8::from(code), value);
        }
    }

    #[test]
    fn test_named_codes_round_trip_through_names() {
        for code in OptionCode::NAMED {
            let name = code.name().unwrap();
            assert_eq!(OptionCode::from_name(name), Some(*code));
            let decoded = OptionCode::from(u8::from(*code));
            assert!(!matches!(decoded, OptionCode::Unassigned(_)));
        }
        assert_eq!(OptionCode::from_name("NoSuchOption"), None);
    }

    #[test]
    fn test_well_known_codes() {
        assert_eq!(u8::from(OptionCode::Pad), 0);
        assert_eq!(u8::from(OptionCode::SubnetMask), 1);
        assert_eq!(u8::from(OptionCode::DomainNameServer), 6);
        assert_eq!(u8::from(OptionCode::MessageType), 53);
        assert_eq!(u8::from(OptionCode::RelayAgentInformation), 82);
        assert_eq!(u8::from(OptionCode::End), 255);
        assert_eq!(OptionCode::from(200), OptionCode::Unassigned(200));
    }

    #[test]
    fn test_option_code_display() {
        assert_eq!(OptionCode::Router.to_string(), "Router (3)");
        assert_eq!(OptionCode::from(200).to_string(), "Unassigned (200)");
    }

    #[test]
    fn test_options_message_type() {
        let mut options = Options::new();
        assert_eq!(options.message_type(), None);

        options.insert(OptionCode::MessageType, [3]);
        assert_eq!(options.message_type(), Some(MessageType::Request));

        options.insert(OptionCode::MessageType, [9]);
        assert_eq!(options.message_type(), None);

        options.insert(OptionCode::MessageType, [1, 1]);
        assert_eq!(options.message_type(), None);
    }

    #[test]
    fn test_select_order_preserves_request_order() {
        let options: Options = [
            DhcpOption::ip(OptionCode::SubnetMask, Ipv4Addr::new(255, 255, 255, 0)),
            DhcpOption::ips(OptionCode::Router, &[Ipv4Addr::new(10, 0, 0, 1)]),
            DhcpOption::ips(OptionCode::DomainNameServer, &[Ipv4Addr::new(8, 8, 8, 8)]),
        ]
        .into_iter()
        .collect();

        let selected = options.select_order(&[6, 1, 42, 6]);
        let codes: Vec<u8> = selected.iter().map(|opt| u8::from(opt.code)).collect();
        assert_eq!(codes, vec![6, 1]);
        assert_eq!(selected[1].value, vec![255, 255, 255, 0]);
    }

    #[test]
    fn test_select_order_or_all() {
        let options: Options = [
            DhcpOption::ip(OptionCode::SubnetMask, Ipv4Addr::new(255, 255, 0, 0)),
            DhcpOption::u32(OptionCode::RenewalTime, 1800),
        ]
        .into_iter()
        .collect();

        assert_eq!(options.select_order_or_all(None).len(), 2);
        assert_eq!(options.select_order_or_all(Some(&[58])).len(), 1);
        assert!(options.select_order_or_all(Some(&[])).is_empty());
    }

    #[test]
    fn test_typed_constructors() {
        assert_eq!(
            DhcpOption::message_type(MessageType::Offer).encode(),
            vec![53, 1, 2]
        );
        assert_eq!(
            DhcpOption::lease_time(Duration::from_secs(3600)).value,
            vec![0, 0, 0x0e, 0x10]
        );
        assert_eq!(
            DhcpOption::ips(
                OptionCode::Router,
                &[Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)]
            )
            .value,
            vec![10, 0, 0, 1, 10, 0, 0, 2]
        );
    }

    #[test]
    fn test_encode_truncates_long_value() {
        let option = DhcpOption::new(OptionCode::HostName, vec![b'a'; 300]);
        let encoded = option.encode();
        assert_eq!(encoded[1], 255);
        assert_eq!(encoded.len(), 257);
    }

    #[test]
    fn test_message_type_display() {
        assert_eq!(format!("{}", MessageType::Discover), "DISCOVER");
        assert_eq!(format!("{}", MessageType::Offer), "OFFER");
        assert_eq!(format!("{}", MessageType::Request), "REQUEST");
        assert_eq!(format!("{}", MessageType::Decline), "DECLINE");
        assert_eq!(format!("{}", MessageType::Ack), "ACK");
        assert_eq!(format!("{}", MessageType::Nak), "NAK");
        assert_eq!(format!("{}", MessageType::Release), "RELEASE");
        assert_eq!(format!("{}", MessageType::Inform), "INFORM");
    }
}
