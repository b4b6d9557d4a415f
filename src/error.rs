//! Error types for the DHCP server core.
//!
//! All fallible operations in this crate return [`Result<T>`], which uses
//! the [`Error`] enum for error variants.

use std::net::SocketAddr;

/// Errors that can occur while encoding packets or serving DHCP.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket read/write or file I/O error.
    ///
    /// Inside the dispatch loop this is fatal: a failed read usually means the
    /// socket was closed, a failed write means replies can no longer be sent.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (configuration files).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A buffer cannot be treated as a DHCP packet.
    ///
    /// Returned when a buffer is shorter than the 240-byte fixed header or
    /// declares a hardware address longer than 16 bytes.
    #[error("Invalid DHCP packet: {0}")]
    InvalidPacket(String),

    /// An option was appended after the packet was padded.
    #[error("Options region is closed; options must be added before padding")]
    OptionsClosed,

    /// An option value does not fit the one-byte length field.
    #[error("Option {code} value is {len} bytes (maximum 255)")]
    OptionTooLong { code: u8, len: usize },

    /// A relay-diverted write was given a destination that is not an IPv4 UDP address.
    #[error("Destination {0} is not an IPv4 UDP address")]
    InvalidAddress(SocketAddr),

    /// Invalid server configuration.
    ///
    /// Returned by [`Config::validate`](crate::Config::validate).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A human-authored option could not be translated to wire bytes.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Socket creation or configuration error.
    ///
    /// Typically occurs when binding to port 67 without administrator privileges,
    /// or when the requested network device doesn't exist.
    #[error("Socket error: {0}")]
    Socket(String),
}

/// A specialized Result type for DHCP operations.
pub type Result<T> = std::result::Result<T, Error>;
