//! # dhcp4d
//!
//! The server side of DHCPv4 (RFC 2131 / RFC 2132): a packet codec, reply
//! destination selection, relay-aware transports and a dispatch loop that
//! hands each valid request to an application-supplied [`Handler`].
//!
//! ## Features
//!
//! - Zero-copy packet codec with fixed-offset accessors and option TLV parsing
//! - Request and reply builders that pad to the BOOTP minimum size
//! - RFC 2131 §4.1 reply routing: relay agent, client unicast or broadcast
//! - GIADDR relay diversion with an allow-list of relay agents
//! - Receive-interface filtering for multi-homed hosts (Linux, IP_PKTINFO)
//! - JSON option tables for human-authored configuration
//! - A minimal in-memory lease pool as a reference handler
//! - Async/await with Tokio
//!
//! ## Quick Start
//!
//! ```no_run
//! use dhcp4d::{Config, DhcpServer, LeasePool};
//!
//! #[tokio::main]
//! async fn main() -> dhcp4d::Result<()> {
//!     let config = Config::load_or_create("config.json")?;
//!     let pool = LeasePool::from_config(&config)?;
//!     let mut server = DhcpServer::new(config, pool);
//!     server.run().await
//! }
//! ```
//!
//! A handler can also be a closure:
//!
//! ```no_run
//! use std::net::{Ipv4Addr, SocketAddrV4};
//! use dhcp4d::{MessageType, Options, Packet, UdpConn, serve};
//!
//! # async fn example() -> dhcp4d::Result<()> {
//! let server_ip = Ipv4Addr::new(192, 168, 1, 1);
//! let mut conn = UdpConn::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 67), None)?;
//! let mut handler = |request: &Packet, message_type: MessageType, _: &Options| -> Option<Packet> {
//!     if message_type != MessageType::Inform {
//!         return None;
//!     }
//!     let unspecified = Ipv4Addr::UNSPECIFIED;
//!     Packet::reply(request, MessageType::Ack, server_ip, unspecified, None, &[]).ok()
//! };
//! serve(&mut conn, &mut handler).await
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`Packet`] - DHCP packet codec over the raw wire bytes
//! - [`Options`] / [`DhcpOption`] / [`OptionCode`] - option table and codes per RFC 2132
//! - [`select_destination`] - where a reply must be sent
//! - [`ServeConn`] - transport capability; [`UdpConn`], [`InterfaceFilter`] and
//!   [`GiaddrConn`] implement it
//! - [`serve`] / [`serve_if`] - the dispatch loop
//! - [`DhcpServer`] - binds the transport described by a [`Config`] and runs the loop
//! - [`LeasePool`] - reference allocation policy

pub mod config;
pub mod conn;
pub mod destination;
pub mod error;
pub mod helpers;
pub mod lease;
pub mod option_map;
pub mod options;
pub mod packet;
pub mod relay;
pub mod server;
pub mod socket;

#[cfg(test)]
mod mock;

pub use config::Config;
pub use conn::{InterfaceConn, InterfaceFilter, ServeConn};
pub use destination::{Destination, select_destination};
pub use error::{Error, Result};
pub use lease::{Lease, LeasePool};
pub use options::{DhcpOption, MessageType, OptionCode, Options};
pub use packet::Packet;
pub use relay::GiaddrConn;
pub use server::{DhcpServer, Handler, serve, serve_if};
#[cfg(target_os = "linux")]
pub use socket::PktInfoConn;
pub use socket::UdpConn;
