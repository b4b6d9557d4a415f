//! Reference address allocation policy.
//!
//! [`LeasePool`] hands out addresses from one contiguous range and keeps
//! its leases in memory only. It is the minimal [`Handler`] a server
//! needs:
//!
//! - DISCOVER: offer the client's current slot, or a free or expired one
//!   found from a random starting point
//! - REQUEST: ACK when the requested address is in the pool and free or
//!   already the client's, otherwise NAK
//! - RELEASE / DECLINE: forget the client's lease
//! - INFORM: ACK with configuration options only
//!
//! Requests naming a different server identifier are ignored.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::helpers::{ip_add, ip_offset};
use crate::option_map::options_from_map;
use crate::options::{DhcpOption, MessageType, OptionCode, Options};
use crate::packet::Packet;
use crate::server::Handler;

fn format_chaddr(chaddr: &[u8]) -> String {
    chaddr
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<Vec<_>>()
        .join(":")
}

fn expiry_after(duration: Duration) -> DateTime<Utc> {
    let delta = TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX);
    Utc::now()
        .checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// An address held by one client until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    /// Client hardware address.
    pub chaddr: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

impl Lease {
    pub fn new(chaddr: &[u8], duration: Duration) -> Self {
        Self {
            chaddr: chaddr.to_vec(),
            expires_at: expiry_after(duration),
        }
    }

    /// Returns true if the lease has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// In-memory lease pool over `range` addresses starting at `start`.
#[derive(Debug)]
pub struct LeasePool {
    server_ip: Ipv4Addr,
    start: Ipv4Addr,
    range: u32,
    duration: Duration,
    options: Options,
    leases: HashMap<u32, Lease>,
}

impl LeasePool {
    pub fn new(
        server_ip: Ipv4Addr,
        start: Ipv4Addr,
        range: u32,
        duration: Duration,
        options: Options,
    ) -> Self {
        Self {
            server_ip,
            start,
            range,
            duration,
            options,
            leases: HashMap::new(),
        }
    }

    /// Builds a pool from the reference-policy settings of a [`Config`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured options cannot be translated.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.server_ip,
            config.pool_start,
            config.lease_range,
            Duration::from_secs(u64::from(config.lease_duration_seconds)),
            options_from_map(&config.options)?,
        ))
    }

    pub fn server_ip(&self) -> Ipv4Addr {
        self.server_ip
    }

    /// Current leases as (address, lease) pairs, in no particular order.
    pub fn leases(&self) -> impl Iterator<Item = (Ipv4Addr, &Lease)> {
        self.leases
            .iter()
            .map(|(slot, lease)| (ip_add(self.start, *slot), lease))
    }

    /// Address currently leased to `chaddr`, expired or not.
    pub fn lease_for(&self, chaddr: &[u8]) -> Option<Ipv4Addr> {
        self.slot_of(chaddr).map(|slot| ip_add(self.start, slot))
    }

    fn slot_of(&self, chaddr: &[u8]) -> Option<u32> {
        self.leases
            .iter()
            .find(|(_, lease)| lease.chaddr == chaddr)
            .map(|(slot, _)| *slot)
    }

    /// Finds an unused or expired slot, scanning from a random offset and
    /// wrapping around once.
    fn free_slot(&self) -> Option<u32> {
        if self.range == 0 {
            return None;
        }
        let first = rand::random_range(0..self.range);
        (first..self.range)
            .chain(0..first)
            .find(|slot| self.leases.get(slot).is_none_or(Lease::is_expired))
    }

    fn slot_for_address(&self, ip: Ipv4Addr) -> Option<u32> {
        ip_offset(self.start, ip).filter(|slot| *slot < self.range)
    }

    fn reply_options(&self, options: &Options) -> Vec<DhcpOption> {
        self.options
            .select_order_or_all(options.parameter_request_list())
    }

    fn handle_discover(&mut self, request: &Packet, options: &Options) -> Option<Packet> {
        let mac = format_chaddr(request.chaddr());
        let Some(slot) = self.slot_of(request.chaddr()).or_else(|| self.free_slot()) else {
            warn!("Pool exhausted, cannot offer IP to {}", mac);
            return None;
        };

        let offered = ip_add(self.start, slot);
        info!("OFFER {} to {}", offered, mac);
        Packet::reply(
            request,
            MessageType::Offer,
            self.server_ip,
            offered,
            Some(self.duration),
            &self.reply_options(options),
        )
        .ok()
    }

    fn handle_request(&mut self, request: &Packet, options: &Options) -> Option<Packet> {
        let mac = format_chaddr(request.chaddr());

        if let Some(server_id) = options.get(OptionCode::ServerIdentifier)
            && server_id != self.server_ip.octets()
        {
            info!("REQUEST from {} is for a different server", mac);
            return None;
        }

        let requested = match options.get(OptionCode::RequestedIpAddress) {
            Some(&[a, b, c, d]) => Some(Ipv4Addr::new(a, b, c, d)),
            _ if !request.ciaddr().is_unspecified() => Some(request.ciaddr()),
            _ => None,
        };

        if let Some(ip) = requested
            && let Some(slot) = self.slot_for_address(ip)
        {
            let available = match self.leases.get(&slot) {
                Some(lease) => lease.chaddr == request.chaddr() || lease.is_expired(),
                None => true,
            };

            if available {
                self.leases
                    .retain(|_, lease| lease.chaddr != request.chaddr());
                self.leases
                    .insert(slot, Lease::new(request.chaddr(), self.duration));
                info!("ACK {} to {}", ip, mac);
                return Packet::reply(
                    request,
                    MessageType::Ack,
                    self.server_ip,
                    ip,
                    Some(self.duration),
                    &self.reply_options(options),
                )
                .ok();
            }
        }

        warn!("NAK to {}: {:?} is not available", mac, requested);
        Packet::reply(
            request,
            MessageType::Nak,
            self.server_ip,
            Ipv4Addr::UNSPECIFIED,
            None,
            &[],
        )
        .ok()
    }

    fn handle_release(&mut self, request: &Packet, message_type: MessageType) -> Option<Packet> {
        if let Some(slot) = self.slot_of(request.chaddr()) {
            self.leases.remove(&slot);
            info!(
                "{} from {} for {}",
                message_type,
                format_chaddr(request.chaddr()),
                ip_add(self.start, slot)
            );
        }
        None
    }

    fn handle_inform(&mut self, request: &Packet, options: &Options) -> Option<Packet> {
        info!("INFORM response to {}", format_chaddr(request.chaddr()));
        Packet::reply(
            request,
            MessageType::Ack,
            self.server_ip,
            Ipv4Addr::UNSPECIFIED,
            None,
            &self.reply_options(options),
        )
        .ok()
    }
}

impl Handler for LeasePool {
    fn serve_dhcp(
        &mut self,
        request: &Packet,
        message_type: MessageType,
        options: &Options,
    ) -> Option<Packet> {
        match message_type {
            MessageType::Discover => self.handle_discover(request, options),
            MessageType::Request => self.handle_request(request, options),
            MessageType::Release | MessageType::Decline => {
                self.handle_release(request, message_type)
            }
            MessageType::Inform => self.handle_inform(request, options),
            _ => None,
        }
    }
}
