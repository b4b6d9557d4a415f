//! GIADDR relay diversion.
//!
//! When a request reaches the server through a relay agent (RFC 2131 §4.1,
//! GIADDR non-zero) the reply belongs to that relay. [`GiaddrConn`] wraps a
//! transport, remembers the relay address seen on each accepted read and
//! rewrites the destination of the following write to it. An optional
//! allow-list restricts which relays are served at all.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use tracing::debug;

use crate::conn::ServeConn;
use crate::error::{Error, Result};
use crate::packet::{MIN_PACKET_SIZE, giaddr_of};

/// Relay-diverting transport wrapper.
///
/// Holds at most one pending relay address between a read and the next
/// write. Each accepted read replaces it (a zero GIADDR clears it) and a
/// write consumes it. Not meant to be shared between concurrent readers.
#[derive(Debug)]
pub struct GiaddrConn<C> {
    inner: C,
    permitted: Vec<Ipv4Addr>,
    pending: Option<Ipv4Addr>,
}

impl<C: ServeConn> GiaddrConn<C> {
    /// Wraps `inner`. An empty `permitted` list accepts every relay.
    pub fn new(inner: C, permitted: Vec<Ipv4Addr>) -> Self {
        Self {
            inner,
            permitted,
            pending: None,
        }
    }

    /// Relay address the next write will be diverted to.
    pub fn pending(&self) -> Option<Ipv4Addr> {
        self.pending
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn permits(&self, relay: Ipv4Addr) -> bool {
        self.permitted.is_empty() || self.permitted.contains(&relay)
    }
}

impl<C: ServeConn> ServeConn for GiaddrConn<C> {
    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        loop {
            let (len, source) = self.inner.recv_from(buf).await?;
            if len < MIN_PACKET_SIZE {
                debug!("Dropping {} byte datagram from {}", len, source);
                continue;
            }

            let giaddr = giaddr_of(&buf[..len]);

            if giaddr.is_unspecified() {
                self.pending = None;
                return Ok((len, source));
            }

            if !self.permits(giaddr) {
                debug!("Dropping request from unpermitted relay {}", giaddr);
                continue;
            }

            self.pending = Some(giaddr);
            return Ok((len, source));
        }
    }

    async fn send_to(&mut self, buf: &[u8], target: SocketAddr) -> Result<usize> {
        let SocketAddr::V4(target) = target else {
            return Err(Error::InvalidAddress(target));
        };
        let target = match self.pending.take() {
            Some(relay) => SocketAddrV4::new(relay, target.port()),
            None => target,
        };
        self.inner.send_to(buf, SocketAddr::V4(target)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockConn;

    fn datagram(giaddr: Ipv4Addr) -> Vec<u8> {
        let mut data = vec![0u8; 300];
        data[0] = 1;
        data[24..28].copy_from_slice(&giaddr.octets());
        data
    }

    fn source() -> SocketAddr {
        "10.0.0.1:67".parse().unwrap()
    }

    #[tokio::test]
    async fn test_unpermitted_relay_is_skipped() {
        let mock = MockConn::new()
            .with_datagram(datagram(Ipv4Addr::new(10, 0, 0, 2)), source())
            .with_datagram(datagram(Ipv4Addr::new(10, 0, 0, 1)), source());
        let mut conn = GiaddrConn::new(mock, vec![Ipv4Addr::new(10, 0, 0, 1)]);

        let mut buf = [0u8; 1500];
        let (len, _) = conn.recv_from(&mut buf).await.unwrap();
        assert_eq!(len, 300);
        assert_eq!(&buf[24..28], &[10, 0, 0, 1]);
        assert_eq!(conn.pending(), Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(conn.into_inner().reads(), 2);
    }

    #[tokio::test]
    async fn test_write_is_diverted_to_relay() {
        let mock = MockConn::new().with_datagram(datagram(Ipv4Addr::new(10, 0, 0, 1)), source());
        let mut conn = GiaddrConn::new(mock, vec![Ipv4Addr::new(10, 0, 0, 1)]);

        let mut buf = [0u8; 1500];
        conn.recv_from(&mut buf).await.unwrap();
        conn.send_to(&[1, 2, 3], "255.255.255.255:68".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(conn.pending(), None);

        conn.send_to(&[4], "192.168.1.9:68".parse().unwrap())
            .await
            .unwrap();

        let mock = conn.into_inner();
        assert_eq!(
            mock.sent()[0].1,
            "10.0.0.1:68".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            mock.sent()[1].1,
            "192.168.1.9:68".parse::<SocketAddr>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_short_datagrams_are_skipped() {
        let mock = MockConn::new()
            .with_datagram(vec![0u8; 239], source())
            .with_datagram(datagram(Ipv4Addr::UNSPECIFIED), source());
        let mut conn = GiaddrConn::new(mock, Vec::new());

        let mut buf = [0u8; 1500];
        assert_eq!(conn.recv_from(&mut buf).await.unwrap().0, 300);
        assert_eq!(conn.pending(), None);
    }

    #[tokio::test]
    async fn test_empty_allow_list_accepts_any_relay() {
        let mock = MockConn::new().with_datagram(datagram(Ipv4Addr::new(172, 16, 0, 1)), source());
        let mut conn = GiaddrConn::new(mock, Vec::new());

        let mut buf = [0u8; 1500];
        conn.recv_from(&mut buf).await.unwrap();
        assert_eq!(conn.pending(), Some(Ipv4Addr::new(172, 16, 0, 1)));
    }

    #[tokio::test]
    async fn test_direct_request_clears_pending_relay() {
        let mock = MockConn::new()
            .with_datagram(datagram(Ipv4Addr::new(10, 0, 0, 1)), source())
            .with_datagram(datagram(Ipv4Addr::UNSPECIFIED), source());
        let mut conn = GiaddrConn::new(mock, Vec::new());

        let mut buf = [0u8; 1500];
        conn.recv_from(&mut buf).await.unwrap();
        conn.recv_from(&mut buf).await.unwrap();
        assert_eq!(conn.pending(), None);
    }

    #[tokio::test]
    async fn test_ipv6_destination_is_rejected() {
        let mut conn = GiaddrConn::new(MockConn::new(), Vec::new());
        let result = conn.send_to(&[1], "[::1]:68".parse().unwrap()).await;
        assert!(matches!(result, Err(Error::InvalidAddress(_))));
        assert!(conn.into_inner().sent().is_empty());
    }

    #[tokio::test]
    async fn test_read_error_propagates() {
        let mut conn = GiaddrConn::new(MockConn::new(), Vec::new());
        let mut buf = [0u8; 1500];
        let result = conn.recv_from(&mut buf).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
