//! Transport capabilities consumed by the dispatch loop.
//!
//! Anything that can receive and send UDP datagrams implements
//! [`ServeConn`]: plain sockets, the interface filter below, and the relay
//! diversion wrapper in [`relay`](crate::relay). Wrappers own their inner
//! transport and any per-connection state, so one connection is driven by
//! exactly one dispatch loop.

use std::future::Future;
use std::net::SocketAddr;

use tracing::debug;

use crate::error::Result;

/// A datagram transport the dispatch loop can read from and write to.
///
/// Methods take `&mut self` because wrappers such as
/// [`GiaddrConn`](crate::GiaddrConn) carry state from a read to the
/// following write.
pub trait ServeConn: Send {
    /// Receives one datagram into `buf`, returning its length and source.
    fn recv_from(
        &mut self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(usize, SocketAddr)>> + Send;

    /// Sends `buf` to `target`, returning the number of bytes written.
    fn send_to(
        &mut self,
        buf: &[u8],
        target: SocketAddr,
    ) -> impl Future<Output = Result<usize>> + Send;
}

/// A transport that can also report which interface a datagram arrived on.
pub trait InterfaceConn: ServeConn {
    /// Like [`ServeConn::recv_from`], plus the kernel-reported receive
    /// interface index. `None` when the platform gave no such information.
    fn recv_with_interface(
        &mut self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(usize, SocketAddr, Option<u32>)>> + Send;
}

/// Drops datagrams that arrived on interfaces outside an allow-list.
///
/// An empty list accepts every interface. A datagram without an interface
/// index is accepted, since the filter cannot tell where it came from.
#[derive(Debug)]
pub struct InterfaceFilter<C> {
    inner: C,
    interfaces: Vec<u32>,
}

impl<C: InterfaceConn> InterfaceFilter<C> {
    pub fn new(inner: C, interfaces: Vec<u32>) -> Self {
        Self { inner, interfaces }
    }

    pub fn interfaces(&self) -> &[u32] {
        &self.interfaces
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn accepts(&self, interface: Option<u32>) -> bool {
        match interface {
            Some(index) => self.interfaces.is_empty() || self.interfaces.contains(&index),
            None => true,
        }
    }
}

impl<C: InterfaceConn> ServeConn for InterfaceFilter<C> {
    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        loop {
            let (len, source, interface) = self.inner.recv_with_interface(buf).await?;
            if self.accepts(interface) {
                return Ok((len, source));
            }
            debug!(
                "Dropping datagram from {} on interface {:?}",
                source, interface
            );
        }
    }

    async fn send_to(&mut self, buf: &[u8], target: SocketAddr) -> Result<usize> {
        self.inner.send_to(buf, target).await
    }
}
