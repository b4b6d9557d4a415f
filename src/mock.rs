//! Scripted in-memory transport for tests.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;

use crate::conn::{InterfaceConn, ServeConn};
use crate::error::{Error, Result};

struct Datagram {
    data: Vec<u8>,
    source: SocketAddr,
    interface: Option<u32>,
}

/// Replays queued datagrams and records writes.
///
/// Once the queue is empty every read fails with `ConnectionAborted`, which
/// is how tests end a dispatch loop.
#[derive(Default)]
pub struct MockConn {
    inbound: VecDeque<Datagram>,
    sent: Vec<(Vec<u8>, SocketAddr)>,
    reads: usize,
    fail_writes: bool,
}

impl MockConn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_datagram(self, data: Vec<u8>, source: SocketAddr) -> Self {
        self.with_datagram_on(data, source, None)
    }

    pub fn with_datagram_on(
        mut self,
        data: Vec<u8>,
        source: SocketAddr,
        interface: Option<u32>,
    ) -> Self {
        self.inbound.push_back(Datagram {
            data,
            source,
            interface,
        });
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn sent(&self) -> &[(Vec<u8>, SocketAddr)] {
        &self.sent
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    fn next(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr, Option<u32>)> {
        self.reads += 1;
        let datagram = self.inbound.pop_front().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "mock connection closed",
            ))
        })?;
        let len = datagram.data.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram.data[..len]);
        Ok((len, datagram.source, datagram.interface))
    }
}

impl ServeConn for MockConn {
    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let (len, source, _) = self.next(buf)?;
        Ok((len, source))
    }

    async fn send_to(&mut self, buf: &[u8], target: SocketAddr) -> Result<usize> {
        if self.fail_writes {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        self.sent.push((buf.to_vec(), target));
        Ok(buf.len())
    }
}

impl InterfaceConn for MockConn {
    async fn recv_with_interface(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(usize, SocketAddr, Option<u32>)> {
        self.next(buf)
    }
}
