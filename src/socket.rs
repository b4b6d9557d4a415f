//! Concrete UDP transports.
//!
//! [`UdpConn`] is a broadcast-capable tokio socket. On Linux,
//! [`PktInfoConn`] additionally reports the receive interface of every
//! datagram through `IP_PKTINFO`, which is what
//! [`InterfaceFilter`](crate::InterfaceFilter) needs on multi-homed hosts.

use std::net::{SocketAddr, SocketAddrV4};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
#[cfg(not(target_os = "linux"))]
use tracing::warn;

use crate::conn::ServeConn;
use crate::error::{Error, Result};

/// Creates a non-blocking UDP socket with SO_REUSEADDR and SO_BROADCAST,
/// bound to `addr` and optionally to a network device.
pub fn bind_socket(addr: SocketAddrV4, device: Option<&str>) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|error| Error::Socket(format!("Failed to create socket: {}", error)))?;

    socket
        .set_reuse_address(true)
        .map_err(|error| Error::Socket(format!("Failed to set SO_REUSEADDR: {}", error)))?;

    socket
        .set_broadcast(true)
        .map_err(|error| Error::Socket(format!("Failed to set SO_BROADCAST: {}", error)))?;

    socket
        .set_nonblocking(true)
        .map_err(|error| Error::Socket(format!("Failed to set non-blocking: {}", error)))?;

    if let Some(device) = device {
        #[cfg(target_os = "linux")]
        {
            socket
                .bind_device(Some(device.as_bytes()))
                .map_err(|error| {
                    Error::Socket(format!("Failed to bind to device {}: {}", device, error))
                })?;
        }
        #[cfg(not(target_os = "linux"))]
        {
            warn!(
                "bind_device ({}) is only supported on Linux and will be ignored",
                device
            );
        }
    }

    socket
        .bind(&addr.into())
        .map_err(|error| Error::Socket(format!("Failed to bind to {}: {}", addr, error)))?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
        .map_err(|error| Error::Socket(format!("Failed to convert to tokio socket: {}", error)))
}

/// Plain UDP transport.
#[derive(Debug)]
pub struct UdpConn {
    socket: UdpSocket,
}

impl UdpConn {
    pub fn bind(addr: SocketAddrV4, device: Option<&str>) -> Result<Self> {
        Ok(Self {
            socket: bind_socket(addr, device)?,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

impl From<UdpSocket> for UdpConn {
    fn from(socket: UdpSocket) -> Self {
        Self { socket }
    }
}

impl ServeConn for UdpConn {
    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        Ok(self.socket.recv_from(buf).await?)
    }

    async fn send_to(&mut self, buf: &[u8], target: SocketAddr) -> Result<usize> {
        Ok(self.socket.send_to(buf, target).await?)
    }
}

#[cfg(target_os = "linux")]
pub use pktinfo::PktInfoConn;

#[cfg(target_os = "linux")]
mod pktinfo {
    use std::io::{self, IoSliceMut};
    use std::net::{SocketAddr, SocketAddrV4};
    use std::os::fd::AsRawFd;

    use nix::sys::socket::{
        ControlMessageOwned, MsgFlags, SockaddrIn, recvmsg, setsockopt, sockopt,
    };
    use tokio::io::Interest;
    use tokio::net::UdpSocket;

    use super::bind_socket;
    use crate::conn::{InterfaceConn, ServeConn};
    use crate::error::{Error, Result};

    /// UDP transport that reports the receive interface index.
    #[derive(Debug)]
    pub struct PktInfoConn {
        socket: UdpSocket,
    }

    impl PktInfoConn {
        pub fn bind(addr: SocketAddrV4, device: Option<&str>) -> Result<Self> {
            let socket = bind_socket(addr, device)?;
            setsockopt(&socket, sockopt::Ipv4PacketInfo, &true)
                .map_err(|error| Error::Socket(format!("Failed to set IP_PKTINFO: {}", error)))?;
            Ok(Self { socket })
        }

        pub fn local_addr(&self) -> Result<SocketAddr> {
            Ok(self.socket.local_addr()?)
        }

        fn recv_pktinfo(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr, Option<u32>)> {
            let mut iov = [IoSliceMut::new(buf)];
            let mut cmsg_buffer = nix::cmsg_space!(libc::in_pktinfo);
            let message = recvmsg::<SockaddrIn>(
                self.socket.as_raw_fd(),
                &mut iov,
                Some(&mut cmsg_buffer),
                MsgFlags::MSG_DONTWAIT,
            )?;

            let interface = message.cmsgs().ok().and_then(|mut cmsgs| {
                cmsgs.find_map(|cmsg| match cmsg {
                    ControlMessageOwned::Ipv4PacketInfo(info) => Some(info.ipi_ifindex as u32),
                    _ => None,
                })
            });

            let source = message
                .address
                .map(|address| SocketAddr::V4(SocketAddrV4::from(address)))
                .ok_or_else(|| io::Error::other("datagram without source address"))?;

            Ok((message.bytes, source, interface))
        }
    }

    impl ServeConn for PktInfoConn {
        async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
            let (len, source, _) = self.recv_with_interface(buf).await?;
            Ok((len, source))
        }

        async fn send_to(&mut self, buf: &[u8], target: SocketAddr) -> Result<usize> {
            Ok(self.socket.send_to(buf, target).await?)
        }
    }

    impl InterfaceConn for PktInfoConn {
        async fn recv_with_interface(
            &mut self,
            buf: &mut [u8],
        ) -> Result<(usize, SocketAddr, Option<u32>)> {
            let this = &*self;
            Ok(this
                .socket
                .async_io(Interest::READABLE, || this.recv_pktinfo(&mut *buf))
                .await?)
        }
    }
}
