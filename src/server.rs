use std::net::{SocketAddr, SocketAddrV4};

#[cfg(not(target_os = "linux"))]
use tracing::warn;
use tracing::{debug, info};

use crate::config::Config;
use crate::conn::{InterfaceConn, InterfaceFilter, ServeConn};
use crate::destination::select_destination;
use crate::error::Result;
use crate::options::{MessageType, Options};
use crate::packet::Packet;
use crate::relay::GiaddrConn;
use crate::socket::UdpConn;

/// Largest datagram read per iteration; the non-jumbo Ethernet MTU.
const RECV_BUFFER_SIZE: usize = 1500;

/// Answers DHCP requests.
///
/// Called once per valid inbound packet, inline in the dispatch loop: a
/// slow handler stalls the loop. Return `None` to send nothing.
pub trait Handler {
    fn serve_dhcp(
        &mut self,
        request: &Packet,
        message_type: MessageType,
        options: &Options,
    ) -> Option<Packet>;
}

impl<F> Handler for F
where
    F: FnMut(&Packet, MessageType, &Options) -> Option<Packet>,
{
    fn serve_dhcp(
        &mut self,
        request: &Packet,
        message_type: MessageType,
        options: &Options,
    ) -> Option<Packet> {
        self(request, message_type, options)
    }
}

/// Runs the dispatch loop on `conn` until a read or write fails.
///
/// Datagrams that are too short, declare a hardware address over 16 bytes,
/// or lack a valid message type are dropped. Before the handler runs, an
/// empty yiaddr is filled from the UDP source address. Each reply is sent to
/// the destination chosen for its request, with the broadcast flag set to
/// match.
pub async fn serve<C, H>(conn: &mut C, handler: &mut H) -> Result<()>
where
    C: ServeConn,
    H: Handler,
{
    let mut buffer = [0u8; RECV_BUFFER_SIZE];

    loop {
        let (size, source) = conn.recv_from(&mut buffer).await?;

        let mut request = match Packet::from_bytes(&buffer[..size]) {
            Ok(request) => request,
            Err(error) => {
                debug!("Dropping datagram from {}: {}", source, error);
                continue;
            }
        };

        let options = request.parse_options();
        let Some(message_type) = options.message_type() else {
            debug!("Dropping packet from {} without valid message type", source);
            continue;
        };

        if request.yiaddr().is_unspecified()
            && let SocketAddr::V4(source) = source
        {
            request.set_yiaddr(*source.ip());
        }

        debug!(
            "{} from {} (xid {:#010x})",
            message_type,
            source,
            request.xid()
        );

        let Some(mut reply) = handler.serve_dhcp(&request, message_type, &options) else {
            continue;
        };

        let destination = select_destination(&request, Some(source.port()));
        reply.set_broadcast(destination.broadcast);
        conn.send_to(reply.as_bytes(), SocketAddr::V4(destination.address))
            .await?;
        debug!("Reply sent to {}", destination.address);
    }
}

/// Runs the dispatch loop on packets received on the given interfaces only.
///
/// An empty `interfaces` list accepts every interface.
pub async fn serve_if<C, H>(conn: C, interfaces: Vec<u32>, handler: &mut H) -> Result<()>
where
    C: InterfaceConn,
    H: Handler,
{
    let mut conn = InterfaceFilter::new(conn, interfaces);
    serve(&mut conn, handler).await
}

/// Binds the transport described by a [`Config`] and serves a handler on it.
pub struct DhcpServer<H> {
    config: Config,
    handler: H,
}

impl<H: Handler> DhcpServer<H> {
    pub fn new(config: Config, handler: H) -> Self {
        Self { config, handler }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Binds the socket and serves until a transport error occurs.
    ///
    /// Uses an interface-filtered transport when `interface_indices` is
    /// non-empty (Linux only) and wraps it for relay diversion when
    /// `relay_diversion` is set.
    pub async fn run(&mut self) -> Result<()> {
        let addr = SocketAddrV4::new(self.config.listen_address, self.config.server_port);
        let device = self.config.bind_device.clone();

        info!("DHCP server starting on {}", addr);

        #[cfg(target_os = "linux")]
        if !self.config.interface_indices.is_empty() {
            let conn = crate::socket::PktInfoConn::bind(addr, device.as_deref())?;
            info!("Serving interfaces {:?}", self.config.interface_indices);
            let conn = InterfaceFilter::new(conn, self.config.interface_indices.clone());
            return self.run_on(conn).await;
        }

        #[cfg(not(target_os = "linux"))]
        if !self.config.interface_indices.is_empty() {
            warn!(
                "interface_indices ({:?}) is only supported on Linux and will be ignored",
                self.config.interface_indices
            );
        }

        let conn = UdpConn::bind(addr, device.as_deref())?;
        self.run_on(conn).await
    }

    async fn run_on<C: ServeConn>(&mut self, mut conn: C) -> Result<()> {
        if self.config.relay_diversion {
            info!(
                "Relay diversion enabled (permitted relays: {:?})",
                self.config.permitted_relays
            );
            let mut conn = GiaddrConn::new(conn, self.config.permitted_relays.clone());
            info!("DHCP server ready and listening");
            serve(&mut conn, &mut self.handler).await
        } else {
            info!("DHCP server ready and listening");
            serve(&mut conn, &mut self.handler).await
        }
    }
}
