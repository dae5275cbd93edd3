use std::io;

use futures_util::future::{BoxFuture, FutureExt};
use log::{trace, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

use crate::address_family;
use crate::dns_parser::Header;
use crate::server::NameServer;

/// Largest UDP message we accept.
const MAX_UDP_SIZE: usize = 65535;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

/// Sends an encoded request to a server and waits for the reply
///
/// Implementations have to skip replies whose id is not `id`. They don't
/// need to time out, the caller bounds every exchange.
pub trait Transport: Send + Sync {
    fn exchange<'a>(
        &'a self,
        server: &'a NameServer,
        protocol: Protocol,
        request: &'a [u8],
        id: u16,
    ) -> BoxFuture<'a, io::Result<Vec<u8>>>;
}

/// Talks to real servers over tokio sockets
#[derive(Debug, Clone, Copy, Default)]
pub struct NetTransport;

impl NetTransport {
    pub fn new() -> NetTransport {
        NetTransport
    }

    async fn udp_exchange(server: &NameServer, request: &[u8], id: u16) -> io::Result<Vec<u8>> {
        let socket = UdpSocket::from_std(address_family::bind_for(&server.addr)?)?;
        socket.connect(server.addr).await?;
        let sent = socket.send(request).await?;
        if sent != request.len() {
            return Err(io::Error::new(io::ErrorKind::Other, "short UDP send"));
        }
        trace!("sent {} bytes to {} over UDP", sent, server);

        let mut buf = vec![0u8; MAX_UDP_SIZE];
        loop {
            let len = socket.recv(&mut buf).await?;
            match Header::id(&buf[..len]) {
                Some(got) if got == id => {
                    trace!("received {} bytes from {} over UDP", len, server);
                    buf.truncate(len);
                    return Ok(buf);
                }
                got => warn!("dropping UDP packet from {} with id {:?}, expected {}", server, got, id),
            }
        }
    }

    async fn tcp_exchange(server: &NameServer, request: &[u8], id: u16) -> io::Result<Vec<u8>> {
        if request.len() > u16::MAX as usize {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "request too long"));
        }
        let mut stream = TcpStream::connect(server.addr).await?;
        let mut framed = Vec::with_capacity(request.len() + 2);
        framed.extend_from_slice(&(request.len() as u16).to_be_bytes());
        framed.extend_from_slice(request);
        stream.write_all(&framed).await?;
        trace!("sent {} bytes to {} over TCP", request.len(), server);

        loop {
            let len = stream.read_u16().await? as usize;
            let mut buf = vec![0u8; len];
            stream.read_exact(&mut buf).await?;
            match Header::id(&buf) {
                Some(got) if got == id => {
                    trace!("received {} bytes from {} over TCP", len, server);
                    return Ok(buf);
                }
                got => warn!("dropping TCP message from {} with id {:?}, expected {}", server, got, id),
            }
        }
    }
}

impl Transport for NetTransport {
    fn exchange<'a>(
        &'a self,
        server: &'a NameServer,
        protocol: Protocol,
        request: &'a [u8],
        id: u16,
    ) -> BoxFuture<'a, io::Result<Vec<u8>>> {
        match protocol {
            Protocol::Udp => NetTransport::udp_exchange(server, request, id).boxed(),
            Protocol::Tcp => NetTransport::tcp_exchange(server, request, id).boxed(),
        }
    }
}
