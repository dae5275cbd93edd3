use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

/// How often binding an ephemeral port is tried before giving up.
const BIND_ATTEMPTS: usize = 8;

pub enum Inet {}

pub enum Inet6 {}

pub trait AddressFamily {
    type Addr: Into<IpAddr>;

    const ANY_ADDR: Self::Addr;

    const DOMAIN: Domain;

    fn udp_socket() -> io::Result<Socket> {
        Socket::new(Self::DOMAIN, Type::DGRAM, Some(Protocol::UDP))
    }

    /// Binds a non-blocking UDP socket to an ephemeral port.
    fn bind() -> io::Result<UdpSocket> {
        let addr: SockAddr = SocketAddr::new(Self::ANY_ADDR.into(), 0).into();
        let mut attempt = 1;
        loop {
            let socket = Self::udp_socket()?;
            socket.set_nonblocking(true)?;
            match socket.bind(&addr) {
                Ok(()) => return Ok(socket.into()),
                Err(err) if err.kind() == io::ErrorKind::AddrInUse && attempt < BIND_ATTEMPTS => {
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl AddressFamily for Inet {
    type Addr = Ipv4Addr;

    const ANY_ADDR: Self::Addr = Ipv4Addr::UNSPECIFIED;

    const DOMAIN: Domain = Domain::IPV4;
}

impl AddressFamily for Inet6 {
    type Addr = Ipv6Addr;

    const ANY_ADDR: Self::Addr = Ipv6Addr::UNSPECIFIED;

    const DOMAIN: Domain = Domain::IPV6;

    fn udp_socket() -> io::Result<Socket> {
        let socket = Socket::new(Self::DOMAIN, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_only_v6(true)?;
        Ok(socket)
    }
}

/// Binds a socket of the family `peer` belongs to.
pub fn bind_for(peer: &SocketAddr) -> io::Result<UdpSocket> {
    match peer {
        SocketAddr::V4(..) => Inet::bind(),
        SocketAddr::V6(..) => Inet6::bind(),
    }
}
