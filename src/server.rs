use std::fmt;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 53;

/// A name server to send queries to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameServer {
    pub addr: SocketAddr,
}

impl NameServer {
    pub fn new(addr: SocketAddr) -> NameServer {
        NameServer { addr }
    }

    /// A server listening on the default port.
    pub fn from_ip(ip: IpAddr) -> NameServer {
        NameServer::new(SocketAddr::new(ip, DEFAULT_PORT))
    }
}

impl From<SocketAddr> for NameServer {
    fn from(addr: SocketAddr) -> NameServer {
        NameServer::new(addr)
    }
}

impl From<IpAddr> for NameServer {
    fn from(ip: IpAddr) -> NameServer {
        NameServer::from_ip(ip)
    }
}

/// Accepts `address` or `address:port`, IPv6 with a port in brackets.
impl FromStr for NameServer {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<NameServer, AddrParseError> {
        match s.parse::<SocketAddr>() {
            Ok(addr) => Ok(NameServer::new(addr)),
            Err(_) => s.parse::<IpAddr>().map(NameServer::from_ip),
        }
    }
}

impl fmt::Display for NameServer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.addr, f)
    }
}
