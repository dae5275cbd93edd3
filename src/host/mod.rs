use std::fmt::Debug;
use std::io;

use crate::server::NameServer;

mod fixed_servers;
mod system_servers;

pub use self::fixed_servers::FixedServers;
pub use self::system_servers::SystemServers;

/// Somewhere to learn the name servers from
pub trait ServerSource: Debug {
    fn servers(&self) -> io::Result<Vec<NameServer>>;
}
