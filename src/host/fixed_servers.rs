use std::io;

use crate::host::ServerSource;
use crate::server::NameServer;

#[derive(Clone, Debug)]
pub struct FixedServers {
    servers: Vec<NameServer>,
}

impl FixedServers {
    pub fn new<I, S>(servers: I) -> FixedServers
    where
        I: IntoIterator<Item = S>,
        S: Into<NameServer>,
    {
        FixedServers {
            servers: servers.into_iter().map(Into::into).collect(),
        }
    }
}

impl ServerSource for FixedServers {
    fn servers(&self) -> io::Result<Vec<NameServer>> {
        Ok(self.servers.clone())
    }
}
