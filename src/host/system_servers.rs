use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;

use crate::host::ServerSource;
use crate::server::NameServer;

const RESOLV_CONF: &str = "/etc/resolv.conf";

/// The servers listed as `nameserver` lines of a resolv.conf file
#[derive(Clone, Debug)]
pub struct SystemServers {
    path: PathBuf,
}

impl Default for SystemServers {
    fn default() -> SystemServers {
        SystemServers::new()
    }
}

impl SystemServers {
    pub fn new() -> SystemServers {
        SystemServers::from_path(RESOLV_CONF)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> SystemServers {
        SystemServers {
            path: path.as_ref().to_owned(),
        }
    }

    /// Collects the servers of resolv.conf formatted `text`.
    ///
    /// Other keywords are skipped, as are addresses that don't parse.
    pub fn parse(text: &str) -> Vec<NameServer> {
        let mut servers = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            let mut words = line.split_whitespace();
            if words.next() != Some("nameserver") {
                continue;
            }
            match words.next().map(str::parse::<NameServer>) {
                Some(Ok(server)) => servers.push(server),
                Some(Err(err)) => warn!("skipping nameserver line {:?}: {}", line, err),
                None => warn!("nameserver line without an address"),
            }
        }
        servers
    }
}

impl ServerSource for SystemServers {
    fn servers(&self) -> io::Result<Vec<NameServer>> {
        let text = fs::read_to_string(&self.path)?;
        Ok(SystemServers::parse(&text))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_resolv_conf() {
        let data = "# generated\n\
                    nameserver 192.0.2.0\n\
                    nameserver 192.0.2.1\n\
                    domain example.com\n\
                    search example.com example.net\n\
                    nameserver 2001:db8::53\n\
                    nameserver fe80::1%eth0\n\
                    options ndots:2\n";
        let servers = SystemServers::parse(data);
        let expected: Vec<NameServer> = vec![
            "192.0.2.0".parse().unwrap(),
            "192.0.2.1".parse().unwrap(),
            "2001:db8::53".parse().unwrap(),
        ];
        assert_eq!(servers, expected);
    }

    #[test]
    fn missing_file() {
        let source = SystemServers::from_path("/nonexistent/resolv.conf");
        assert!(source.servers().is_err());
    }
}
