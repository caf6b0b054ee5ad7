//! Share reachability probing
//!
//! Before asking the OS to mount a share we check that its file server
//! answers at all, otherwise `open smb://...` blocks on a dialog or timeout.

use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::Settings;

/// Scheme, host and optional explicit port of a share URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareAddress {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
}

impl ShareAddress {
    /// Parse `scheme://[user[:pass]@]host[:port][/path]`
    pub fn parse(uri: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(
                r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?:[^@/]*@)?(?P<host>\[[^\]]+\]|[^:/?#\[\]]+)(?::(?P<port>\d+))?(?:[/?#].*)?$",
            )
            .expect("share URI pattern is valid")
        });

        let captures = pattern.captures(uri.trim())?;
        let host = captures["host"].trim_start_matches('[').trim_end_matches(']');
        let port = match captures.name("port") {
            Some(port) => Some(port.as_str().parse::<u16>().ok()?),
            None => None,
        };

        Some(Self {
            scheme: captures["scheme"].to_ascii_lowercase(),
            host: host.to_string(),
            port,
        })
    }
}

/// Answers whether the server behind a share URI can be reached
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Probe: Send + Sync {
    async fn is_reachable(&self, uri: &str) -> bool;
}

/// Raw TCP connect probe against the scheme's well-known port
pub struct TcpProbe {
    ports: BTreeMap<String, u16>,
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(ports: BTreeMap<String, u16>, connect_timeout: Duration) -> Self {
        let ports = ports
            .into_iter()
            .map(|(scheme, port)| (scheme.to_ascii_lowercase(), port))
            .collect();
        Self {
            ports,
            connect_timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.ports.clone(), settings.connect_timeout())
    }

    /// Port to try for a share address: its own, else the scheme's well-known one
    pub fn port_for(&self, address: &ShareAddress) -> Option<u16> {
        address
            .port
            .or_else(|| self.ports.get(&address.scheme.to_ascii_lowercase()).copied())
    }

    /// Try one TCP connection to host:port; any failure means unreachable
    pub async fn check_socket(&self, host: &str, port: u16) -> bool {
        let attempt = async {
            let addrs = match lookup_host((host, port)).await {
                Ok(addrs) => addrs,
                Err(e) => {
                    debug!("Cannot resolve {}: {}", host, e);
                    return false;
                }
            };

            for addr in addrs {
                match TcpStream::connect(addr).await {
                    // Dropping the stream closes the socket
                    Ok(_stream) => return true,
                    Err(e) => debug!("Connect to {} failed: {}", addr, e),
                }
            }
            false
        };

        match timeout(self.connect_timeout, attempt).await {
            Ok(reachable) => reachable,
            Err(_) => {
                debug!(
                    "Connect to {}:{} timed out after {:?}",
                    host, port, self.connect_timeout
                );
                false
            }
        }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn is_reachable(&self, uri: &str) -> bool {
        let Some(address) = ShareAddress::parse(uri) else {
            warn!("Cannot parse share URI: {}", uri);
            return false;
        };

        let port = match self.port_for(&address) {
            Some(port) => port,
            None => {
                warn!("No known port for scheme '{}' in {}", address.scheme, uri);
                return false;
            }
        };

        let reachable = self.check_socket(&address.host, port).await;
        debug!("{}:{} reachable: {}", address.host, port, reachable);
        reachable
    }
}
