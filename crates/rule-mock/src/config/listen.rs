//! Listen address configuration.

use crate::error::ServerError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use tokio::net::lookup_host;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ListenConfig {
    /// Interface to bind (default: loopback only)
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind; 0 picks a free ephemeral port
    #[serde(default)]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 0,
        }
    }
}

impl ListenConfig {
    /// Reject hosts that can never resolve, without touching DNS.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.host.is_empty() || self.host.chars().any(char::is_whitespace) {
            return Err(ServerError::InvalidAddress(self.target()));
        }
        Ok(())
    }

    /// Resolve host and port into the address to bind.
    ///
    /// IP literals are used as is; names go through the runtime's resolver.
    pub async fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        self.validate()?;
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        lookup_host((self.host.as_str(), self.port))
            .await
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ServerError::InvalidAddress(self.target()))
    }

    fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
