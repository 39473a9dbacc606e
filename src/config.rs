//! Server configuration.
//!
//! ```rust
//! use std::time::Duration;
//! use tsu_typed::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .addr("127.0.0.1:8080")
//!     .shutdown_timeout(Duration::from_secs(10))
//!     .build();
//!
//! assert_eq!(config.addr(), "127.0.0.1:8080");
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default bind address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// How long in-flight connections get to finish after a shutdown signal.
///
/// Keep it below Kubernetes' `terminationGracePeriodSeconds` (default 30 s)
/// or SIGKILL arrives first.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(25);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    addr: String,
    shutdown_timeout: Duration,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    pub fn addr(&self) -> &str { &self.addr }
    pub fn shutdown_timeout(&self) -> Duration { self.shutdown_timeout }

    /// Parses the bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.addr.parse().map_err(|_| Error::InvalidAddress(self.addr.clone()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfigBuilder {
    addr: String,
    shutdown_timeout: Duration,
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_owned(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl ServerConfigBuilder {
    /// `host:port`. Validated when the server starts.
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn build(self) -> ServerConfig {
        ServerConfig {
            addr: self.addr,
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), DEFAULT_ADDR);
        assert_eq!(config.shutdown_timeout(), DEFAULT_SHUTDOWN_TIMEOUT);
        assert!(config.socket_addr().is_ok());
    }

    #[test]
    fn bad_addresses_surface_as_errors() {
        let config = ServerConfig::builder().addr("localhost").build();
        assert!(matches!(config.socket_addr(), Err(Error::InvalidAddress(a)) if a == "localhost"));
    }
}
