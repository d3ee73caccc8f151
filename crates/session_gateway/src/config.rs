//! Gateway configuration types and defaults.
//!
//! This module contains the gateway configuration structure and default
//! values used to initialize the WebSocket transport layer.

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration structure for the WebSocket gateway.
///
/// Contains all necessary parameters to configure transport behavior
/// including network settings, heartbeat timing, frame limits, and the
/// browser origin allow-list.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// The socket address to bind the gateway to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections allowed
    pub max_connections: usize,

    /// Interval between server-initiated pings, in milliseconds
    pub ping_interval_ms: u64,

    /// How long the read loop waits for any inbound frame before the
    /// connection is considered dead, in milliseconds. Must exceed the
    /// ping interval so a healthy peer always refreshes the deadline.
    pub read_timeout_ms: u64,

    /// Deadline for writing a data frame, in milliseconds
    pub write_timeout_ms: u64,

    /// Deadline for writing control frames (ping, close), in milliseconds
    pub control_timeout_ms: u64,

    /// Maximum inbound frame and message size in bytes
    pub max_frame_bytes: usize,

    /// Browser origins allowed to connect. A request with no `Origin`
    /// header (non-browser client) is always allowed.
    pub allowed_origins: Vec<String>,

    /// Whether to use SO_REUSEPORT for multi-threaded accept loops
    pub use_reuse_port: bool,
}

impl GatewayConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    /// Whether a handshake with the given `Origin` header may proceed.
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            None => true,
            Some(origin) => self.allowed_origins.iter().any(|o| o == origin),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".parse().expect("Attempted to use GatewayConfig::default(), but field `bind_address` is not parsable in the source code"),
            max_connections: 1000,
            ping_interval_ms: 30_000,
            read_timeout_ms: 60_000,
            write_timeout_ms: 10_000,
            control_timeout_ms: 2_000,
            max_frame_bytes: 1024 * 1024,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            use_reuse_port: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_origin_is_always_allowed() {
        let config = GatewayConfig::default();
        assert!(config.origin_allowed(None));
    }

    #[test]
    fn listed_origin_is_allowed_others_are_not() {
        let config = GatewayConfig::default();
        assert!(config.origin_allowed(Some("http://localhost:5173")));
        assert!(!config.origin_allowed(Some("http://evil.example")));
    }
}
