//! Client configuration.

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};

/// Network settings shared by the transport, discovery and every [`Light`](crate::Light).
///
/// Deserializable so applications can read it from their own config file;
/// missing fields fall back to the defaults below.
///
/// ```
/// use std::time::Duration;
/// use wiz_controller::Settings;
///
/// let settings = Settings::default().with_reply_timeout(Duration::from_millis(500));
/// assert_eq!(settings.port, 38899);
/// assert_eq!(settings.reply_timeout, Duration::from_millis(500));
/// ```
#[serde_as]
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// UDP port the bulbs listen on.
    pub port: u16,
    /// Destination of the discovery probe. A subnet broadcast such as
    /// `192.168.1.255` restricts the probe to one subnet.
    pub broadcast_address: Ipv4Addr,
    /// How long a request waits for its single reply.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub reply_timeout: Duration,
    /// How long discovery listens for replies.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub discovery_timeout: Duration,
    /// When false, set-commands are fire-and-forget.
    pub wait_for_ack: bool,
    /// Receive buffer size in bytes.
    pub buffer_size: usize,
}

impl Settings {
    pub const DEFAULT_PORT: u16 = 38899;

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_broadcast_address(mut self, address: Ipv4Addr) -> Self {
        self.broadcast_address = address;
        self
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_wait_for_ack(mut self, wait: bool) -> Self {
        self.wait_for_ack = wait;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: Self::DEFAULT_PORT,
            broadcast_address: Ipv4Addr::BROADCAST,
            reply_timeout: Duration::from_millis(1000),
            discovery_timeout: Duration::from_millis(3500),
            wait_for_ack: true,
            buffer_size: 4096,
        }
    }
}
