//! Device discovery via UDP broadcast.

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use log::{debug, info};

use crate::config::{BulbType, SystemConfig};
use crate::errors::Error;
use crate::light::Light;
use crate::payload::Command;
use crate::response::Response;
use crate::runtime::{self, AsyncUdpSocket, Instant, UdpSocket};
use crate::settings::Settings;

type Result<T> = std::result::Result<T, Error>;

/// A bulb that answered the discovery probe.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredBulb {
    pub ip: Ipv4Addr,
    /// What the bulb reported about itself.
    pub config: SystemConfig,
}

impl DiscoveredBulb {
    pub fn mac(&self) -> Option<&str> {
        self.config.mac.as_deref()
    }

    pub fn module_name(&self) -> Option<&str> {
        self.config.module_name.as_deref()
    }

    pub fn bulb_type(&self) -> Option<BulbType> {
        self.module_name()
            .map(|name| BulbType::from_module_name(name, self.config.fw_version.as_deref()))
    }

    /// Convert this discovered bulb into a [`Light`] that talks to it.
    pub fn into_light(self, settings: Settings) -> Light {
        Light::with_identity(self.ip, settings, self.config)
    }
}

/// Discover bulbs on the local network using UDP broadcast.
///
/// Broadcasts `getSystemConfig` to [`Settings::broadcast_address`] and
/// collects replies until [`Settings::discovery_timeout`] elapses. Replies
/// are de-duplicated by source address and returned ordered by address.
/// Datagrams that do not decode are ignored. Finding nothing is not an error.
///
/// ```ignore
/// use wiz_controller::{Settings, discover};
///
/// let bulbs = discover(&Settings::default()).await?;
/// for bulb in bulbs {
///     println!("{} {:?}", bulb.ip, bulb.mac());
/// }
/// ```
pub async fn discover(settings: &Settings) -> Result<Vec<DiscoveredBulb>> {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
        .await
        .map_err(|e| Error::socket("bind", e))?;

    socket
        .set_broadcast(true)
        .map_err(|e| Error::socket("set_broadcast", e))?;

    let probe = serde_json::to_vec(&Command::get_system_config()).map_err(Error::JsonDump)?;
    let target = SocketAddr::V4(SocketAddrV4::new(settings.broadcast_address, settings.port));
    socket
        .send_to(&probe, target)
        .await
        .map_err(|e| Error::socket("send_to", e))?;
    debug!("discovery probe sent to {target}");

    let mut discovered: BTreeMap<Ipv4Addr, DiscoveredBulb> = BTreeMap::new();
    let mut buffer = vec![0u8; settings.buffer_size];
    let start = Instant::now();

    while let Some(remaining) = settings.discovery_timeout.checked_sub(start.elapsed()) {
        let (size, addr) = match runtime::timeout(remaining, socket.recv_from(&mut buffer)).await {
            Ok(Ok(received)) => received,
            Ok(Err(e)) => {
                debug!("discovery receive failed: {e}");
                continue;
            }
            Err(_) => break,
        };

        let SocketAddr::V4(source) = addr else {
            continue;
        };
        let ip = *source.ip();

        match Response::parse(ip, &buffer[..size]).and_then(|r| r.result_as::<SystemConfig>()) {
            Ok(config) => {
                discovered.insert(ip, DiscoveredBulb { ip, config });
            }
            Err(e) => debug!("ignoring discovery reply: {e}"),
        }
    }

    info!("discovery found {} bulb(s)", discovered.len());
    Ok(discovered.into_values().collect())
}

/// Discover with default settings and the given listening window.
pub async fn discover_bulbs(discovery_timeout: Duration) -> Result<Vec<DiscoveredBulb>> {
    discover(&Settings::default().with_discovery_timeout(discovery_timeout)).await
}
