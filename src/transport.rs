//! Single-datagram UDP exchange with one bulb.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use log::debug;

use crate::errors::Error;
use crate::payload::Command;
use crate::response::Response;
use crate::runtime::{self, AsyncUdpSocket, UdpSocket};
use crate::settings::Settings;

type Result<T> = std::result::Result<T, Error>;

/// Sends commands to bulbs.
///
/// Every call binds its own ephemeral socket, so a `Transport` can be cloned
/// freely and shared between tasks. Nothing is ever retried.
#[derive(Debug, Clone, Default)]
pub struct Transport {
    settings: Settings,
}

impl Transport {
    pub fn new(settings: Settings) -> Self {
        Transport { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Write `command` to `ip` and, if `expect_reply`, wait for one reply.
    ///
    /// Returns `Ok(None)` for fire-and-forget sends.
    pub async fn exchange(
        &self,
        ip: Ipv4Addr,
        command: &Command,
        expect_reply: bool,
    ) -> Result<Option<Response>> {
        let socket = self.open(ip).await?;
        let datagram = serde_json::to_vec(command).map_err(Error::JsonDump)?;
        debug!("-> {ip}: {}", String::from_utf8_lossy(&datagram));

        socket
            .send(&datagram)
            .await
            .map_err(|e| Error::socket("send", e))?;

        if !expect_reply {
            return Ok(None);
        }

        let mut buffer = vec![0u8; self.settings.buffer_size];
        let waited = self.settings.reply_timeout;
        let size = runtime::timeout(waited, receive(&socket, &mut buffer))
            .await
            .map_err(|_| Error::Timeout { ip, waited })?
            .map_err(|e| Error::socket("receive", e))?;

        debug!("<- {ip}: {}", String::from_utf8_lossy(&buffer[..size]));
        Response::parse(ip, &buffer[..size]).map(Some)
    }

    /// Fire and forget.
    pub async fn send(&self, ip: Ipv4Addr, command: &Command) -> Result<()> {
        self.exchange(ip, command, false).await.map(|_| ())
    }

    /// Send and wait for the reply, failing with [`Error::Timeout`] after
    /// [`Settings::reply_timeout`].
    pub async fn request(&self, ip: Ipv4Addr, command: &Command) -> Result<Response> {
        match self.exchange(ip, command, true).await? {
            Some(response) => Ok(response),
            None => Err(Error::malformed(ip, "no reply decoded")),
        }
    }

    async fn open(&self, ip: Ipv4Addr) -> Result<UdpSocket> {
        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
            .await
            .map_err(|e| Error::socket("bind", e))?;
        socket
            .connect(SocketAddr::V4(SocketAddrV4::new(ip, self.settings.port)))
            .await
            .map_err(|e| Error::socket("connect", e))?;
        Ok(socket)
    }
}

/// Receive one datagram on a connected socket.
///
/// A port-unreachable answer to our own datagram surfaces as
/// `ConnectionRefused` on the next receive; it is skipped so that an absent
/// bulb looks the same as a silent one and runs into the reply timeout.
async fn receive(socket: &UdpSocket, buffer: &mut [u8]) -> io::Result<usize> {
    loop {
        match socket.recv(buffer).await {
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                debug!("ignoring {e} while waiting for a reply");
            }
            received => return received,
        }
    }
}
