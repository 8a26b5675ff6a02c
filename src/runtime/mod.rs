//! Runtime-agnostic async primitives.
//!
//! Everything in the crate that touches the network or the clock goes through
//! this module, so the same code runs on tokio, async-std or smol.
//!
//! # Feature Flags
//!
//! Exactly one of the following must be enabled:
//!
//! - `runtime-tokio` (default)
//! - `runtime-async-std`
//! - `runtime-smol`
//!
//! ```toml
//! [dependencies]
//! wiz-controller = { version = "0.1", default-features = false, features = ["runtime-smol"] }
//! ```

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

#[cfg(feature = "runtime-tokio")]
mod tokio_impl;

#[cfg(feature = "runtime-async-std")]
mod async_std_impl;

#[cfg(feature = "runtime-smol")]
mod smol_impl;

#[cfg(feature = "runtime-tokio")]
use tokio_impl as imp;

#[cfg(feature = "runtime-async-std")]
use async_std_impl as imp;

#[cfg(feature = "runtime-smol")]
use smol_impl as imp;

pub use imp::{JoinHandle, UdpSocket};

/// Async UDP socket operations needed by the transport and discovery.
pub trait AsyncUdpSocket: Send + Sync + Sized {
    /// Bind to a local address. Use port 0 for an ephemeral port.
    fn bind(addr: SocketAddr) -> impl Future<Output = io::Result<Self>> + Send;

    /// Fix the remote peer so that [`send`](Self::send) and
    /// [`recv`](Self::recv) can be used.
    fn connect(&self, addr: SocketAddr) -> impl Future<Output = io::Result<()>> + Send;

    fn send(&self, buf: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    fn recv(&self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;

    fn send_to(
        &self,
        buf: &[u8],
        addr: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send;

    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    fn set_broadcast(&self, broadcast: bool) -> io::Result<()>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// Sleep for the specified duration.
pub async fn sleep(duration: Duration) {
    imp::sleep(duration).await
}

/// Run a future, giving up after `duration`.
pub async fn timeout<F, T>(duration: Duration, future: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    imp::timeout(duration, future).await
}

/// Run a future as a background task.
pub fn spawn<F, T>(future: F) -> JoinHandle<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    imp::spawn(future)
}

/// Returned by [`timeout`] when the deadline passes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut;

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation timed out")
    }
}

impl std::error::Error for TimedOut {}

/// Monotonic clock reading from the active runtime.
#[derive(Debug, Clone, Copy)]
pub struct Instant(imp::Instant);

impl Instant {
    pub fn now() -> Self {
        Instant(imp::Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

#[cfg(feature = "runtime-tokio")]
pub use tokio::sync::Mutex;

#[cfg(feature = "runtime-async-std")]
pub use async_std::sync::Mutex;

#[cfg(feature = "runtime-smol")]
pub use async_lock::Mutex;

#[cfg(not(any(
    feature = "runtime-tokio",
    feature = "runtime-async-std",
    feature = "runtime-smol"
)))]
compile_error!(
    "One of \"runtime-tokio\", \"runtime-async-std\", or \"runtime-smol\" features must be enabled"
);

#[cfg(all(feature = "runtime-tokio", feature = "runtime-async-std"))]
compile_error!("Features \"runtime-tokio\" and \"runtime-async-std\" are mutually exclusive");

#[cfg(all(feature = "runtime-tokio", feature = "runtime-smol"))]
compile_error!("Features \"runtime-tokio\" and \"runtime-smol\" are mutually exclusive");

#[cfg(all(feature = "runtime-async-std", feature = "runtime-smol"))]
compile_error!("Features \"runtime-async-std\" and \"runtime-smol\" are mutually exclusive");
