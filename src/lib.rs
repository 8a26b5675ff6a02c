//! # wiz_controller
//!
//! An async Rust library for controlling WiZ smart bulbs over the local network.
//!
//! This crate provides a **runtime-agnostic** async API that speaks the bulbs'
//! UDP JSON protocol. It finds bulbs with a broadcast probe, switches them on
//! and off, sets brightness, white temperature and RGB color, plays timed
//! fades, and keeps a small library of named presets.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::net::Ipv4Addr;
//! use wiz_controller::{Light, Settings};
//!
//! // Works with any async runtime!
//! async fn control_light() -> Result<(), wiz_controller::Error> {
//!     let light = Light::new(Ipv4Addr::new(192, 168, 1, 100), Settings::default());
//!
//!     light.set_rgb(0, 0, 255).await?;
//!     light.set_brightness(60).await?;
//!     println!("{:?}", light.get_state().await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Runtime Agnostic**: Works with tokio, async-std, or smol async runtimes
//! - **Discovery**: Find bulbs on your network with [`discover`]
//! - **Device Control**: Power, brightness, [`Kelvin`] temperature and [`Color`] on a [`Light`]
//! - **Fades**: Timed transitions between two [`LightState`]s, see [`FadeSpec`]
//! - **Presets**: Built-in and user-saved looks in a [`PresetStore`]
//! - **Registry**: Track the bulbs you know about with a [`DeviceRegistry`]
//!
//! ## Communication
//!
//! All communication with WiZ bulbs occurs over UDP on port 38899. Every
//! message is a single JSON object of the form `{"method": ..., "params": ...}`
//! and the bulb answers with `{"result": ...}` or `{"error": ...}`. The bulbs
//! must be on the same local network as the controller.
//!
//! ## Runtime Selection
//!
//! Select your preferred runtime using feature flags:
//!
//! ### Using tokio (default)
//!
//! ```toml
//! [dependencies]
//! wiz-controller = "0.1"
//! tokio = { version = "1", features = ["rt-multi-thread", "macros"] }
//! ```
//!
//! ### Using async-std
//!
//! ```toml
//! [dependencies]
//! wiz-controller = { version = "0.1", default-features = false, features = ["runtime-async-std"] }
//! async-std = { version = "1.12", features = ["attributes"] }
//! ```
//!
//! ### Using smol
//!
//! ```toml
//! [dependencies]
//! wiz-controller = { version = "0.1", default-features = false, features = ["runtime-smol"] }
//! smol = "2"
//! ```

mod config;
mod discovery;
mod errors;
mod fade;
mod light;
mod payload;
mod preset;
mod registry;
mod response;
pub mod runtime;
mod settings;
mod status;
#[cfg(all(test, feature = "runtime-tokio"))]
mod testing;
mod transport;
mod types;

// Re-export public API
pub use config::{BulbClass, BulbType, SystemConfig};
pub use discovery::{DiscoveredBulb, discover, discover_bulbs};
pub use errors::Error;
pub use fade::{CancellationToken, FadeHandle, FadeReport, FadeSpec, plan};
pub use light::Light;
pub use payload::{Command, NoParams, Pilot};
pub use preset::{BuiltinPreset, Preset, PresetStore};
pub use registry::DeviceRegistry;
pub use response::Response;
pub use settings::Settings;
pub use status::{LightState, Tone};
pub use transport::Transport;
pub use types::{Brightness, Color, Kelvin, KelvinRange, PowerMode};
