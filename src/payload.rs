//! Typed protocol commands.
//!
//! Every datagram the crate sends is a [`Command`], serialized as
//! `{"method": <name>, "params": {...}}` with a fixed parameter schema per
//! method.

use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::status::{LightState, Tone};
use crate::types::{Brightness, Color, Kelvin};

/// Parameters of a `setPilot` command.
///
/// Only the attributes that were set are serialized.
///
/// ```
/// use wiz_controller::{Brightness, Kelvin, Pilot};
///
/// let mut pilot = Pilot::new();
/// assert!(!pilot.is_valid());
///
/// pilot.brightness(&Brightness::create(40).unwrap());
/// pilot.temp(&Kelvin::create(2700).unwrap());
/// assert!(pilot.is_valid());
/// ```
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Pilot {
    pub(crate) state: Option<bool>,
    pub(crate) dimming: Option<u8>,
    pub(crate) temp: Option<u16>,
    pub(crate) r: Option<u8>,
    pub(crate) g: Option<u8>,
    pub(crate) b: Option<u8>,
}

impl Pilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// At least one attribute must be set before the pilot is sent.
    pub fn is_valid(&self) -> bool {
        self.state.is_some()
            || self.dimming.is_some()
            || self.temp.is_some()
            || (self.r.is_some() && self.g.is_some() && self.b.is_some())
    }

    pub fn power(&mut self, on: bool) -> &mut Self {
        self.state = Some(on);
        self
    }

    pub fn brightness(&mut self, brightness: &Brightness) -> &mut Self {
        self.dimming = Some(brightness.value);
        self
    }

    /// Selects white mode. Clears any RGB value set earlier.
    pub fn temp(&mut self, temp: &Kelvin) -> &mut Self {
        self.temp = Some(temp.kelvin);
        self.r = None;
        self.g = None;
        self.b = None;
        self
    }

    /// Selects color mode. Clears any temperature set earlier.
    pub fn color(&mut self, color: &Color) -> &mut Self {
        self.r = Some(color.red);
        self.g = Some(color.green);
        self.b = Some(color.blue);
        self.temp = None;
        self
    }

    pub fn tone(&mut self, tone: &Tone) -> &mut Self {
        match tone {
            Tone::White { temperature } => self.temp(temperature),
            Tone::Rgb(color) => self.color(color),
        }
    }
}

impl From<&LightState> for Pilot {
    /// Anything other than an explicit power-off also switches the bulb on,
    /// matching what the bulb does when it receives a color or dimming value.
    fn from(state: &LightState) -> Self {
        let mut pilot = Pilot::new();
        if let Some(brightness) = &state.brightness {
            pilot.brightness(brightness);
        }
        if let Some(tone) = &state.tone {
            pilot.tone(tone);
        }
        match state.power {
            Some(on) => pilot.power(on),
            None => pilot.power(true),
        };
        pilot
    }
}

/// Empty `params` object for query methods.
#[derive(Default, Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct NoParams {}

/// A request to a bulb.
///
/// ```
/// use wiz_controller::{Command, Pilot};
///
/// let mut pilot = Pilot::new();
/// pilot.power(false);
/// let json = serde_json::to_string(&Command::SetPilot(pilot)).unwrap();
/// assert_eq!(json, r#"{"method":"setPilot","params":{"state":false}}"#);
/// ```
#[derive(Debug, Serialize, Clone, PartialEq, IntoStaticStr)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Command {
    SetPilot(Pilot),
    GetPilot(NoParams),
    GetSystemConfig(NoParams),
}

impl Command {
    pub fn get_pilot() -> Self {
        Command::GetPilot(NoParams {})
    }

    pub fn get_system_config() -> Self {
        Command::GetSystemConfig(NoParams {})
    }

    /// Protocol method name, e.g. `setPilot`.
    pub fn method(&self) -> &'static str {
        self.into()
    }
}
