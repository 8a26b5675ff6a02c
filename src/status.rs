//! Light state tracking.

use serde::{Deserialize, Serialize};

use crate::payload::Pilot;
use crate::types::{Brightness, Color, Kelvin};

/// What a bulb is emitting apart from its brightness: either tunable white
/// or an RGB color.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum Tone {
    White {
        #[serde(alias = "temp")]
        temperature: Kelvin,
    },
    Rgb(Color),
}

impl Tone {
    pub fn white(temperature: Kelvin) -> Self {
        Tone::White { temperature }
    }
}

/// A full or partial description of a bulb's output.
///
/// Used as the last-known state cache of a [`Light`](crate::Light), as the
/// endpoints of a fade and as the unit the fade engine emits per step.
/// Unset fields mean "unknown" in a cache and "leave unchanged" in a command.
#[serde_with::skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct LightState {
    pub power: Option<bool>,
    pub brightness: Option<Brightness>,
    pub tone: Option<Tone>,
}

impl LightState {
    pub fn with_power(mut self, on: bool) -> Self {
        self.power = Some(on);
        self
    }

    pub fn with_brightness(mut self, brightness: Brightness) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_temperature(mut self, temperature: Kelvin) -> Self {
        self.tone = Some(Tone::white(temperature));
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.tone = Some(Tone::Rgb(color));
        self
    }

    pub fn is_on(&self) -> Option<bool> {
        self.power
    }

    pub fn temperature(&self) -> Option<Kelvin> {
        match self.tone {
            Some(Tone::White { temperature }) => Some(temperature),
            _ => None,
        }
    }

    pub fn color(&self) -> Option<Color> {
        match self.tone {
            Some(Tone::Rgb(color)) => Some(color),
            _ => None,
        }
    }

    /// Overwrite the fields that `other` knows about.
    ///
    /// ```
    /// use wiz_controller::{Brightness, Kelvin, LightState};
    ///
    /// let mut cache = LightState::default()
    ///     .with_power(true)
    ///     .with_temperature(Kelvin::create(2700).unwrap());
    /// cache.update(&LightState::default().with_brightness(Brightness::create(30).unwrap()));
    ///
    /// assert_eq!(cache.is_on(), Some(true));
    /// assert_eq!(cache.temperature().unwrap().kelvin(), 2700);
    /// assert_eq!(cache.brightness.unwrap().value(), 30);
    /// ```
    pub fn update(&mut self, other: &LightState) {
        if other.power.is_some() {
            self.power = other.power;
        }
        if other.brightness.is_some() {
            self.brightness = other.brightness;
        }
        if other.tone.is_some() {
            self.tone = other.tone;
        }
    }
}

impl From<&Pilot> for LightState {
    /// The state a bulb is in after accepting `pilot`, as far as the pilot says.
    fn from(pilot: &Pilot) -> Self {
        LightState {
            power: pilot.state,
            brightness: pilot.dimming.and_then(Brightness::create),
            tone: tone_of(pilot.r, pilot.g, pilot.b, pilot.temp),
        }
    }
}

/// The `result` object of a `getPilot` reply.
#[derive(Debug, Deserialize, Clone)]
pub(crate) struct PilotResult {
    state: bool,
    #[serde(default)]
    dimming: Option<u8>,
    #[serde(default)]
    temp: Option<u16>,
    #[serde(default)]
    r: Option<u8>,
    #[serde(default)]
    g: Option<u8>,
    #[serde(default)]
    b: Option<u8>,
}

impl From<&PilotResult> for LightState {
    fn from(result: &PilotResult) -> Self {
        LightState {
            power: Some(result.state),
            brightness: result.dimming.and_then(Brightness::create),
            tone: tone_of(result.r, result.g, result.b, result.temp),
        }
    }
}

// A bulb playing a scene reports neither rgb nor a usable temperature.
fn tone_of(r: Option<u8>, g: Option<u8>, b: Option<u8>, temp: Option<u16>) -> Option<Tone> {
    match (r, g, b, temp) {
        (Some(r), Some(g), Some(b), _) => Some(Tone::Rgb(Color::rgb(r, g, b))),
        (_, _, _, Some(temp)) => Kelvin::create(temp).map(Tone::white),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> LightState {
        let result: PilotResult = serde_json::from_value(value).unwrap();
        LightState::from(&result)
    }

    #[test]
    fn test_white_mode_reply() {
        let state = parse(json!({
            "mac": "a8bb50aabbcc", "rssi": -58, "state": true,
            "sceneId": 0, "temp": 4200, "dimming": 80
        }));
        assert_eq!(state.is_on(), Some(true));
        assert_eq!(state.temperature().unwrap().kelvin(), 4200);
        assert_eq!(state.brightness.unwrap().value(), 80);
        assert!(state.color().is_none());
    }

    #[test]
    fn test_rgb_mode_reply() {
        let state = parse(json!({
            "state": false, "sceneId": 0, "r": 255, "g": 120, "b": 40,
            "c": 0, "w": 0, "dimming": 55
        }));
        assert_eq!(state.is_on(), Some(false));
        assert_eq!(state.color(), Some(Color::rgb(255, 120, 40)));
    }

    #[test]
    fn test_scene_reply_has_no_tone() {
        let state = parse(json!({"state": true, "sceneId": 4, "speed": 100, "dimming": 50}));
        assert!(state.tone.is_none());
    }

    #[test]
    fn test_missing_state_is_rejected() {
        assert!(serde_json::from_value::<PilotResult>(json!({"dimming": 50})).is_err());
    }

    #[test]
    fn test_state_from_pilot() {
        let mut pilot = Pilot::new();
        pilot
            .power(true)
            .temp(&Kelvin::create(6500).unwrap());
        let state = LightState::from(&pilot);
        assert_eq!(state.is_on(), Some(true));
        assert_eq!(state.temperature().unwrap().kelvin(), 6500);
        assert!(state.brightness.is_none());
    }
}
