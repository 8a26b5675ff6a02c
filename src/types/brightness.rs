//! Brightness control.

use serde::{Deserialize, Serialize};

/// Brightness level from 0 to 100 percent.
///
/// Serialized as a bare number, which is how both the bulb (`dimming`) and
/// the preset file store it.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Brightness {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;

    /// Full brightness.
    pub fn new() -> Self {
        Brightness { value: Self::MAX }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is outside 0-100.
    ///
    /// ```
    /// use wiz_controller::Brightness;
    ///
    /// assert!(Brightness::create(0).is_some());
    /// assert!(Brightness::create(100).is_some());
    /// assert!(Brightness::create(101).is_none());
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Brightness { value })
        } else {
            None
        }
    }

    /// Pins any integer to the nearest bound.
    ///
    /// ```
    /// use wiz_controller::Brightness;
    ///
    /// assert_eq!(Brightness::clamped(-20).value(), 0);
    /// assert_eq!(Brightness::clamped(55).value(), 55);
    /// assert_eq!(Brightness::clamped(250).value(), 100);
    /// ```
    pub fn clamped(value: i64) -> Self {
        let value = value.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Brightness { value: value as u8 }
    }
}

impl TryFrom<u8> for Brightness {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        Brightness::create(value).ok_or_else(|| format!("brightness {value} exceeds 100"))
    }
}

impl From<Brightness> for u8 {
    fn from(brightness: Brightness) -> u8 {
        brightness.value
    }
}
