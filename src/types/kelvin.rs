//! Color temperature control.

use serde::{Deserialize, Serialize};

/// Color temperature in Kelvin, with valid values from 1000K to 8000K.
///
/// This is the widest range the protocol carries. Individual bulbs accept a
/// narrower [`KelvinRange`]. Typical values:
/// - 2200K: Candle-like
/// - 2700K: Warm white (incandescent-like)
/// - 4000K: Neutral white
/// - 6500K: Daylight
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u16", into = "u16")]
pub struct Kelvin {
    pub(crate) kelvin: u16,
}

impl Kelvin {
    pub const MIN: u16 = 1000;
    pub const MAX: u16 = 8000;

    pub fn kelvin(&self) -> u16 {
        self.kelvin
    }

    /// Returns `None` if value is outside the valid range (1000-8000).
    ///
    /// ```
    /// use wiz_controller::Kelvin;
    ///
    /// assert!(Kelvin::create(999).is_none());
    /// assert!(Kelvin::create(2700).is_some());
    /// assert!(Kelvin::create(8001).is_none());
    /// ```
    pub fn create(kelvin: u16) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&kelvin) {
            Some(Kelvin { kelvin })
        } else {
            None
        }
    }
}

impl TryFrom<u16> for Kelvin {
    type Error = String;

    fn try_from(kelvin: u16) -> Result<Self, String> {
        Kelvin::create(kelvin).ok_or_else(|| format!("{kelvin}K is outside 1000-8000K"))
    }
}

impl From<Kelvin> for u16 {
    fn from(kelvin: Kelvin) -> u16 {
        kelvin.kelvin
    }
}

/// The temperatures a particular bulb accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KelvinRange {
    pub min: u16,
    pub max: u16,
}

impl KelvinRange {
    pub fn contains(&self, kelvin: u16) -> bool {
        (self.min..=self.max).contains(&kelvin)
    }
}

impl Default for KelvinRange {
    /// Tunable-white range of color bulbs.
    fn default() -> Self {
        KelvinRange {
            min: 2200,
            max: 6500,
        }
    }
}
