//! Device identity as reported by `getSystemConfig`.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::types::KelvinRange;

/// The `result` of a `getSystemConfig` reply.
///
/// Discovery probes with the same method, so this is also what a bulb
/// announces about itself when it is found.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub module_name: Option<String>,
    #[serde(default)]
    pub fw_version: Option<String>,
    #[serde(default)]
    pub home_id: Option<u64>,
    #[serde(default)]
    pub room_id: Option<u64>,
}

/// Broad capability class, taken from the second segment of the module
/// name (e.g. `ESP01_SHRGB1C_31`).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum BulbClass {
    /// Full color with tunable white.
    #[strum(serialize = "RGB")]
    Rgb,
    /// Tunable white.
    #[strum(serialize = "TW")]
    TunableWhite,
    /// Dimmable white.
    #[strum(serialize = "DW")]
    DimmableWhite,
    /// Smart plug.
    Socket,
}

/// What a bulb can do, derived from its module name.
#[derive(Debug, Clone, PartialEq)]
pub struct BulbType {
    pub name: String,
    pub class: BulbClass,
    pub kelvin_range: Option<KelvinRange>,
    pub fw_version: Option<String>,
}

impl BulbType {
    /// ```
    /// use wiz_controller::{BulbClass, BulbType};
    ///
    /// let bulb = BulbType::from_module_name("ESP01_SHRGB1C_31", Some("1.25.0"));
    /// assert_eq!(bulb.class, BulbClass::Rgb);
    /// assert_eq!(bulb.kelvin_range.unwrap().min, 2200);
    ///
    /// let plug = BulbType::from_module_name("ESP10_SOCKET_06", None);
    /// assert!(!plug.supports_brightness());
    /// ```
    pub fn from_module_name(module_name: &str, fw_version: Option<&str>) -> Self {
        let kind = module_name.split('_').nth(1).unwrap_or_default();

        let (class, kelvin_range) = if kind.contains("RGB") {
            (BulbClass::Rgb, Some(KelvinRange { min: 2200, max: 6500 }))
        } else if kind.contains("TW") {
            (BulbClass::TunableWhite, Some(KelvinRange { min: 2700, max: 6500 }))
        } else if kind.contains("SOCKET") {
            (BulbClass::Socket, None)
        } else {
            (BulbClass::DimmableWhite, None)
        };

        BulbType {
            name: module_name.to_string(),
            class,
            kelvin_range,
            fw_version: fw_version.map(String::from),
        }
    }

    pub fn supports_color(&self) -> bool {
        self.class == BulbClass::Rgb
    }

    pub fn supports_temperature(&self) -> bool {
        self.kelvin_range.is_some()
    }

    pub fn supports_brightness(&self) -> bool {
        self.class != BulbClass::Socket
    }
}
