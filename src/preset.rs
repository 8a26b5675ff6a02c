//! Named light configurations, built in or saved by the user.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::Error;
use crate::status::{LightState, Tone};
use crate::types::{Brightness, Color, Kelvin};

type Result<T> = std::result::Result<T, Error>;

/// A brightness plus either a white temperature or an RGB color.
///
/// Stored as `{"brightness": 65, "temperature": 2700}` or
/// `{"brightness": 55, "r": 255, "g": 120, "b": 40}`. The older
/// `dimming`/`temp` keys are accepted when reading.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    #[serde(alias = "dimming")]
    pub brightness: Brightness,
    #[serde(flatten)]
    pub tone: Tone,
}

impl Preset {
    pub fn white(brightness: Brightness, temperature: Kelvin) -> Self {
        Preset {
            brightness,
            tone: Tone::White { temperature },
        }
    }

    pub fn rgb(brightness: Brightness, color: Color) -> Self {
        Preset {
            brightness,
            tone: Tone::Rgb(color),
        }
    }

    /// The state a bulb ends up in when the preset is applied (switched on).
    pub fn state(&self) -> LightState {
        LightState {
            power: Some(true),
            brightness: Some(self.brightness),
            tone: Some(self.tone),
        }
    }
}

/// Presets that ship with the crate. Their names are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum BuiltinPreset {
    Warm,
    Cool,
    Focus,
    Relax,
    Sunset,
    Forest,
    Night,
}

impl BuiltinPreset {
    pub fn preset(self) -> Preset {
        let white = |level: u8, kelvin: u16| Preset {
            brightness: Brightness { value: level },
            tone: Tone::White {
                temperature: Kelvin { kelvin },
            },
        };
        let rgb = |level: u8, r: u8, g: u8, b: u8| Preset {
            brightness: Brightness { value: level },
            tone: Tone::Rgb(Color::rgb(r, g, b)),
        };

        match self {
            BuiltinPreset::Warm => white(65, 2700),
            BuiltinPreset::Cool => white(75, 5000),
            BuiltinPreset::Focus => white(100, 6500),
            BuiltinPreset::Relax => white(40, 2200),
            BuiltinPreset::Sunset => rgb(55, 255, 120, 40),
            BuiltinPreset::Forest => rgb(60, 0, 180, 80),
            BuiltinPreset::Night => white(10, 2200),
        }
    }
}

/// User presets persisted as one JSON object keyed by name.
///
/// Lookups fall back to the [`BuiltinPreset`]s. The file is rewritten
/// wholesale by [`PresetStore::save`].
#[derive(Debug, Clone)]
pub struct PresetStore {
    path: PathBuf,
    custom: BTreeMap<String, Preset>,
}

impl PresetStore {
    /// Read the store at `path`. A missing file is an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let custom = match fs::read_to_string(&path) {
            Ok(text) => parse(&path, &text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no preset file at {path:?}, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(Error::preset_file(&path, e)),
        };
        Ok(PresetStore { path, custom })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every user preset to the file, replacing its contents.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| Error::preset_file(&self.path, e))?;
        }
        let text = serde_json::to_string_pretty(&self.custom).map_err(Error::JsonDump)?;
        fs::write(&self.path, text).map_err(|e| Error::preset_file(&self.path, e))
    }

    /// Add or replace a user preset, returning the one it replaced.
    ///
    /// Blank names and built-in names are rejected.
    pub fn insert(&mut self, name: &str, preset: Preset) -> Result<Option<Preset>> {
        let name = name.trim();
        if name.is_empty() || BuiltinPreset::from_str(name).is_ok() {
            return Err(Error::InvalidPresetName(name.to_string()));
        }
        Ok(self.custom.insert(name.to_string(), preset))
    }

    pub fn remove(&mut self, name: &str) -> Option<Preset> {
        self.custom.remove(name.trim())
    }

    /// User preset by exact name, else built-in preset by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<Preset> {
        let name = name.trim();
        self.custom
            .get(name)
            .copied()
            .or_else(|| BuiltinPreset::from_str(name).ok().map(BuiltinPreset::preset))
    }

    /// User presets ordered by name.
    pub fn custom(&self) -> impl Iterator<Item = (&str, &Preset)> {
        self.custom.iter().map(|(name, preset)| (name.as_str(), preset))
    }

    pub fn builtins() -> impl Iterator<Item = (BuiltinPreset, Preset)> {
        BuiltinPreset::iter().map(|builtin| (builtin, builtin.preset()))
    }

    pub fn len(&self) -> usize {
        self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }
}

fn parse(path: &Path, text: &str) -> Result<BTreeMap<String, Preset>> {
    let mut custom: BTreeMap<String, Preset> =
        serde_json::from_str(text).map_err(|err| Error::PresetFormat {
            path: path.to_path_buf(),
            err,
        })?;
    custom.retain(|name, _| {
        let reserved = BuiltinPreset::from_str(name).is_ok();
        if reserved {
            warn!("ignoring saved preset {name:?}: the name belongs to a built-in preset");
        }
        !reserved
    });
    Ok(custom)
}
