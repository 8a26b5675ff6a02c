//! The set of bulbs an application currently knows about.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::net::Ipv4Addr;

use log::info;

use crate::discovery::discover;
use crate::errors::Error;
use crate::fade::{FadeHandle, FadeSpec};
use crate::light::Light;
use crate::settings::Settings;

type Result<T> = std::result::Result<T, Error>;

/// Owns one [`Light`] per address.
///
/// Lights are handed out as cheap clones that share the cached state and the
/// running fade with the registry's copy, so a UI can keep a handle per
/// widget without a global device table.
///
/// ```
/// use std::net::Ipv4Addr;
/// use wiz_controller::{DeviceRegistry, Settings};
///
/// let mut registry = DeviceRegistry::new(Settings::default());
/// let ip = Ipv4Addr::new(192, 168, 1, 40);
/// registry.add(ip);
/// assert_eq!(registry.get(ip).unwrap().ip(), ip);
/// assert!(registry.remove(ip).is_some());
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    settings: Settings,
    lights: BTreeMap<Ipv4Addr, Light>,
}

impl DeviceRegistry {
    pub fn new(settings: Settings) -> Self {
        DeviceRegistry {
            settings,
            lights: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run discovery and make the registry match the bulbs that answered.
    ///
    /// Bulbs that answer again keep their handle (and cached state); bulbs
    /// that stay silent are dropped. Returns the number of known bulbs.
    pub async fn rescan(&mut self) -> Result<usize> {
        let found = discover(&self.settings).await?;

        let mut lights = BTreeMap::new();
        for bulb in found {
            let light = match self.lights.remove(&bulb.ip) {
                Some(existing) => existing,
                None => bulb.into_light(self.settings.clone()),
            };
            lights.insert(light.ip(), light);
        }
        for gone in self.lights.keys() {
            info!("{gone} no longer answers, dropping it");
        }
        self.lights = lights;
        Ok(self.lights.len())
    }

    /// Track a bulb by address without discovering it.
    pub fn add(&mut self, ip: Ipv4Addr) -> Light {
        match self.lights.entry(ip) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => entry.insert(Light::new(ip, self.settings.clone())).clone(),
        }
    }

    pub fn remove(&mut self, ip: Ipv4Addr) -> Option<Light> {
        self.lights.remove(&ip)
    }

    pub fn get(&self, ip: Ipv4Addr) -> Option<Light> {
        self.lights.get(&ip).cloned()
    }

    /// Known bulbs, ordered by address.
    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.values()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Start a fade on a known bulb.
    pub async fn fade(&self, ip: Ipv4Addr, spec: FadeSpec) -> Result<FadeHandle> {
        let light = self
            .lights
            .get(&ip)
            .ok_or_else(|| Error::invalid_parameter("ip", ip, "not a known bulb"))?;
        light.fade(spec).await
    }
}
