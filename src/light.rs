//! Individual light control.

use std::net::Ipv4Addr;
use std::sync::Arc;

use log::{debug, info};

use crate::config::{BulbType, SystemConfig};
use crate::errors::Error;
use crate::fade::{self, CancellationToken, FadeHandle, FadeSpec};
use crate::payload::{Command, Pilot};
use crate::preset::Preset;
use crate::runtime::Mutex;
use crate::settings::Settings;
use crate::status::{LightState, PilotResult};
use crate::transport::Transport;
use crate::types::{Brightness, Color, Kelvin, KelvinRange, PowerMode};

type Result<T> = std::result::Result<T, Error>;

/// Handle to a single bulb.
///
/// Clones share the last-known state and the running fade, so a clone can be
/// handed to a UI callback or a background task and stay in sync. The name,
/// identity and temperature range belong to each handle: a clone made before
/// [`Light::refresh_identity`] keeps the range it was made with.
///
/// # Example
///
/// ```
/// use std::net::Ipv4Addr;
/// use wiz_controller::{Light, Settings};
///
/// let light = Light::new(Ipv4Addr::new(192, 168, 1, 100), Settings::default())
///     .with_name("Bedroom");
/// assert_eq!(light.name(), Some("Bedroom"));
/// assert_eq!(light.kelvin_range().min, 2200);
/// ```
#[derive(Debug, Clone)]
pub struct Light {
    ip: Ipv4Addr,
    name: Option<String>,
    identity: Option<SystemConfig>,
    kelvin_range: KelvinRange,
    transport: Transport,
    state: Arc<Mutex<LightState>>,
    active_fade: Arc<Mutex<Option<CancellationToken>>>,
}

impl Light {
    pub fn new(ip: Ipv4Addr, settings: Settings) -> Self {
        Light {
            ip,
            name: None,
            identity: None,
            kelvin_range: KelvinRange::default(),
            transport: Transport::new(settings),
            state: Arc::new(Mutex::new(LightState::default())),
            active_fade: Arc::new(Mutex::new(None)),
        }
    }

    /// A light whose `getSystemConfig` answer is already known, e.g. from
    /// discovery. The module name narrows the accepted temperature range.
    pub fn with_identity(ip: Ipv4Addr, settings: Settings, identity: SystemConfig) -> Self {
        let mut light = Light::new(ip, settings);
        light.set_identity(identity);
        light
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn identity(&self) -> Option<&SystemConfig> {
        self.identity.as_ref()
    }

    pub fn mac(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|id| id.mac.as_deref())
    }

    pub fn kelvin_range(&self) -> KelvinRange {
        self.kelvin_range
    }

    pub fn set_kelvin_range(&mut self, range: KelvinRange) {
        self.kelvin_range = range;
    }

    pub fn settings(&self) -> &Settings {
        self.transport.settings()
    }

    /// Last known state. Fields the crate has never seen are `None`.
    pub async fn state(&self) -> LightState {
        *self.state.lock().await
    }

    /// Accepts a [`PowerMode`] or a plain `bool`.
    pub async fn set_power(&self, power: impl Into<PowerMode>) -> Result<()> {
        let mut pilot = Pilot::new();
        pilot.power(power.into().is_on());
        self.send_pilot(pilot).await
    }

    /// Values outside 0-100 are pinned to the nearest bound.
    pub async fn set_brightness(&self, level: i64) -> Result<()> {
        let mut pilot = Pilot::new();
        pilot.power(true).brightness(&Brightness::clamped(level));
        self.send_pilot(pilot).await
    }

    /// Fails with [`Error::InvalidParameter`] if `kelvin` is outside
    /// [`Light::kelvin_range`]; nothing is sent in that case.
    pub async fn set_temperature(&self, kelvin: u16) -> Result<()> {
        let temp = self.check_temperature(kelvin)?;
        let mut pilot = Pilot::new();
        pilot.power(true).temp(&temp);
        self.send_pilot(pilot).await
    }

    pub async fn set_rgb(&self, red: u8, green: u8, blue: u8) -> Result<()> {
        let mut pilot = Pilot::new();
        pilot.power(true).color(&Color::rgb(red, green, blue));
        self.send_pilot(pilot).await
    }

    /// Send every attribute of `state` in one command.
    pub async fn apply(&self, state: &LightState) -> Result<()> {
        if let Some(temp) = state.temperature() {
            self.check_temperature(temp.kelvin())?;
        }
        self.send_pilot(Pilot::from(state)).await
    }

    pub async fn apply_preset(&self, preset: &Preset) -> Result<()> {
        self.apply(&preset.state()).await
    }

    /// Queries the bulb (live network call) and refreshes the cache.
    pub async fn get_state(&self) -> Result<LightState> {
        let response = self.transport.request(self.ip, &Command::get_pilot()).await?;
        let result: PilotResult = response.result_as()?;
        let state = LightState::from(&result);
        self.state.lock().await.update(&state);
        Ok(state)
    }

    pub async fn toggle(&self) -> Result<()> {
        let on = self.get_state().await?.is_on().unwrap_or(false);
        self.set_power(!on).await
    }

    pub async fn get_system_config(&self) -> Result<SystemConfig> {
        let response = self
            .transport
            .request(self.ip, &Command::get_system_config())
            .await?;
        response.result_as()
    }

    /// Asks the bulb for its module name, and adopts the temperature range
    /// that goes with it.
    pub async fn refresh_identity(&mut self) -> Result<BulbType> {
        let config = self.get_system_config().await?;
        self.set_identity(config);
        self.bulb_type()
            .ok_or_else(|| Error::malformed(self.ip, "system config has no moduleName"))
    }

    /// Capabilities derived from the known module name.
    pub fn bulb_type(&self) -> Option<BulbType> {
        let identity = self.identity.as_ref()?;
        let module = identity.module_name.as_deref()?;
        Some(BulbType::from_module_name(module, identity.fw_version.as_deref()))
    }

    /// Start a fade in the background and return immediately.
    ///
    /// Any fade already running on this light is cancelled first. Timing and
    /// the end temperature are validated before anything is spawned.
    pub async fn fade(&self, spec: FadeSpec) -> Result<FadeHandle> {
        if let Some(temp) = spec.end.temperature() {
            self.check_temperature(temp.kelvin())?;
        }
        let steps = spec.validate()?;

        let token = CancellationToken::new();
        if let Some(previous) = self.active_fade.lock().await.replace(token.clone()) {
            if !previous.is_cancelled() {
                debug!("{}: superseding running fade", self.ip);
            }
            previous.cancel();
        }
        Ok(fade::spawn(self.clone(), spec, steps, token))
    }

    /// Fade from whatever the bulb reports now. Falls back to the cached
    /// state if the bulb does not answer the query.
    pub async fn fade_to(&self, end: LightState, duration_ms: u64, tick_ms: u64) -> Result<FadeHandle> {
        let start = match self.get_state().await {
            Ok(state) => state,
            Err(e) => {
                info!("{}: starting fade from cached state: {e}", self.ip);
                self.state().await
            }
        };
        self.fade(FadeSpec::new(start, end, duration_ms, tick_ms)).await
    }

    /// Stop the running fade, if any.
    pub async fn cancel_fade(&self) {
        if let Some(token) = self.active_fade.lock().await.take() {
            token.cancel();
        }
    }

    pub(crate) async fn send_pilot(&self, pilot: Pilot) -> Result<()> {
        if !pilot.is_valid() {
            return Err(Error::invalid_parameter("pilot", "{}", "no attributes set"));
        }
        let expect_reply = self.transport.settings().wait_for_ack;
        let state = LightState::from(&pilot);
        self.transport
            .exchange(self.ip, &Command::SetPilot(pilot), expect_reply)
            .await?;
        self.state.lock().await.update(&state);
        Ok(())
    }

    fn set_identity(&mut self, identity: SystemConfig) {
        self.identity = Some(identity);
        if let Some(range) = self.bulb_type().and_then(|t| t.kelvin_range) {
            self.kelvin_range = range;
        }
    }

    fn check_temperature(&self, kelvin: u16) -> Result<Kelvin> {
        if let Some(bulb) = self.bulb_type().filter(|t| !t.supports_temperature()) {
            return Err(Error::invalid_parameter(
                "temperature",
                kelvin,
                format!("{} bulbs have no white temperature", bulb.class),
            ));
        }
        let range = self.kelvin_range;
        match Kelvin::create(kelvin) {
            Some(temp) if range.contains(kelvin) => Ok(temp),
            _ => Err(Error::invalid_parameter(
                "temperature",
                kelvin,
                format!("outside {}-{}K", range.min, range.max),
            )),
        }
    }
}

#[cfg(all(test, feature = "runtime-tokio"))]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::testing::FakeBulb;

    fn light_for(bulb: &FakeBulb) -> Light {
        Light::new(
            Ipv4Addr::LOCALHOST,
            Settings::default()
                .with_port(bulb.port())
                .with_reply_timeout(Duration::from_millis(200)),
        )
    }

    #[tokio::test]
    async fn test_brightness_clamped_before_sending() {
        let bulb = FakeBulb::start().await;
        let light = light_for(&bulb);

        light.set_brightness(140).await.unwrap();
        light.set_brightness(-5).await.unwrap();
        light.set_brightness(42).await.unwrap();

        assert_eq!(
            bulb.pilots().await,
            vec![
                json!({"state": true, "dimming": 100}),
                json!({"state": true, "dimming": 0}),
                json!({"state": true, "dimming": 42}),
            ]
        );
        assert_eq!(light.state().await.brightness.unwrap().value(), 42);
    }

    #[tokio::test]
    async fn test_temperature_out_of_range_sends_nothing() {
        let bulb = FakeBulb::start().await;
        let light = light_for(&bulb);

        let err = light.set_temperature(9000).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "temperature", .. }));
        let err = light.set_temperature(2000).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(bulb.received().await.is_empty());
        assert_eq!(light.state().await, LightState::default());
    }

    #[tokio::test]
    async fn test_temperature_rejected_without_white_channel() {
        let bulb = FakeBulb::start().await;
        for module in ["ESP05_SHDW_21", "ESP10_SOCKET_06"] {
            let identity = SystemConfig {
                mac: None,
                module_name: Some(module.to_string()),
                fw_version: None,
                home_id: None,
                room_id: None,
            };
            let light = Light::with_identity(
                Ipv4Addr::LOCALHOST,
                Settings::default().with_port(bulb.port()),
                identity,
            );

            let err = light.set_temperature(4000).await.unwrap_err();
            assert!(matches!(err, Error::InvalidParameter { name: "temperature", .. }), "{module}");
            let end = LightState::default().with_temperature(Kelvin::create(4000).unwrap());
            assert!(light.fade(FadeSpec::new(LightState::default(), end, 200, 100)).await.is_err());
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(bulb.received().await.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_cache_not_identity() {
        let bulb = FakeBulb::start().await;
        let original = light_for(&bulb);
        let mut clone = original.clone();

        clone.set_brightness(25).await.unwrap();
        assert_eq!(original.state().await.brightness.unwrap().value(), 25);

        clone.refresh_identity().await.unwrap();
        assert_eq!(clone.mac(), Some("a8bb50aabbcc"));
        assert_eq!(original.mac(), None);
    }

    #[tokio::test]
    async fn test_huge_fade_runs_without_planning() {
        let bulb = FakeBulb::start().await;
        let light = light_for(&bulb);
        let spec = FadeSpec::new(
            LightState::default().with_brightness(Brightness::create(0).unwrap()),
            LightState::default().with_brightness(Brightness::create(100).unwrap()),
            u64::MAX,
            1,
        );

        let handle = light.fade(spec).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.cancel();
        let report = handle.wait().await;

        assert_eq!(report.steps, u64::MAX);
        assert!(report.cancelled);
        assert!(report.sent >= 1);
    }

    #[tokio::test]
    async fn test_set_commands_update_cache() {
        let bulb = FakeBulb::start().await;
        let light = light_for(&bulb);

        light.set_temperature(4000).await.unwrap();
        assert_eq!(light.state().await.temperature().unwrap().kelvin(), 4000);

        light.set_rgb(0, 180, 80).await.unwrap();
        light.set_power(PowerMode::Off).await.unwrap();
        let state = light.state().await;
        assert_eq!(state.color(), Some(Color::rgb(0, 180, 80)));
        assert_eq!(state.is_on(), Some(false));

        assert_eq!(
            bulb.pilots().await,
            vec![
                json!({"state": true, "temp": 4000}),
                json!({"state": true, "r": 0, "g": 180, "b": 80}),
                json!({"state": false}),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_state_and_toggle() {
        let bulb = FakeBulb::start().await;
        let light = light_for(&bulb);

        let state = light.get_state().await.unwrap();
        assert_eq!(state.is_on(), Some(true));
        assert_eq!(state.temperature().unwrap().kelvin(), 2700);
        assert_eq!(light.state().await, state);

        light.toggle().await.unwrap();
        assert_eq!(light.get_state().await.unwrap().is_on(), Some(false));
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_untouched() {
        let bulb = FakeBulb::silent().await;
        let light = light_for(&bulb);

        let err = light.set_rgb(1, 2, 3).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(light.state().await, LightState::default());
    }

    #[tokio::test]
    async fn test_fire_and_forget() {
        let bulb = FakeBulb::silent().await;
        let light = Light::new(
            Ipv4Addr::LOCALHOST,
            Settings::default()
                .with_port(bulb.port())
                .with_wait_for_ack(false),
        );

        light.set_power(true).await.unwrap();
        bulb.wait_for(1).await;
        assert_eq!(bulb.pilots().await, vec![json!({"state": true})]);
    }

    #[tokio::test]
    async fn test_identity_narrows_kelvin_range() {
        let bulb = FakeBulb::start().await;
        let mut light = light_for(&bulb);

        let bulb_type = light.refresh_identity().await.unwrap();
        assert!(bulb_type.supports_color());
        assert_eq!(light.mac(), Some("a8bb50aabbcc"));
        assert_eq!(light.kelvin_range(), KelvinRange { min: 2200, max: 6500 });
    }

    #[tokio::test]
    async fn test_fade_emits_planned_steps() {
        let bulb = FakeBulb::start().await;
        let light = light_for(&bulb);
        let spec = FadeSpec::new(
            LightState::default().with_temperature(Kelvin::create(2700).unwrap()),
            LightState::default().with_temperature(Kelvin::create(6500).unwrap()),
            250,
            50,
        );

        let report = light.fade(spec).await.unwrap().wait().await;

        assert_eq!(report.steps, 5);
        assert_eq!(report.sent, 5);
        assert!(!report.cancelled);
        let temps: Vec<_> = bulb.pilots().await.iter().map(|p| p["temp"].clone()).collect();
        assert_eq!(temps, vec![json!(3460), json!(4220), json!(4980), json!(5740), json!(6500)]);
        assert_eq!(light.state().await.temperature().unwrap().kelvin(), 6500);
    }

    #[tokio::test]
    async fn test_fade_skips_failed_step() {
        // The second datagram goes unanswered and times out.
        let bulb = FakeBulb::dropping(vec![1]).await;
        let light = light_for(&bulb);
        let spec = FadeSpec::new(
            LightState::default().with_brightness(Brightness::create(0).unwrap()),
            LightState::default().with_brightness(Brightness::create(90).unwrap()),
            150,
            50,
        );

        let report = light.fade(spec).await.unwrap().wait().await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 2);
        assert_eq!(bulb.pilots().await.len(), 3);
        assert_eq!(light.state().await.brightness.unwrap().value(), 90);
    }

    #[tokio::test]
    async fn test_fade_cancel_stops_scheduling() {
        let bulb = FakeBulb::start().await;
        let light = light_for(&bulb);
        let spec = FadeSpec::new(
            LightState::default().with_brightness(Brightness::create(10).unwrap()),
            LightState::default().with_brightness(Brightness::create(100).unwrap()),
            2000,
            100,
        );

        let handle = light.fade(spec).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        handle.cancel();
        let report = handle.wait().await;

        assert!(report.cancelled);
        assert!(report.sent < report.steps);
        let sent = bulb.pilots().await.len();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(bulb.pilots().await.len(), sent);
    }

    #[tokio::test]
    async fn test_new_fade_cancels_previous() {
        let bulb = FakeBulb::start().await;
        let light = light_for(&bulb);
        let slow = FadeSpec::new(
            LightState::default().with_brightness(Brightness::create(10).unwrap()),
            LightState::default().with_brightness(Brightness::create(100).unwrap()),
            5000,
            100,
        );
        let quick = FadeSpec::new(
            LightState::default().with_color(Color::rgb(0, 0, 0)),
            LightState::default().with_color(Color::rgb(255, 0, 0)),
            100,
            50,
        );

        let first = light.fade(slow).await.unwrap();
        let second = light.fade(quick).await.unwrap();
        assert!(first.is_cancelled());
        assert_ne!(first.id(), second.id());

        assert!(first.wait().await.cancelled);
        let report = second.wait().await;
        assert!(!report.cancelled);
        assert_eq!(light.state().await.color(), Some(Color::rgb(255, 0, 0)));
    }

    #[tokio::test]
    async fn test_fade_rejects_bad_spec_without_io() {
        let bulb = FakeBulb::start().await;
        let light = light_for(&bulb);
        let spec = FadeSpec::new(
            LightState::default(),
            LightState::default().with_temperature(Kelvin::create(7000).unwrap()),
            1000,
            100,
        );

        assert!(light.fade(spec).await.is_err());
        assert!(bulb.received().await.is_empty());
    }
}
