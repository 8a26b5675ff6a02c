//! Timed transitions between two light states.
//!
//! A fade is planned up front as `ceil(duration / tick)` intermediate states
//! and then played back on a background task, one `setPilot` per tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info, warn};
use uuid::Uuid;

use crate::errors::Error;
use crate::light::Light;
use crate::payload::Pilot;
use crate::runtime::{self, Instant, JoinHandle};
use crate::status::{LightState, Tone};
use crate::types::{Brightness, Color, Kelvin};

type Result<T> = std::result::Result<T, Error>;

/// Start, end and timing of a fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSpec {
    pub start: LightState,
    pub end: LightState,
    pub duration_ms: u64,
    pub tick_ms: u64,
}

impl FadeSpec {
    /// Largest fade [`plan`] will materialize. Running a fade has no such
    /// limit since its steps are computed one at a time.
    pub const MAX_PLAN_STEPS: u64 = 1 << 16;

    pub fn new(start: LightState, end: LightState, duration_ms: u64, tick_ms: u64) -> Self {
        FadeSpec {
            start,
            end,
            duration_ms,
            tick_ms,
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Number of commands the fade emits.
    pub fn steps(&self) -> Result<u64> {
        if self.tick_ms == 0 {
            return Err(Error::invalid_parameter("tick_ms", 0, "must be positive"));
        }
        if self.tick_ms > self.duration_ms {
            return Err(Error::invalid_parameter(
                "tick_ms",
                self.tick_ms,
                format!("exceeds the duration of {}ms", self.duration_ms),
            ));
        }
        Ok(self.duration_ms.div_ceil(self.tick_ms))
    }

    /// Step count of a fade that can actually run.
    pub(crate) fn validate(&self) -> Result<u64> {
        if self.end == LightState::default() {
            return Err(Error::invalid_parameter("end", "{}", "no attributes set"));
        }
        self.steps()
    }

    /// State sent at step `i` of `n` (1-based). Step `n` is `end` exactly.
    pub fn step(&self, i: u64, n: u64) -> LightState {
        if i >= n {
            self.end
        } else {
            interpolate(&self.start, &self.end, i, n)
        }
    }

    /// How long after the fade starts step `i` is due.
    fn due(&self, i: u64) -> Duration {
        Duration::from_millis(self.tick_ms.saturating_mul(i))
    }

    /// The state to send at each tick, last one equal to `end`.
    pub fn plan(&self) -> Result<Vec<LightState>> {
        plan(&self.start, &self.end, self.duration_ms, self.tick_ms)
    }
}

/// Interpolate from `start` to `end` in `ceil(duration_ms / tick_ms)` steps.
///
/// Step `i` holds `start + (end - start) * i / N` per channel, rounded to the
/// nearest value the channel accepts. The last step is `end` exactly. A
/// channel unknown in `start` holds `end`'s value throughout, and a channel
/// absent from `end` is left out of every step. Plans longer than
/// [`FadeSpec::MAX_PLAN_STEPS`] are rejected.
///
/// ```
/// use wiz_controller::{Kelvin, LightState, plan};
///
/// let start = LightState::default().with_temperature(Kelvin::create(2700).unwrap());
/// let end = LightState::default().with_temperature(Kelvin::create(6500).unwrap());
/// let temps: Vec<u16> = plan(&start, &end, 1000, 200)
///     .unwrap()
///     .iter()
///     .map(|s| s.temperature().unwrap().kelvin())
///     .collect();
/// assert_eq!(temps, vec![3460, 4220, 4980, 5740, 6500]);
/// ```
pub fn plan(
    start: &LightState,
    end: &LightState,
    duration_ms: u64,
    tick_ms: u64,
) -> Result<Vec<LightState>> {
    let spec = FadeSpec::new(*start, *end, duration_ms, tick_ms);
    let n = spec.validate()?;
    if n > FadeSpec::MAX_PLAN_STEPS {
        return Err(Error::invalid_parameter(
            "tick_ms",
            tick_ms,
            format!("{n} steps exceed the plan limit of {}", FadeSpec::MAX_PLAN_STEPS),
        ));
    }
    Ok((1..=n).map(|i| spec.step(i, n)).collect())
}

fn interpolate(start: &LightState, end: &LightState, i: u64, n: u64) -> LightState {
    let at = |from: f64, to: f64| (from + (to - from) * i as f64 / n as f64).round() as i64;

    let brightness = end.brightness.map(|to| {
        let from = start.brightness.unwrap_or(to);
        Brightness::clamped(at(from.value().into(), to.value().into()))
    });

    let tone = end.tone.map(|to| match to {
        Tone::White { temperature } => {
            let from = start.temperature().unwrap_or(temperature);
            let kelvin = at(from.kelvin().into(), temperature.kelvin().into())
                .clamp(Kelvin::MIN.into(), Kelvin::MAX.into());
            Tone::White {
                temperature: Kelvin {
                    kelvin: kelvin as u16,
                },
            }
        }
        Tone::Rgb(color) => {
            let from = start.color().unwrap_or(color);
            let channel = |a: u8, b: u8| at(a.into(), b.into()).clamp(0, 255) as u8;
            Tone::Rgb(Color::rgb(
                channel(from.red, color.red),
                channel(from.green, color.green),
                channel(from.blue, color.blue),
            ))
        }
    });

    LightState {
        power: end.power,
        brightness,
        tone,
    }
}

/// Cooperative stop signal for a running fade.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a finished or cancelled fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeReport {
    pub id: Uuid,
    /// Steps in the plan.
    pub steps: u64,
    /// Steps the bulb accepted.
    pub sent: u64,
    /// Steps that failed and were skipped.
    pub failed: u64,
    pub cancelled: bool,
}

/// A fade running in the background.
pub struct FadeHandle {
    id: Uuid,
    token: CancellationToken,
    task: JoinHandle<FadeReport>,
}

impl FadeHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stop scheduling further steps. Steps already sent stay applied.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the fade to end.
    pub async fn wait(self) -> FadeReport {
        self.task.await
    }
}

pub(crate) fn spawn(light: Light, spec: FadeSpec, steps: u64, token: CancellationToken) -> FadeHandle {
    let id = Uuid::new_v4();
    let task = runtime::spawn(run(light, id, spec, steps, token.clone()));
    FadeHandle { id, token, task }
}

async fn run(light: Light, id: Uuid, spec: FadeSpec, steps: u64, token: CancellationToken) -> FadeReport {
    let mut report = FadeReport {
        id,
        steps,
        sent: 0,
        failed: 0,
        cancelled: false,
    };
    info!("fade {id} on {}: {steps} steps every {}ms", light.ip(), spec.tick_ms);

    let started = Instant::now();
    for i in 1..=steps {
        // Deadlines are absolute, so lateness on one step does not push back
        // the ones after it.
        if let Some(wait) = spec.due(i).checked_sub(started.elapsed()) {
            if token.is_cancelled() {
                report.cancelled = true;
                break;
            }
            runtime::sleep(wait).await;
        }
        if token.is_cancelled() {
            report.cancelled = true;
            break;
        }

        match light.send_pilot(Pilot::from(&spec.step(i, steps))).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                report.failed += 1;
                warn!("fade {id} step {i}/{steps} skipped: {e}");
            }
        }
    }

    if report.cancelled {
        info!("fade {id} cancelled after {} of {steps} steps", report.sent + report.failed);
    } else {
        debug!("fade {id} done in {}ms", started.elapsed().as_millis());
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(kelvin: u16) -> LightState {
        LightState::default().with_temperature(Kelvin::create(kelvin).unwrap())
    }

    #[test]
    fn test_step_count_is_ceiling() {
        for (duration, tick, expected) in [(1000, 200, 5), (1000, 300, 4), (1500, 1500, 1), (901, 100, 10)] {
            let steps = plan(&white(2200), &white(6500), duration, tick).unwrap();
            assert_eq!(steps.len(), expected, "{duration}/{tick}");
        }
    }

    #[test]
    fn test_last_step_is_exact_end() {
        let start = LightState::default()
            .with_brightness(Brightness::create(13).unwrap())
            .with_color(Color::rgb(1, 2, 3));
        let end = LightState::default()
            .with_power(true)
            .with_brightness(Brightness::create(97).unwrap())
            .with_color(Color::rgb(254, 120, 41));
        for (duration, tick) in [(1000, 300), (1000, 7), (10, 3)] {
            let steps = plan(&start, &end, duration, tick).unwrap();
            assert_eq!(*steps.last().unwrap(), end);
        }
    }

    #[test]
    fn test_rgb_and_brightness_interpolate() {
        let start = LightState::default()
            .with_brightness(Brightness::create(10).unwrap())
            .with_color(Color::rgb(0, 0, 0));
        let end = LightState::default()
            .with_brightness(Brightness::create(100).unwrap())
            .with_color(Color::rgb(255, 120, 40));

        let steps = plan(&start, &end, 400, 100).unwrap();
        let mid = steps[1];
        assert_eq!(mid.brightness.unwrap().value(), 55);
        assert_eq!(mid.color(), Some(Color::rgb(128, 60, 20)));
    }

    #[test]
    fn test_unknown_start_channel_jumps_to_end() {
        let start = white(2700);
        let end = LightState::default()
            .with_brightness(Brightness::create(80).unwrap())
            .with_color(Color::rgb(0, 180, 80));

        for step in plan(&start, &end, 300, 100).unwrap() {
            assert_eq!(step.color(), Some(Color::rgb(0, 180, 80)));
            assert_eq!(step.brightness.unwrap().value(), 80);
        }
    }

    #[test]
    fn test_absent_end_channel_not_sent() {
        let start = white(2700).with_brightness(Brightness::create(20).unwrap());
        let steps = plan(&start, &white(4000), 200, 100).unwrap();
        assert!(steps.iter().all(|s| s.brightness.is_none()));
    }

    #[test]
    fn test_invalid_timing_rejected() {
        assert!(matches!(
            plan(&white(2700), &white(6500), 1000, 0),
            Err(Error::InvalidParameter { name: "tick_ms", .. })
        ));
        assert!(matches!(
            plan(&white(2700), &white(6500), 100, 200),
            Err(Error::InvalidParameter { name: "tick_ms", .. })
        ));
        assert!(matches!(
            plan(&white(2700), &LightState::default(), 1000, 100),
            Err(Error::InvalidParameter { name: "end", .. })
        ));
    }

    #[test]
    fn test_oversized_plan_rejected() {
        let start = LightState::default().with_brightness(Brightness::create(0).unwrap());
        let end = LightState::default().with_brightness(Brightness::create(100).unwrap());
        assert!(matches!(
            plan(&start, &end, u64::MAX, 1),
            Err(Error::InvalidParameter { name: "tick_ms", .. })
        ));
        let limit = FadeSpec::MAX_PLAN_STEPS;
        assert_eq!(plan(&start, &end, limit, 1).unwrap().len() as u64, limit);
    }

    #[test]
    fn test_steps_computed_on_demand() {
        let spec = FadeSpec::new(
            LightState::default().with_brightness(Brightness::create(0).unwrap()),
            LightState::default().with_brightness(Brightness::create(100).unwrap()),
            u64::MAX,
            1,
        );
        let n = spec.steps().unwrap();
        assert_eq!(n, u64::MAX);
        assert_eq!(spec.step(n / 2, n).brightness.unwrap().value(), 50);
        assert_eq!(spec.step(n, n), spec.end);
        assert_eq!(spec.due(n), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_token_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
