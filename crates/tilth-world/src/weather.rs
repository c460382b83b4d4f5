//! The weather engine: season-weighted transitions, forced special weather
//! and forecasts.
//!
//! # Transitions
//!
//! Weather holds for a fixed number of ticks, then a new kind is drawn from
//! the current season's weight table:
//!
//! | Weather | Spring | Summer | Fall | Winter |
//! |---------|--------|--------|------|--------|
//! | Sunny   | 40     | 60     | 30   | 20     |
//! | Rainy   | 35     | 10     | 30   | 20     |
//! | Cloudy  | 20     | 25     | 30   | 50     |
//! | Stormy  | 5      | 5      | 10   | 10     |
//!
//! Snow and Drought are never drawn. Snow arrives through an external
//! observation and Drought only as forced weather.
//!
//! Temperature and humidity are then derived from the season's base range,
//! a per-kind modifier and bounded jitter, and clamped to a global range.
//! The resulting [`WeatherState`] is immutable until the next transition.
//!
//! # Observed weather
//!
//! When an external observation is available at a transition boundary it
//! replaces the stochastic draw for that cycle.
//!
//! # Determinism
//!
//! All randomness comes from the caller-supplied RNG. The engine keeps no
//! RNG state of its own, so its serialized [`WeatherSchedule`] plus the
//! caller's seed fully determine future weather.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tilth_types::{ObservedWeather, Season, WeatherEffects, WeatherKind, WeatherState};
use tracing::debug;

use crate::error::WorldError;
use crate::provider::kind_for_condition;

/// Lowest temperature the engine will ever report.
pub const MIN_TEMPERATURE: i32 = -10;
/// Highest temperature the engine will ever report.
pub const MAX_TEMPERATURE: i32 = 40;
/// Lowest humidity the engine will ever report.
pub const MIN_HUMIDITY: u32 = 20;
/// Highest humidity the engine will ever report.
pub const MAX_HUMIDITY: u32 = 100;

/// Temperature jitter applied around the season midpoint.
const TEMPERATURE_JITTER: f64 = 5.0;
/// Humidity jitter applied around the kind's base humidity.
const HUMIDITY_JITTER: f64 = 10.0;

/// Growth and watering modifiers for a weather kind.
pub const fn effects_for(kind: WeatherKind) -> WeatherEffects {
    let (growth_multiplier, water_evaporation, auto_water) = match kind {
        WeatherKind::Sunny => (1.0, 0.15, false),
        WeatherKind::Rainy => (1.2, 0.05, true),
        WeatherKind::Cloudy => (0.9, 0.1, false),
        WeatherKind::Stormy => (0.7, 0.05, true),
        WeatherKind::Snow => (0.5, 0.02, false),
        WeatherKind::Drought => (0.8, 0.25, false),
    };
    WeatherEffects {
        growth_multiplier,
        water_evaporation,
        auto_water,
    }
}

/// Season-dependent multipliers applied outside the growth model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalEffects {
    /// Multiplier on harvest quantity.
    pub harvest_bonus: f64,
    /// Multiplier on sell price.
    pub sell_price_bonus: f64,
    /// Multiplier on experience earned.
    pub experience_bonus: f64,
}

impl SeasonalEffects {
    /// No bonuses at all.
    pub const NEUTRAL: Self = Self {
        harvest_bonus: 1.0,
        sell_price_bonus: 1.0,
        experience_bonus: 1.0,
    };

    /// The bonuses a season grants.
    pub const fn for_season(season: Season) -> Self {
        match season {
            Season::Spring => Self {
                experience_bonus: 1.05,
                ..Self::NEUTRAL
            },
            Season::Summer => Self {
                harvest_bonus: 1.1,
                ..Self::NEUTRAL
            },
            Season::Fall => Self {
                sell_price_bonus: 1.15,
                ..Self::NEUTRAL
            },
            Season::Winter => Self::NEUTRAL,
        }
    }
}

/// Seasonal transition weights, out of 100.
#[derive(Debug, Clone)]
pub struct SeasonWeights {
    entries: [(WeatherKind, u32); 6],
}

impl SeasonWeights {
    /// Return the weather weights for the given season.
    pub const fn for_season(season: Season) -> Self {
        let entries = match season {
            Season::Spring => [
                (WeatherKind::Sunny, 40),
                (WeatherKind::Rainy, 35),
                (WeatherKind::Cloudy, 20),
                (WeatherKind::Stormy, 5),
                (WeatherKind::Snow, 0),
                (WeatherKind::Drought, 0),
            ],
            Season::Summer => [
                (WeatherKind::Sunny, 60),
                (WeatherKind::Rainy, 10),
                (WeatherKind::Cloudy, 25),
                (WeatherKind::Stormy, 5),
                (WeatherKind::Snow, 0),
                (WeatherKind::Drought, 0),
            ],
            Season::Fall => [
                (WeatherKind::Sunny, 30),
                (WeatherKind::Rainy, 30),
                (WeatherKind::Cloudy, 30),
                (WeatherKind::Stormy, 10),
                (WeatherKind::Snow, 0),
                (WeatherKind::Drought, 0),
            ],
            Season::Winter => [
                (WeatherKind::Sunny, 20),
                (WeatherKind::Rainy, 20),
                (WeatherKind::Cloudy, 50),
                (WeatherKind::Stormy, 10),
                (WeatherKind::Snow, 0),
                (WeatherKind::Drought, 0),
            ],
        };
        Self { entries }
    }

    /// Weight assigned to a kind.
    pub fn weight(&self, kind: WeatherKind) -> u32 {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |&(_, w)| w)
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0_u32, |acc, &(_, w)| acc.saturating_add(w))
    }

    /// Select a kind given a roll in `[0, total_weight())`.
    fn select(&self, roll: u32) -> WeatherKind {
        let mut cumulative: u32 = 0;
        for &(kind, weight) in &self.entries {
            cumulative = cumulative.saturating_add(weight);
            if roll < cumulative {
                return kind;
            }
        }
        WeatherKind::Cloudy
    }

    /// Draw a kind.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> WeatherKind {
        let total = self.total_weight();
        if total == 0 {
            return WeatherKind::Cloudy;
        }
        self.select(rng.random_range(0..total))
    }
}

/// Season temperature range `(min, max)` in degrees Celsius.
const fn season_temperature_range(season: Season) -> (f64, f64) {
    match season {
        Season::Spring => (15.0, 25.0),
        Season::Summer => (20.0, 35.0),
        Season::Fall => (10.0, 20.0),
        Season::Winter => (-5.0, 10.0),
    }
}

/// Per-kind `(temperature modifier, base humidity)`.
const fn kind_climate(kind: WeatherKind) -> (f64, f64) {
    match kind {
        WeatherKind::Sunny => (5.0, 45.0),
        WeatherKind::Rainy => (-3.0, 85.0),
        WeatherKind::Cloudy => (0.0, 65.0),
        WeatherKind::Stormy => (-5.0, 90.0),
        WeatherKind::Snow => (-8.0, 80.0),
        WeatherKind::Drought => (8.0, 25.0),
    }
}

/// Round and clamp a temperature into the reportable range.
#[allow(clippy::cast_possible_truncation)]
fn clamp_temperature(raw: f64) -> i32 {
    if raw.is_nan() {
        return 0;
    }
    // Clamped to [-10, 40] first, so the cast cannot truncate.
    raw.round()
        .clamp(f64::from(MIN_TEMPERATURE), f64::from(MAX_TEMPERATURE)) as i32
}

/// Round and clamp a humidity into the reportable range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_humidity(raw: f64) -> u32 {
    if raw.is_nan() {
        return MIN_HUMIDITY;
    }
    // Clamped to [20, 100] first, so the cast is lossless.
    raw.round()
        .clamp(f64::from(MIN_HUMIDITY), f64::from(MAX_HUMIDITY)) as u32
}

/// Generate a full weather state for a kind and season.
pub fn generate_state<R: Rng>(kind: WeatherKind, season: Season, rng: &mut R) -> WeatherState {
    let (low, high) = season_temperature_range(season);
    let (modifier, base_humidity) = kind_climate(kind);
    let midpoint = (low + high) / 2.0;
    let temperature = midpoint + modifier + rng.random_range(-TEMPERATURE_JITTER..=TEMPERATURE_JITTER);
    let humidity = base_humidity + rng.random_range(-HUMIDITY_JITTER..=HUMIDITY_JITTER);
    WeatherState {
        kind,
        season,
        temperature: clamp_temperature(temperature),
        humidity: clamp_humidity(humidity),
        effects: effects_for(kind),
    }
}

/// Build a weather state from an external observation.
pub fn observed_state(observation: &ObservedWeather, season: Season) -> WeatherState {
    let kind = kind_for_condition(observation.condition);
    WeatherState {
        kind,
        season,
        temperature: clamp_temperature(observation.temperature),
        humidity: clamp_humidity(observation.humidity),
        effects: effects_for(kind),
    }
}

/// Special weather installed by a game event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedWeather {
    /// The forced kind.
    pub kind: WeatherKind,
    /// Tick at which normal transitions resume.
    pub until_tick: u64,
}

/// The persistent part of the weather engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSchedule {
    /// Weather currently in effect.
    pub current: WeatherState,
    /// Tick of the most recent transition.
    pub last_change_tick: u64,
    /// Special weather overriding the cadence, if any.
    pub forced: Option<ForcedWeather>,
}

/// A predicted future weather transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Tick the transition is expected on.
    pub tick: u64,
    /// Predicted kind.
    pub kind: WeatherKind,
}

/// Owns the current weather and decides when it changes.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherEngine {
    change_interval: u64,
    schedule: WeatherSchedule,
}

impl WeatherEngine {
    /// Create an engine that starts on a sunny day.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidWeatherInterval`] if `change_interval`
    /// is zero.
    pub fn new<R: Rng>(
        change_interval: u64,
        season: Season,
        rng: &mut R,
    ) -> Result<Self, WorldError> {
        if change_interval == 0 {
            return Err(WorldError::InvalidWeatherInterval);
        }
        Ok(Self {
            change_interval,
            schedule: WeatherSchedule {
                current: generate_state(WeatherKind::Sunny, season, rng),
                last_change_tick: 0,
                forced: None,
            },
        })
    }

    /// Restore an engine from a saved schedule.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidWeatherInterval`] if `change_interval`
    /// is zero.
    pub fn from_schedule(
        change_interval: u64,
        schedule: WeatherSchedule,
    ) -> Result<Self, WorldError> {
        if change_interval == 0 {
            return Err(WorldError::InvalidWeatherInterval);
        }
        Ok(Self {
            change_interval,
            schedule,
        })
    }

    /// The weather currently in effect.
    pub const fn current(&self) -> &WeatherState {
        &self.schedule.current
    }

    /// The persistent schedule, for snapshots.
    pub const fn schedule(&self) -> &WeatherSchedule {
        &self.schedule
    }

    /// Forced weather currently overriding the cadence.
    pub const fn forced(&self) -> Option<ForcedWeather> {
        self.schedule.forced
    }

    /// Tick on which the next transition happens.
    pub const fn next_transition_tick(&self) -> u64 {
        match self.schedule.forced {
            Some(forced) => forced.until_tick,
            None => self
                .schedule
                .last_change_tick
                .saturating_add(self.change_interval),
        }
    }

    /// Whether a transition happens at `tick`.
    pub const fn is_transition_due(&self, tick: u64) -> bool {
        tick >= self.next_transition_tick()
    }

    /// Advance to `tick`, transitioning if one is due.
    ///
    /// `observed` is only consulted when a transition actually happens; an
    /// observation replaces the stochastic draw for that cycle. Returns the
    /// new state on transition.
    pub fn advance<R, F>(
        &mut self,
        tick: u64,
        season: Season,
        observed: F,
        rng: &mut R,
    ) -> Option<&WeatherState>
    where
        R: Rng,
        F: FnOnce() -> Option<ObservedWeather>,
    {
        if !self.is_transition_due(tick) {
            return None;
        }
        let next = match observed() {
            Some(observation) => observed_state(&observation, season),
            None => {
                let kind = SeasonWeights::for_season(season).draw(rng);
                generate_state(kind, season, rng)
            }
        };
        debug!(
            tick,
            kind = ?next.kind,
            temperature = next.temperature,
            humidity = next.humidity,
            "weather transition"
        );
        self.schedule = WeatherSchedule {
            current: next,
            last_change_tick: tick,
            forced: None,
        };
        Some(&self.schedule.current)
    }

    /// Install special weather immediately for `duration` ticks.
    ///
    /// `first_tick` is the first tick whose plots see the forced weather.
    /// It stays in effect through `first_tick + duration - 1` and normal
    /// transitions resume at `first_tick + duration`.
    pub fn force<R: Rng>(
        &mut self,
        kind: WeatherKind,
        season: Season,
        first_tick: u64,
        duration: u64,
        rng: &mut R,
    ) -> &WeatherState {
        let until_tick = first_tick.saturating_add(duration.max(1));
        self.schedule = WeatherSchedule {
            current: generate_state(kind, season, rng),
            // Installed at the end of the previous tick.
            last_change_tick: first_tick.saturating_sub(1),
            forced: Some(ForcedWeather { kind, until_tick }),
        };
        debug!(first_tick, ?kind, until_tick, "special weather forced");
        &self.schedule.current
    }

    /// Predict the next `count` transitions without touching engine state.
    ///
    /// `season_at` maps a tick to its season; `rng` should be a fork so
    /// the real sequence is unaffected.
    pub fn forecast<R, S>(&self, count: usize, season_at: S, rng: &mut R) -> Vec<ForecastEntry>
    where
        R: Rng,
        S: Fn(u64) -> Season,
    {
        let mut entries = Vec::with_capacity(count);
        let mut tick = self.next_transition_tick();
        for _ in 0..count {
            let kind = SeasonWeights::for_season(season_at(tick)).draw(rng);
            entries.push(ForecastEntry { tick, kind });
            tick = tick.saturating_add(self.change_interval);
        }
        entries
    }
}
