//! Disease and pest outbreaks.
//!
//! Every occupied plot with a living crop rolls once per tick, whatever its
//! stage. The chance starts at a small base and is multiplied, in order, by
//! a water-level penalty, a low-health penalty, a storm penalty and a
//! humidity penalty. An outbreak removes a random 0.2 to 0.5 health.

use rand::Rng;
use tilth_types::{CropInstance, DiseaseKind, Plot, WeatherKind, WeatherState};

/// Chance of an outbreak under ideal conditions.
pub const BASE_CHANCE: f64 = 0.001;
/// Multiplier when the soil is too dry or too wet.
pub const WATER_PENALTY: f64 = 3.0;
/// Multiplier for weakened crops.
pub const HEALTH_PENALTY: f64 = 2.0;
/// Multiplier during storms.
pub const STORM_PENALTY: f64 = 2.0;
/// Multiplier for muggy air.
pub const HUMIDITY_PENALTY: f64 = 1.5;
/// Water level below which the soil counts as too dry.
pub const DRY_BELOW: f64 = 0.2;
/// Water level above which the soil counts as waterlogged.
pub const WET_ABOVE: f64 = 0.9;
/// Health below which the crop counts as weakened.
pub const WEAK_BELOW: f64 = 0.5;
/// Humidity above which the air counts as muggy.
pub const MUGGY_ABOVE: u32 = 80;
/// Smallest health loss from an outbreak.
pub const MIN_DAMAGE: f64 = 0.2;
/// Largest health loss from an outbreak.
pub const MAX_DAMAGE: f64 = 0.5;

/// An outbreak that hit a crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outbreak {
    /// Variety of outbreak.
    pub kind: DiseaseKind,
    /// Health removed before clamping.
    pub damage: f64,
}

/// Probability of an outbreak this tick.
///
/// Multipliers are applied in order: water level, health, storm, humidity.
pub fn disease_chance(water_level: f64, health: f64, weather: &WeatherState) -> f64 {
    let mut chance = BASE_CHANCE;
    if !(DRY_BELOW..=WET_ABOVE).contains(&water_level) {
        chance *= WATER_PENALTY;
    }
    if health < WEAK_BELOW {
        chance *= HEALTH_PENALTY;
    }
    if weather.kind == WeatherKind::Stormy {
        chance *= STORM_PENALTY;
    }
    if weather.humidity > MUGGY_ABOVE {
        chance *= HUMIDITY_PENALTY;
    }
    chance.min(1.0)
}

/// Roll for an outbreak on the plot's crop and apply its damage.
///
/// Empty plots and dead crops never roll.
pub fn check<R: Rng>(plot: &mut Plot, weather: &WeatherState, rng: &mut R) -> Option<Outbreak> {
    let water_level = plot.water_level;
    let crop = plot.crop.as_mut()?;
    if !crop.stage.is_alive() {
        return None;
    }
    let chance = disease_chance(water_level, crop.health, weather);
    if rng.random::<f64>() >= chance {
        return None;
    }
    let damage = rng.random_range(MIN_DAMAGE..=MAX_DAMAGE);
    let kind = if rng.random_bool(0.5) {
        DiseaseKind::Blight
    } else {
        DiseaseKind::Pests
    };
    crop.health = CropInstance::clamp_health(crop.health - damage);
    Some(Outbreak { kind, damage })
}
