//! Core entity structs for the Tilth simulation.
//!
//! These are the shapes shared by the simulation core, the observer API
//! and persisted snapshots: plots and the crops they hold, the weather
//! state, care records and harvest results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    ConditionCategory, Grade, GrowthStage, Season, SpeciesId, WeatherKind, WeatherQuality,
};
use crate::ids::PlantId;

/// Clamp a ratio into `[0, 1]`, mapping NaN to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

// ---------------------------------------------------------------------------
// Plots and crops
// ---------------------------------------------------------------------------

/// A single living (or dead) plant occupying a plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CropInstance {
    /// Identifier used to key the plant's care ledger.
    pub plant_id: PlantId,
    /// Species planted.
    pub species: SpeciesId,
    /// Current life-cycle stage.
    pub stage: GrowthStage,
    /// Accumulated growth; never decreases.
    pub growth_progress: f64,
    /// Tick the seed went into the ground.
    pub planted_at_tick: u64,
    /// Health in `[0.1, 1.0]`.
    pub health: f64,
    /// Rotation multiplier granted at planting time.
    pub rotation_bonus: f64,
}

impl CropInstance {
    /// Lowest health a crop can have.
    pub const MIN_HEALTH: f64 = 0.1;
    /// Highest health a crop can have.
    pub const MAX_HEALTH: f64 = 1.0;

    /// A fresh seed at full health.
    pub const fn seed(
        plant_id: PlantId,
        species: SpeciesId,
        planted_at_tick: u64,
        rotation_bonus: f64,
    ) -> Self {
        Self {
            plant_id,
            species,
            stage: GrowthStage::Seed,
            growth_progress: 0.0,
            planted_at_tick,
            health: Self::MAX_HEALTH,
            rotation_bonus,
        }
    }

    /// Clamp a raw health value into the valid range.
    pub fn clamp_health(raw: f64) -> f64 {
        if raw.is_nan() {
            Self::MIN_HEALTH
        } else {
            raw.clamp(Self::MIN_HEALTH, Self::MAX_HEALTH)
        }
    }

    /// Whether the crop can be harvested right now.
    pub fn is_ready(&self) -> bool {
        self.stage == GrowthStage::Ready
    }
}

/// One cell of the farm grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Plot {
    /// Index of the plot in row-major grid order.
    pub id: usize,
    /// Only unlocked plots can hold crops or be worked.
    pub unlocked: bool,
    /// The crop currently growing here, if any.
    pub crop: Option<CropInstance>,
    /// Soil moisture in `[0, 1]`.
    pub water_level: f64,
    /// Whether fertilizer has been applied since the last harvest.
    pub fertilized: bool,
    /// Whether an automatic sprinkler is installed.
    pub has_sprinkler: bool,
    /// Soil pollution in `[0, 1]`.
    pub pollution: f64,
    /// Tick of the most recent watering (manual or automatic).
    pub last_watered_tick: u64,
    /// Species of the last crop harvested here, for rotation.
    pub last_species: Option<SpeciesId>,
}

impl Plot {
    /// Moisture a freshly created plot starts with.
    pub const INITIAL_WATER: f64 = 0.5;

    /// Create an empty plot.
    pub const fn new(id: usize, unlocked: bool) -> Self {
        Self {
            id,
            unlocked,
            crop: None,
            water_level: Self::INITIAL_WATER,
            fertilized: false,
            has_sprinkler: false,
            pollution: 0.0,
            last_watered_tick: 0,
            last_species: None,
        }
    }

    /// Add (or with a negative delta, remove) water, keeping the level in
    /// `[0, 1]`.
    pub fn add_water(&mut self, delta: f64) {
        self.water_level = clamp_unit(self.water_level + delta);
    }

    /// Add (or remove) pollution, keeping the level in `[0, 1]`.
    pub fn add_pollution(&mut self, delta: f64) {
        self.pollution = clamp_unit(self.pollution + delta);
    }

    /// Whether the plot is unlocked and empty.
    pub const fn is_free(&self) -> bool {
        self.unlocked && self.crop.is_none()
    }
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Modifiers a weather kind applies to growth and watering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WeatherEffects {
    /// Multiplier on per-tick growth.
    pub growth_multiplier: f64,
    /// Water removed from an occupied plot each tick.
    pub water_evaporation: f64,
    /// Whether the weather waters every unlocked plot.
    pub auto_water: bool,
}

/// The weather over the farm between two transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WeatherState {
    /// Weather kind.
    pub kind: WeatherKind,
    /// Season when this state was generated.
    pub season: Season,
    /// Temperature in degrees Celsius.
    pub temperature: i32,
    /// Relative humidity in percent.
    pub humidity: u32,
    /// Growth and watering modifiers.
    pub effects: WeatherEffects,
}

impl WeatherState {
    /// Above this temperature the day counts as hot.
    pub const HOT_ABOVE: i32 = 30;
    /// Below this temperature the day counts as cold.
    pub const COLD_BELOW: i32 = 10;

    /// Classify the weather for the care ledger.
    pub const fn quality(&self) -> WeatherQuality {
        let hot = self.temperature > Self::HOT_ABOVE;
        let cold = self.temperature < Self::COLD_BELOW;
        match self.kind {
            WeatherKind::Rainy => WeatherQuality::Wet,
            WeatherKind::Stormy | WeatherKind::Snow | WeatherKind::Drought => {
                WeatherQuality::Harsh
            }
            WeatherKind::Sunny if hot => WeatherQuality::Harsh,
            WeatherKind::Sunny | WeatherKind::Cloudy if cold => WeatherQuality::Harsh,
            WeatherKind::Sunny | WeatherKind::Cloudy => WeatherQuality::Ideal,
        }
    }
}

/// Current conditions reported by an external weather provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ObservedWeather {
    /// Primary condition category.
    pub condition: ConditionCategory,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}

// ---------------------------------------------------------------------------
// Care and harvest
// ---------------------------------------------------------------------------

/// One day of a plant's care ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CareRecord {
    /// Calendar day.
    pub date: NaiveDate,
    /// Whether the plant was watered at any point that day.
    pub watered: bool,
    /// The most recent weather classification observed that day.
    pub weather_quality: WeatherQuality,
}

/// Outcome of a successful harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HarvestResult {
    /// Plot the crop was taken from.
    pub plot: usize,
    /// Identifier of the harvested plant.
    pub plant_id: PlantId,
    /// Species harvested.
    pub species: SpeciesId,
    /// Units of produce.
    pub quantity: u32,
    /// Coins earned.
    pub earnings: u64,
    /// Experience earned.
    pub experience: u32,
    /// Care grade, present in care-grade mode.
    pub grade: Option<Grade>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather(kind: WeatherKind, temperature: i32) -> WeatherState {
        WeatherState {
            kind,
            season: Season::Spring,
            temperature,
            humidity: 50,
            effects: WeatherEffects {
                growth_multiplier: 1.0,
                water_evaporation: 0.1,
                auto_water: false,
            },
        }
    }

    #[test]
    fn water_is_clamped() {
        let mut plot = Plot::new(0, true);
        plot.add_water(5.0);
        assert!((plot.water_level - 1.0).abs() < f64::EPSILON);
        plot.add_water(-5.0);
        assert!(plot.water_level.abs() < f64::EPSILON);
    }

    #[test]
    fn health_clamp_handles_nan() {
        assert!((CropInstance::clamp_health(f64::NAN) - CropInstance::MIN_HEALTH).abs() < f64::EPSILON);
        assert!((CropInstance::clamp_health(3.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weather_quality_classification() {
        assert_eq!(weather(WeatherKind::Sunny, 22).quality(), WeatherQuality::Ideal);
        assert_eq!(weather(WeatherKind::Cloudy, 18).quality(), WeatherQuality::Ideal);
        assert_eq!(weather(WeatherKind::Rainy, 18).quality(), WeatherQuality::Wet);
        assert_eq!(weather(WeatherKind::Sunny, 33).quality(), WeatherQuality::Harsh);
        assert_eq!(weather(WeatherKind::Cloudy, 3).quality(), WeatherQuality::Harsh);
        assert_eq!(weather(WeatherKind::Stormy, 20).quality(), WeatherQuality::Harsh);
        assert_eq!(weather(WeatherKind::Drought, 20).quality(), WeatherQuality::Harsh);
    }
}
