//! Notifications emitted by the simulation for UI collaborators.
//!
//! Every tick produces at most one batch of [`Notification`]s, delivered
//! together with the tick summary. Disease, sickness and death are not
//! errors; they are simulated outcomes reported here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{DiseaseKind, Season, SpecialEventKind, SpeciesId};
use crate::structs::WeatherState;

/// Something noteworthy that happened on the farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "payload", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum FarmEvent {
    /// A disease or pest outbreak hit a crop.
    Disease {
        /// Affected plot.
        plot: usize,
        /// Outbreak variety.
        disease: DiseaseKind,
        /// Health removed.
        damage: f64,
    },
    /// A crop reached its harvestable stage.
    Ready {
        /// Plot holding the crop.
        plot: usize,
        /// Species that ripened.
        species: SpeciesId,
    },
    /// A crop fell sick.
    Sick {
        /// Plot holding the crop.
        plot: usize,
        /// Species that fell sick.
        species: SpeciesId,
    },
    /// A crop died.
    Died {
        /// Plot holding the crop.
        plot: usize,
        /// Species that died.
        species: SpeciesId,
    },
    /// The weather changed.
    WeatherChanged {
        /// The new weather.
        weather: WeatherState,
    },
    /// A new season arrived.
    SeasonChanged {
        /// The season that started.
        season: Season,
    },
    /// A rare farm-wide event happened.
    SpecialEvent {
        /// Which event.
        event: SpecialEventKind,
        /// Coins granted, if any.
        coins: u64,
    },
    /// The farmer reached a new level.
    LevelUp {
        /// Level reached.
        level: u32,
        /// Coins granted for the level.
        reward: u64,
    },
}

/// A [`FarmEvent`] stamped with the tick it happened on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Notification {
    /// Tick the event happened on.
    pub tick: u64,
    /// What happened.
    pub event: FarmEvent,
}
