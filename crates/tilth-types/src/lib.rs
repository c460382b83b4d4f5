//! Shared type definitions for the Tilth farming simulation.
//!
//! This crate is the single source of truth for the data model used across
//! the Tilth workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for a browser front end.
//!
//! # Modules
//!
//! - [`ids`] -- Counter-backed identifier wrappers
//! - [`enums`] -- Seasons, weather, species, growth stages, grades, rejections
//! - [`structs`] -- Plots, crops, weather state, care records, harvest results
//! - [`events`] -- Notifications emitted once per tick

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    ActionRejection, ConditionCategory, CropFamily, DiseaseKind, Grade, GrowthStage, HarvestMode,
    Season, SpecialEventKind, SpeciesId, StageSkin, StageTopology, WeatherKind, WeatherQuality,
};
pub use events::{FarmEvent, Notification};
pub use ids::{CommandId, PlantId};
pub use structs::{
    CareRecord, CropInstance, HarvestResult, ObservedWeather, Plot, WeatherEffects, WeatherState,
    clamp_unit,
};
