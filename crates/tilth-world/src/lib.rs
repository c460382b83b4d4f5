//! Plots, species, weather and crop growth for the Tilth farming simulation.
//!
//! This crate models the physical farm. Nothing in it knows about coins,
//! grades or the scheduler; those live in `tilth-economy` and `tilth-core`.
//!
//! # Modules
//!
//! - [`species`] -- Strongly-typed per-species stats and companion rules.
//! - [`weather`] -- The weather engine: season-weighted transitions, forced
//!   special weather, forecasts and seasonal effects.
//! - [`growth`] -- The per-crop growth state machine.
//! - [`disease`] -- Per-plot disease and pest outbreaks.
//! - [`plots`] -- The farm grid and the player actions on it.
//! - [`provider`] -- Mapping from external provider labels to weather kinds.
//! - [`error`] -- Construction and restore errors.

pub mod disease;
pub mod error;
pub mod growth;
pub mod plots;
pub mod provider;
pub mod species;
pub mod weather;

// Re-export primary types at crate root.
pub use disease::{Outbreak, disease_chance};
pub use error::WorldError;
pub use growth::{GrowthOutcome, stage_for_progress};
pub use plots::{FarmSupplies, PlotStore};
pub use provider::{kind_for_condition, parse_condition};
pub use species::{COMPANION_BONUS_CAP, CompanionRule, SpeciesStats, SpeciesTable};
pub use weather::{
    ForcedWeather, ForecastEntry, SeasonalEffects, WeatherEngine, WeatherSchedule, effects_for,
};
