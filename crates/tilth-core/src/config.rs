//! Configuration loading and typed config structures for the Tilth farm.
//!
//! The canonical configuration lives in `tilth-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads, overrides from the
//! environment, and validates the file.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tilth_types::{HarvestMode, SpeciesId, StageTopology};
use tilth_world::{SpeciesTable, WorldError};
use tracing::warn;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Parse {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its permitted range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },

    /// The species table failed validation after overrides.
    #[error("invalid species table: {source}")]
    Species {
        /// The underlying validation error.
        #[from]
        source: WorldError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Parse { source }
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `tilth-config.yaml`. Every field has a default,
/// so an empty file yields the default farm.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, tick cadence).
    #[serde(default)]
    pub world: WorldConfig,

    /// Calendar settings.
    #[serde(default)]
    pub time: TimeConfig,

    /// Weather cadence and external provider.
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Grid and starting resources.
    #[serde(default)]
    pub farm: FarmConfig,

    /// Prices and auto-watering amounts.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Per-species stat overrides.
    #[serde(default)]
    pub species: BTreeMap<SpeciesId, SpeciesOverride>,

    /// Run boundaries.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Observer API settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Snapshot persistence settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `TILTH_WEATHER_API_KEY` overrides `weather.provider.api_key`
    /// - `TILTH_WEATHER_CITY` overrides `weather.provider.city`
    /// - `TILTH_OBSERVER_PORT` overrides `observer.port`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment overrides
    /// and validate.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override provider and observer settings from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TILTH_WEATHER_API_KEY") {
            self.weather.provider.api_key = val;
        }
        if let Ok(val) = std::env::var("TILTH_WEATHER_CITY") {
            self.weather.provider.city = val;
        }
        if let Ok(val) = std::env::var("TILTH_OBSERVER_PORT") {
            match val.parse() {
                Ok(port) => self.observer.port = port,
                Err(_) => warn!(value = %val, "ignoring unparseable TILTH_OBSERVER_PORT"),
            }
        }
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time.ticks_per_day == 0 || self.time.ticks_per_season == 0 {
            return Err(invalid("ticks_per_day and ticks_per_season must be at least 1"));
        }
        if self.weather.change_interval_ticks == 0 {
            return Err(invalid("weather.change_interval_ticks must be at least 1"));
        }
        if self.world.tick_interval_ms == 0 {
            return Err(invalid("world.tick_interval_ms must be at least 1"));
        }
        let plots = self
            .farm
            .cols
            .checked_mul(self.farm.rows)
            .ok_or_else(|| invalid("farm grid overflows"))?;
        if plots == 0 {
            return Err(invalid("farm grid needs at least one plot"));
        }
        if self.farm.unlocked_plots > plots {
            return Err(invalid("farm.unlocked_plots exceeds the grid size"));
        }
        for (name, value) in [
            ("economy.sprinkler_water", self.economy.sprinkler_water),
            ("economy.rain_water", self.economy.rain_water),
            ("economy.rain_pollution_wash", self.economy.rain_pollution_wash),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    reason: format!("{name} must be within [0, 1], got {value}"),
                });
            }
        }
        self.species_table()?;
        Ok(())
    }

    /// The standard species table with configured overrides applied and
    /// validated.
    pub fn species_table(&self) -> Result<SpeciesTable, ConfigError> {
        let mut table = SpeciesTable::standard();
        for (species, patch) in &self.species {
            let stats = table.get_mut(*species);
            if let Some(v) = patch.growth_time {
                stats.growth_time = v;
            }
            if let Some(v) = patch.base_yield {
                stats.base_yield = v;
            }
            if let Some(v) = patch.seed_cost {
                stats.seed_cost = v;
            }
            if let Some(v) = patch.sell_price {
                stats.sell_price = v;
            }
            if let Some(v) = patch.water_need {
                stats.water_need = v;
            }
            if let Some(v) = patch.topology {
                stats.topology = v;
            }
        }
        table.validate()?;
        Ok(table)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable farm name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Calendar configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// Number of ticks in one season.
    #[serde(default = "default_ticks_per_season")]
    pub ticks_per_season: u64,

    /// Number of ticks in one calendar day (care records are daily).
    #[serde(default = "default_ticks_per_day")]
    pub ticks_per_day: u64,

    /// Calendar date of tick 0.
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            ticks_per_season: default_ticks_per_season(),
            ticks_per_day: default_ticks_per_day(),
            start_date: default_start_date(),
        }
    }
}

/// Weather cadence and provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeatherConfig {
    /// Ticks between ordinary weather transitions.
    #[serde(default = "default_change_interval_ticks")]
    pub change_interval_ticks: u64,

    /// External current-conditions provider.
    #[serde(default)]
    pub provider: WeatherProviderConfig,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            change_interval_ticks: default_change_interval_ticks(),
            provider: WeatherProviderConfig::default(),
        }
    }
}

/// External weather provider settings.
///
/// The provider is only used when enabled and an API key is present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeatherProviderConfig {
    /// Whether to consult the provider at transition boundaries.
    #[serde(default)]
    pub enabled: bool,

    /// City whose current conditions drive the farm.
    #[serde(default = "default_city")]
    pub city: String,

    /// Provider API key.
    #[serde(default)]
    pub api_key: String,

    /// Current-conditions endpoint.
    #[serde(default = "default_provider_url")]
    pub base_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl WeatherProviderConfig {
    /// Whether requests should actually be issued.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }
}

impl Default for WeatherProviderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            city: default_city(),
            api_key: String::new(),
            base_url: default_provider_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Grid layout and starting resources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FarmConfig {
    /// Grid columns.
    #[serde(default = "default_cols")]
    pub cols: usize,

    /// Grid rows.
    #[serde(default = "default_rows")]
    pub rows: usize,

    /// Plots unlocked at the start, in index order.
    #[serde(default = "default_unlocked_plots")]
    pub unlocked_plots: usize,

    /// How harvests are scored.
    #[serde(default)]
    pub harvest_mode: HarvestMode,

    /// Starting coins.
    #[serde(default = "default_starting_coins")]
    pub starting_coins: u64,

    /// Starting seed packets.
    #[serde(default = "default_starting_seeds")]
    pub starting_seeds: BTreeMap<SpeciesId, u32>,

    /// Starting fertilizer charges.
    #[serde(default)]
    pub starting_fertilizer: u32,

    /// Starting spare sprinklers.
    #[serde(default)]
    pub starting_sprinklers: u32,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            unlocked_plots: default_unlocked_plots(),
            harvest_mode: HarvestMode::default(),
            starting_coins: default_starting_coins(),
            starting_seeds: default_starting_seeds(),
            starting_fertilizer: 0,
            starting_sprinklers: 0,
        }
    }
}

/// Prices and passive watering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EconomyConfig {
    /// Price of one fertilizer charge.
    #[serde(default = "default_fertilizer_price")]
    pub fertilizer_price: u64,

    /// Price of one sprinkler.
    #[serde(default = "default_sprinkler_price")]
    pub sprinkler_price: u64,

    /// Coins per unlocked plot.
    #[serde(default = "default_plot_unlock_cost")]
    pub plot_unlock_cost: u64,

    /// Plots unlocked by a default expansion.
    #[serde(default = "default_plots_per_expansion")]
    pub plots_per_expansion: usize,

    /// Water a sprinkler adds per tick.
    #[serde(default = "default_auto_water")]
    pub sprinkler_water: f64,

    /// Water auto-watering weather adds per tick.
    #[serde(default = "default_auto_water")]
    pub rain_water: f64,

    /// Pollution auto-watering weather removes per tick.
    #[serde(default = "default_rain_pollution_wash")]
    pub rain_pollution_wash: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            fertilizer_price: default_fertilizer_price(),
            sprinkler_price: default_sprinkler_price(),
            plot_unlock_cost: default_plot_unlock_cost(),
            plots_per_expansion: default_plots_per_expansion(),
            sprinkler_water: default_auto_water(),
            rain_water: default_auto_water(),
            rain_pollution_wash: default_rain_pollution_wash(),
        }
    }
}

/// Optional per-species overrides; unset fields keep the standard value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpeciesOverride {
    /// Ticks from seed to ready.
    #[serde(default)]
    pub growth_time: Option<u32>,
    /// Produce per harvest at full health.
    #[serde(default)]
    pub base_yield: Option<u32>,
    /// Coins per seed.
    #[serde(default)]
    pub seed_cost: Option<u32>,
    /// Coins per unit of produce.
    #[serde(default)]
    pub sell_price: Option<u32>,
    /// Water level below which the crop is thirsty.
    #[serde(default)]
    pub water_need: Option<f64>,
    /// Stage topology.
    #[serde(default)]
    pub topology: Option<StageTopology>,
}

/// Simulation boundary configuration.
///
/// A value of 0 for either field means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of ticks before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

/// Observer API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether the observer API is started.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Observer listen port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_observer_port(),
        }
    }
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Snapshot file read at startup and written while running.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// Write a snapshot every N ticks (0 = only at shutdown).
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            snapshot_interval_ticks: default_snapshot_interval_ticks(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_world_name() -> String {
    "Tilth".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_ticks_per_season() -> u64 {
    100
}

const fn default_ticks_per_day() -> u64 {
    10
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 20).unwrap_or(NaiveDate::MIN)
}

const fn default_change_interval_ticks() -> u64 {
    15
}

fn default_city() -> String {
    "Taipei".to_owned()
}

fn default_provider_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    5000
}

const fn default_cols() -> usize {
    8
}

const fn default_rows() -> usize {
    6
}

const fn default_unlocked_plots() -> usize {
    12
}

const fn default_starting_coins() -> u64 {
    100
}

fn default_starting_seeds() -> BTreeMap<SpeciesId, u32> {
    BTreeMap::from([(SpeciesId::Wheat, 3)])
}

const fn default_fertilizer_price() -> u64 {
    25
}

const fn default_sprinkler_price() -> u64 {
    100
}

const fn default_plot_unlock_cost() -> u64 {
    25
}

const fn default_plots_per_expansion() -> usize {
    8
}

const fn default_auto_water() -> f64 {
    0.1
}

const fn default_rain_pollution_wash() -> f64 {
    0.02
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_snapshot_path() -> String {
    "tilth-snapshot.json".to_owned()
}

const fn default_snapshot_interval_ticks() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
