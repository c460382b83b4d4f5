//! Enumeration types for the Tilth simulation.
//!
//! Seasons, weather, growth stages, species and the reasons a player
//! action can be refused. Every enum here is a closed set that static
//! configuration tables are keyed on.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// A season in the farm's annual cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Season {
    /// Experience bonus, wet and mild.
    Spring,
    /// Harvest bonus, hot and dry.
    Summer,
    /// Sell-price bonus.
    Fall,
    /// Cold, snow possible.
    Winter,
}

impl Season {
    /// All seasons in calendar order.
    pub const ALL: [Self; 4] = [Self::Spring, Self::Summer, Self::Fall, Self::Winter];

    /// The season that follows this one.
    pub const fn next(self) -> Self {
        match self {
            Self::Spring => Self::Summer,
            Self::Summer => Self::Fall,
            Self::Fall => Self::Winter,
            Self::Winter => Self::Spring,
        }
    }
}

impl core::fmt::Display for Season {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall => "Fall",
            Self::Winter => "Winter",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// The kind of weather currently over the farm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum WeatherKind {
    /// Clear skies. Baseline growth, fast evaporation.
    Sunny,
    /// Rain. Faster growth, waters every plot.
    Rainy,
    /// Overcast. Slightly slower growth.
    Cloudy,
    /// Storm. Slow growth, waters every plot, raises disease risk.
    Stormy,
    /// Snowfall. Growth nearly stops.
    Snow,
    /// Heat and no rain. Heavy evaporation.
    Drought,
}

impl WeatherKind {
    /// All weather kinds.
    pub const ALL: [Self; 6] = [
        Self::Sunny,
        Self::Rainy,
        Self::Cloudy,
        Self::Stormy,
        Self::Snow,
        Self::Drought,
    ];
}

/// How pleasant a day's weather was for a plant, as recorded in its care
/// ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum WeatherQuality {
    /// Mild temperature, no precipitation.
    Ideal,
    /// Rain.
    Wet,
    /// Storms, snow, drought or temperature extremes.
    Harsh,
}

/// Primary condition category reported by an external weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ConditionCategory {
    /// No cloud cover.
    Clear,
    /// Cloud, mist, fog or haze.
    Clouds,
    /// Rain or drizzle.
    Rain,
    /// Snowfall.
    Snow,
    /// Thunderstorm.
    Storm,
    /// Anything the provider reports that has no mapping.
    Unknown,
}

// ---------------------------------------------------------------------------
// Crops
// ---------------------------------------------------------------------------

/// A plantable species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum SpeciesId {
    /// Fast grain.
    Wheat,
    /// Fruit that likes company.
    Tomato,
    /// Slow, high-yield grain.
    Corn,
    /// Root vegetable.
    Carrot,
    /// Root vegetable.
    Beet,
    /// Orchard tree.
    Apple,
}

impl SpeciesId {
    /// All species.
    pub const ALL: [Self; 6] = [
        Self::Wheat,
        Self::Tomato,
        Self::Corn,
        Self::Carrot,
        Self::Beet,
        Self::Apple,
    ];
}

impl core::fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Wheat => "wheat",
            Self::Tomato => "tomato",
            Self::Corn => "corn",
            Self::Carrot => "carrot",
            Self::Beet => "beet",
            Self::Apple => "apple",
        };
        f.write_str(name)
    }
}

/// Family grouping used for crop rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum CropFamily {
    /// Cereals.
    Grain,
    /// Fruiting vegetables.
    Fruit,
    /// Root vegetables.
    Root,
    /// Fruit trees.
    Orchard,
}

/// Display vocabulary for a species' growth stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum StageSkin {
    /// Seed, Sprout, Growing, Mature, Ready.
    Crop,
    /// Seed, Sprout, Small Tree, Big Tree, Fruiting.
    Tree,
}

/// Which branches of the growth state machine a species can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum StageTopology {
    /// Seven stages: the growth line plus the `Sick` and `Dead` branches.
    Full,
    /// Five stages: the growth line only. Health still floors at the
    /// minimum but never turns the crop sick or dead.
    Simple,
}

/// Position of a crop in its life cycle.
///
/// The growth line `Seed → Sprout → Growing → Mature → Ready` only moves
/// forward. `Sick` and `Dead` are side branches; `Dead` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum GrowthStage {
    /// Just planted.
    Seed,
    /// First quarter of growth time passed.
    Sprout,
    /// Half of growth time passed (Small Tree).
    Growing,
    /// Three quarters of growth time passed (Big Tree).
    Mature,
    /// Fully grown and harvestable (Fruiting).
    Ready,
    /// Weakened by neglect; keeps aging but cannot be harvested.
    Sick,
    /// Terminal. Must be cleared from the plot.
    Dead,
}

impl GrowthStage {
    /// The forward growth line in order.
    pub const GROWTH_LINE: [Self; 5] = [
        Self::Seed,
        Self::Sprout,
        Self::Growing,
        Self::Mature,
        Self::Ready,
    ];

    /// Whether the crop is still alive.
    pub const fn is_alive(self) -> bool {
        !matches!(self, Self::Dead)
    }

    /// Whether the stage lies on the forward growth line.
    pub const fn on_growth_line(self) -> bool {
        !matches!(self, Self::Sick | Self::Dead)
    }

    /// Stage label under the given skin.
    pub const fn label(self, skin: StageSkin) -> &'static str {
        match (self, skin) {
            (Self::Seed, _) => "Seed",
            (Self::Sprout, _) => "Sprout",
            (Self::Growing, StageSkin::Crop) => "Growing",
            (Self::Growing, StageSkin::Tree) => "Small Tree",
            (Self::Mature, StageSkin::Crop) => "Mature",
            (Self::Mature, StageSkin::Tree) => "Big Tree",
            (Self::Ready, StageSkin::Crop) => "Ready",
            (Self::Ready, StageSkin::Tree) => "Fruiting",
            (Self::Sick, _) => "Sick",
            (Self::Dead, _) => "Dead",
        }
    }
}

/// Letter grade summarizing a plant's care history.
///
/// Declaration order gives `F < B < A < APlus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Grade {
    /// Neglected.
    F,
    /// Adequate.
    B,
    /// Good.
    A,
    /// Perfect care in mostly ideal weather.
    #[serde(rename = "A+")]
    APlus,
}

impl core::fmt::Display for Grade {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::F => "F",
            Self::B => "B",
            Self::A => "A",
            Self::APlus => "A+",
        };
        f.write_str(name)
    }
}

/// How harvest rewards are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum HarvestMode {
    /// Yield and earnings from species stats and bonuses only.
    #[default]
    Yield,
    /// Yield plus a bonus keyed on the plant's care grade.
    CareGrade,
}

/// Variety of disease outbreak rolled by the per-plot health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum DiseaseKind {
    /// Fungal blight.
    Blight,
    /// Pest infestation.
    Pests,
}

/// Rare farm-wide events rolled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SpecialEventKind {
    /// Forced rain for a while.
    GoldenRain,
    /// Forced sunshine for a while.
    PerfectSun,
    /// Free coins.
    CoinShower,
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// The reason a player action was refused.
///
/// Rejections are ordinary return values; the caller decides how to
/// present them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, thiserror::Error)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionRejection {
    /// Plot index outside the grid.
    #[error("no such plot")]
    InvalidPlot,
    /// Plot has not been unlocked yet.
    #[error("plot is locked")]
    PlotLocked,
    /// Plot already holds a crop.
    #[error("plot is occupied")]
    PlotOccupied,
    /// Plot holds no crop.
    #[error("plot is empty")]
    PlotEmpty,
    /// Crop is not in the `Ready` stage.
    #[error("crop is not ready")]
    NotReady,
    /// Crop is healthy and growing; only sick or dead crops can be cleared.
    #[error("crop is still growing")]
    CropAlive,
    /// No seeds of the requested species.
    #[error("not enough seeds")]
    InsufficientSeeds,
    /// No fertilizer charges left.
    #[error("no fertilizer left")]
    NoFertilizer,
    /// Plot is already fertilized.
    #[error("plot is already fertilized")]
    AlreadyFertilized,
    /// No spare sprinklers.
    #[error("no sprinkler available")]
    NoSprinkler,
    /// Plot already has a sprinkler.
    #[error("plot already has a sprinkler")]
    SprinklerInstalled,
    /// Not enough coins.
    #[error("not enough coins")]
    InsufficientFunds,
    /// Every plot is already unlocked.
    #[error("nothing left to unlock")]
    NothingToUnlock,
    /// A counter would overflow.
    #[error("counter overflow")]
    Overflow,
}
