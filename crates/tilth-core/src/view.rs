//! Read-only views handed to collaborators after a tick completes.

use chrono::NaiveDate;
use serde::Serialize;
use tilth_economy::{Appraisal, Progression, Wallet};
use tilth_types::{Grade, HarvestMode, Plot, Season, WeatherState};
use tilth_world::{ForcedWeather, SeasonalEffects};

use crate::context::SimulationContext;

/// The whole farm as a renderer or UI sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmView {
    /// Farm name.
    pub name: String,
    /// Current tick.
    pub tick: u64,
    /// Current season.
    pub season: Season,
    /// Ticks into the current season.
    pub season_tick: u64,
    /// Calendar date.
    pub date: NaiveDate,
    /// Whether ticks are currently no-ops.
    pub paused: bool,
    /// Weather in effect.
    pub weather: WeatherState,
    /// Special weather overriding the cadence, if any.
    pub forced_weather: Option<ForcedWeather>,
    /// Tick of the next weather transition.
    pub next_weather_tick: u64,
    /// Seasonal bonuses in effect.
    pub seasonal: SeasonalEffects,
    /// Grid columns.
    pub cols: usize,
    /// Grid rows.
    pub rows: usize,
    /// Every plot in index order.
    pub plots: Vec<Plot>,
    /// Resources held.
    pub wallet: Wallet,
    /// Level and lifetime totals.
    pub progression: Progression,
    /// How harvests are scored.
    pub harvest_mode: HarvestMode,
}

impl FarmView {
    pub(crate) fn capture(context: &SimulationContext) -> Self {
        let clock = context.clock();
        let engine = context.weather_engine();
        Self {
            name: context.config().world.name.clone(),
            tick: clock.tick(),
            season: clock.season(),
            season_tick: clock.season_tick(),
            date: clock.date(),
            paused: context.is_paused(),
            weather: engine.current().clone(),
            forced_weather: engine.forced(),
            next_weather_tick: engine.next_transition_tick(),
            seasonal: SeasonalEffects::for_season(clock.season()),
            cols: context.plots().cols(),
            rows: context.plots().rows(),
            plots: context.plots().plots().to_vec(),
            wallet: context.wallet().clone(),
            progression: context.progression().clone(),
            harvest_mode: context.harvest_mode(),
        }
    }
}

/// One plot with derived information.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotDetail {
    /// The plot itself.
    pub plot: Plot,
    /// Stage name under the species' skin.
    pub stage_label: Option<&'static str>,
    /// Days of care recorded for the crop.
    pub care_days: usize,
    /// Grade the crop would receive now, in care-grade mode.
    pub grade: Option<Grade>,
    /// What harvesting now would pay, if the crop is ready.
    pub appraisal: Option<Appraisal>,
}

impl PlotDetail {
    pub(crate) fn capture(context: &SimulationContext, index: usize) -> Option<Self> {
        let plot = context.plots().get(index)?.clone();
        let crop = plot.crop.as_ref();
        let stage_label =
            crop.map(|c| c.stage.label(context.species().get(c.species).skin));
        let care_days = crop.map_or(0, |c| context.care().history(c.plant_id).len());
        let grade = match (context.harvest_mode(), crop) {
            (HarvestMode::CareGrade, Some(c)) => Some(context.grade(c.plant_id)),
            _ => None,
        };
        let appraisal = context.appraise(index);
        Some(Self {
            plot,
            stage_label,
            care_days,
            grade,
            appraisal,
        })
    }
}
