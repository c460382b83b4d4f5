//! Yield, earnings and bonus calculations.
//!
//! [`EconomyCalculator`] reads plot and crop state and never mutates it.
//!
//! ```text
//! yield    = floor(base_yield × health × fertilizer × season_harvest × companion)
//! earnings = floor(yield × sell_price × season_sell)
//! ```
//!
//! The fertilizer multiplier is 1.5 on fertilized plots. The companion bonus
//! is 1.0 plus each neighbour's contribution, capped at 1.5. Only `Ready`
//! crops yield anything.

use serde::{Deserialize, Serialize};
use tilth_types::{Grade, GrowthStage, HarvestMode, Season, SpeciesId};
use tilth_world::{COMPANION_BONUS_CAP, PlotStore, SeasonalEffects, SpeciesTable};

/// Yield multiplier on fertilized plots.
pub const FERTILIZER_YIELD_BONUS: f64 = 1.5;
/// Multiplier for switching rotation family on a plot.
pub const ROTATION_BONUS: f64 = 1.2;
/// Experience for any harvest in yield mode.
pub const HARVEST_EXPERIENCE: u32 = 5;

/// Absorbs representation error before flooring.
///
/// `100.0 * 1.15` evaluates to `114.99999999999999`, which would pay the
/// fall sell bonus on 100 coins as 114. Only values within `1e-9` of the
/// next integer are lifted; a health of `0.9999` on a yield of 3 still
/// floors to 2.
const FLOOR_EPSILON: f64 = 1e-9;

/// Extra rewards keyed on care grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeReward {
    /// Extra produce units.
    pub produce: u32,
    /// Extra coins.
    pub coins: u64,
    /// Experience granted.
    pub experience: u32,
}

/// The fixed reward table for care grades.
pub const fn grade_reward(grade: Grade) -> GradeReward {
    let (produce, coins, experience) = match grade {
        Grade::APlus => (3, 30, 50),
        Grade::A => (2, 20, 30),
        Grade::B => (1, 10, 15),
        Grade::F => (0, 5, 5),
    };
    GradeReward {
        produce,
        coins,
        experience,
    }
}

/// What a harvest of a plot would pay right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appraisal {
    /// Produce units.
    pub quantity: u32,
    /// Coins.
    pub earnings: u64,
    /// Experience, after the seasonal bonus.
    pub experience: u32,
    /// Care grade used, in care-grade mode.
    pub grade: Option<Grade>,
}

/// Floor a non-negative float into a `u32`, saturating.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    // Saturating float-to-int cast.
    (value + FLOOR_EPSILON).floor() as u32
}

/// Floor a non-negative float into a `u64`, saturating.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    (value + FLOOR_EPSILON).floor() as u64
}

/// Computes yields and rewards against a species table.
#[derive(Debug, Clone, Copy)]
pub struct EconomyCalculator<'a> {
    species: &'a SpeciesTable,
}

impl<'a> EconomyCalculator<'a> {
    /// Create a calculator over a species table.
    pub const fn new(species: &'a SpeciesTable) -> Self {
        Self { species }
    }

    /// Companion multiplier for the crop on `index`, in `[1.0, 1.5]`.
    pub fn companion_bonus(&self, store: &PlotStore, index: usize) -> f64 {
        let Some(crop) = store.get(index).and_then(|p| p.crop.as_ref()) else {
            return 1.0;
        };
        let Some(rule) = self.species.get(crop.species).companion else {
            return 1.0;
        };
        let extra: f64 = store
            .neighbor_species(index)
            .into_iter()
            .map(|neighbor| rule.bonus_for(neighbor))
            .sum();
        (1.0 + extra).min(COMPANION_BONUS_CAP)
    }

    /// Produce units a harvest of `index` would give in `season`.
    pub fn yield_quantity(&self, store: &PlotStore, index: usize, season: Season) -> u32 {
        let Some(plot) = store.get(index) else {
            return 0;
        };
        let Some(crop) = plot.crop.as_ref() else {
            return 0;
        };
        if crop.stage != GrowthStage::Ready {
            return 0;
        }
        let stats = self.species.get(crop.species);
        let fertilizer = if plot.fertilized {
            FERTILIZER_YIELD_BONUS
        } else {
            1.0
        };
        let seasonal = SeasonalEffects::for_season(season);
        floor_u32(
            f64::from(stats.base_yield)
                * crop.health
                * fertilizer
                * seasonal.harvest_bonus
                * self.companion_bonus(store, index),
        )
    }

    /// Coins earned for selling `quantity` units of `species` in `season`.
    pub fn earnings(&self, species: SpeciesId, quantity: u32, season: Season) -> u64 {
        let stats = self.species.get(species);
        let seasonal = SeasonalEffects::for_season(season);
        floor_u64(f64::from(quantity) * f64::from(stats.sell_price) * seasonal.sell_price_bonus)
    }

    /// Planting multiplier for following `previous` with `next` on a plot.
    pub fn rotation_bonus(&self, previous: Option<SpeciesId>, next: SpeciesId) -> f64 {
        match previous {
            Some(previous) if !self.species.same_family(previous, next) => ROTATION_BONUS,
            _ => 1.0,
        }
    }

    /// Experience after the seasonal bonus.
    pub fn experience(base: u32, season: Season) -> u32 {
        floor_u32(f64::from(base) * SeasonalEffects::for_season(season).experience_bonus)
    }

    /// Everything a harvest of `index` would pay, or `None` if the crop is
    /// not ready.
    ///
    /// In care-grade mode `grade` selects the bonus row; a missing grade
    /// counts as F. The grade reward is additive: its produce, coins and
    /// experience are added on top of the yield-mode quantity and
    /// earnings, and its experience replaces the flat harvest experience.
    pub fn appraise(
        &self,
        store: &PlotStore,
        index: usize,
        season: Season,
        mode: HarvestMode,
        grade: Option<Grade>,
    ) -> Option<Appraisal> {
        let crop = store.get(index)?.crop.as_ref()?;
        if crop.stage != GrowthStage::Ready {
            return None;
        }
        let quantity = self.yield_quantity(store, index, season);
        let earnings = self.earnings(crop.species, quantity, season);
        let appraisal = match mode {
            HarvestMode::Yield => Appraisal {
                quantity,
                earnings,
                experience: Self::experience(HARVEST_EXPERIENCE, season),
                grade: None,
            },
            HarvestMode::CareGrade => {
                let grade = grade.unwrap_or(Grade::F);
                let reward = grade_reward(grade);
                Appraisal {
                    quantity: quantity.saturating_add(reward.produce),
                    earnings: earnings.saturating_add(reward.coins),
                    experience: Self::experience(reward.experience, season),
                    grade: Some(grade),
                }
            }
        };
        Some(appraisal)
    }
}
