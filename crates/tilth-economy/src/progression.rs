//! Experience and levels.
//!
//! A level is reached once experience meets `level × 50`. Experience then
//! resets to zero and the farmer receives `new level × 20` coins.

use serde::{Deserialize, Serialize};

use crate::error::EconomyError;

/// Experience needed per current level to level up.
pub const EXPERIENCE_PER_LEVEL: u32 = 50;
/// Coins granted per level reached.
pub const COINS_PER_LEVEL: u64 = 20;

/// A level-up that just happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    /// Level reached.
    pub level: u32,
    /// Coins owed for reaching it.
    pub reward: u64,
}

/// Lifetime progress of the farmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    /// Current level, starting at 1.
    pub level: u32,
    /// Experience toward the next level.
    pub experience: u32,
    /// Produce units harvested in total.
    pub total_harvested: u64,
    /// Coins earned from harvests in total.
    pub total_earned: u64,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            total_harvested: 0,
            total_earned: 0,
        }
    }
}

impl Progression {
    /// Experience needed to leave the current level.
    pub const fn experience_to_next(&self) -> u32 {
        self.level.saturating_mul(EXPERIENCE_PER_LEVEL)
    }

    /// Add experience, returning the level-up it triggers, if any.
    pub fn gain_experience(&mut self, amount: u32) -> Option<LevelUp> {
        self.experience = self.experience.saturating_add(amount);
        if self.experience < self.experience_to_next() {
            return None;
        }
        self.level = self.level.saturating_add(1);
        self.experience = 0;
        Some(LevelUp {
            level: self.level,
            reward: u64::from(self.level).saturating_mul(COINS_PER_LEVEL),
        })
    }

    /// Tally a harvest.
    pub fn record_harvest(&mut self, quantity: u32, earnings: u64) {
        self.total_harvested = self.total_harvested.saturating_add(u64::from(quantity));
        self.total_earned = self.total_earned.saturating_add(earnings);
    }

    /// Check restored counters.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidProgression`] for level zero or
    /// experience already past the level threshold.
    pub fn validate(&self) -> Result<(), EconomyError> {
        if self.level == 0 {
            return Err(EconomyError::InvalidProgression {
                reason: "level must be at least 1".to_owned(),
            });
        }
        if self.experience >= self.experience_to_next() {
            return Err(EconomyError::InvalidProgression {
                reason: format!(
                    "experience {} already reaches the level {} threshold",
                    self.experience, self.level
                ),
            });
        }
        Ok(())
    }
}
