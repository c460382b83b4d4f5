//! Farm clock and calendar.
//!
//! The tick counter is the single source of truth for time. Season, day
//! index and calendar date are all derived from it and never stored
//! independently.
//!
//! Seasons cycle Spring, Summer, Fall, Winter, each lasting
//! `ticks_per_season` ticks. Care records are keyed by calendar date, one
//! date per `ticks_per_day` ticks counted from `start_date`.

use chrono::{Days, NaiveDate};
use tilth_types::Season;

use crate::config::TimeConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration (e.g. zero ticks per season).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Farm clock tracking the simulation's temporal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmClock {
    /// Current tick number (0 before the first tick runs).
    tick: u64,

    /// Number of ticks per season.
    ticks_per_season: u64,

    /// Number of ticks per calendar day.
    ticks_per_day: u64,

    /// Calendar date of tick 0.
    start_date: NaiveDate,
}

impl FarmClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if either period is zero.
    pub fn new(config: &TimeConfig) -> Result<Self, ClockError> {
        Self::from_parts(
            0,
            config.ticks_per_season,
            config.ticks_per_day,
            config.start_date,
        )
    }

    /// Create a clock from explicit parameters (useful for testing and
    /// state restoration).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if either period is zero.
    pub fn from_parts(
        tick: u64,
        ticks_per_season: u64,
        ticks_per_day: u64,
        start_date: NaiveDate,
    ) -> Result<Self, ClockError> {
        if ticks_per_season == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_season must be at least 1".to_owned(),
            });
        }
        if ticks_per_day == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_day must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick,
            ticks_per_season,
            ticks_per_day,
            start_date,
        })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the number of ticks per season.
    pub const fn ticks_per_season(&self) -> u64 {
        self.ticks_per_season
    }

    /// Season at an arbitrary tick.
    pub fn season_at(&self, tick: u64) -> Season {
        let cycle = u64::try_from(Season::ALL.len()).unwrap_or(1);
        let index = tick
            .checked_div(self.ticks_per_season)
            .and_then(|n| n.checked_rem(cycle))
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        Season::ALL.get(index).copied().unwrap_or(Season::Spring)
    }

    /// Season at the current tick.
    pub fn season(&self) -> Season {
        self.season_at(self.tick)
    }

    /// Ticks elapsed since the current season began.
    pub fn season_tick(&self) -> u64 {
        self.tick.checked_rem(self.ticks_per_season).unwrap_or(0)
    }

    /// Zero-based day index of the current tick.
    pub fn day_index(&self) -> u64 {
        self.tick.checked_div(self.ticks_per_day).unwrap_or(0)
    }

    /// Calendar date of the current tick, saturating at the end of the
    /// supported calendar.
    pub fn date(&self) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(self.day_index()))
            .unwrap_or(NaiveDate::MAX)
    }
}
