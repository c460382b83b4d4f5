//! Per-plant daily care ledger and harvest grading.
//!
//! Each plant gets at most one [`CareRecord`] per calendar day. Recording
//! the same day again updates that entry: watering is sticky for the day,
//! and the weather quality reflects the latest observation.
//!
//! # Grading
//!
//! With `w` the fraction of days watered and `i` the fraction of days with
//! ideal weather, the first matching rule wins:
//!
//! | Grade | Rule                   |
//! |-------|------------------------|
//! | A+    | `w == 1` and `i ≥ 0.8` |
//! | A     | `w ≥ 0.8` and `i ≥ 0.6`|
//! | B     | `w ≥ 0.6` and `i ≥ 0.4`|
//! | F     | otherwise              |
//!
//! An empty history grades F.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tilth_types::{CareRecord, Grade, PlantId, WeatherQuality};

use crate::error::EconomyError;

/// Grade for given watering and ideal-weather rates.
pub fn grade_for_rates(watered_rate: f64, ideal_rate: f64) -> Grade {
    if watered_rate >= 1.0 && ideal_rate >= 0.8 {
        Grade::APlus
    } else if watered_rate >= 0.8 && ideal_rate >= 0.6 {
        Grade::A
    } else if watered_rate >= 0.6 && ideal_rate >= 0.4 {
        Grade::B
    } else {
        Grade::F
    }
}

/// Grade for a care history.
pub fn grade_history(history: &[CareRecord]) -> Grade {
    let total = u32::try_from(history.len()).unwrap_or(u32::MAX);
    if total == 0 {
        return Grade::F;
    }
    let mut watered: u32 = 0;
    let mut ideal: u32 = 0;
    for record in history {
        if record.watered {
            watered = watered.saturating_add(1);
        }
        if record.weather_quality == WeatherQuality::Ideal {
            ideal = ideal.saturating_add(1);
        }
    }
    let total = f64::from(total);
    grade_for_rates(f64::from(watered) / total, f64::from(ideal) / total)
}

/// Care ledgers for every plant on the farm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareTracker {
    ledgers: BTreeMap<PlantId, Vec<CareRecord>>,
}

impl CareTracker {
    /// An empty tracker.
    pub const fn new() -> Self {
        Self {
            ledgers: BTreeMap::new(),
        }
    }

    /// Rebuild a tracker from saved ledgers, checking each is in strict
    /// date order.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::DuplicateCareDay`] or
    /// [`EconomyError::UnsortedCareHistory`] for the first bad ledger.
    pub fn from_ledgers(
        ledgers: BTreeMap<PlantId, Vec<CareRecord>>,
    ) -> Result<Self, EconomyError> {
        for (&plant, history) in &ledgers {
            for pair in history.windows(2) {
                if let [earlier, later] = pair {
                    if earlier.date == later.date {
                        return Err(EconomyError::DuplicateCareDay {
                            plant,
                            date: later.date,
                        });
                    }
                    if earlier.date > later.date {
                        return Err(EconomyError::UnsortedCareHistory { plant });
                    }
                }
            }
        }
        Ok(Self { ledgers })
    }

    /// Upsert the entry for `date`.
    pub fn record_day(
        &mut self,
        plant: PlantId,
        date: NaiveDate,
        watered: bool,
        weather_quality: WeatherQuality,
    ) {
        let history = self.ledgers.entry(plant).or_default();
        match history.binary_search_by_key(&date, |r| r.date) {
            Ok(position) => {
                if let Some(record) = history.get_mut(position) {
                    record.watered = record.watered || watered;
                    record.weather_quality = weather_quality;
                }
            }
            Err(position) => history.insert(
                position,
                CareRecord {
                    date,
                    watered,
                    weather_quality,
                },
            ),
        }
    }

    /// Grade a plant's care so far.
    pub fn grade(&self, plant: PlantId) -> Grade {
        self.ledgers
            .get(&plant)
            .map_or(Grade::F, |history| grade_history(history))
    }

    /// A plant's care history in date order.
    pub fn history(&self, plant: PlantId) -> &[CareRecord] {
        self.ledgers.get(&plant).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop a plant's ledger, returning it.
    pub fn remove(&mut self, plant: PlantId) -> Vec<CareRecord> {
        self.ledgers.remove(&plant).unwrap_or_default()
    }

    /// All ledgers, for snapshots.
    pub const fn ledgers(&self) -> &BTreeMap<PlantId, Vec<CareRecord>> {
        &self.ledgers
    }
}
