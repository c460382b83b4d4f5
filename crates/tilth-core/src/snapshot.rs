//! Export and restore of the farm's persistent state.
//!
//! A [`FarmSnapshot`] is a plain structured value. Where and how it is
//! stored is the caller's concern; JSON helpers are provided for the
//! common case. Restoring validates every invariant the running farm
//! relies on. Random numbers are derived from the seed and tick, so a
//! restored farm continues exactly as the original would have.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tilth_economy::{CareTracker, EconomyError, Progression, Wallet};
use tilth_types::{CareRecord, Notification, PlantId, Plot};
use tilth_world::{PlotStore, WeatherEngine, WeatherSchedule, WorldError};
use tracing::{info, warn};

use crate::clock::{ClockError, FarmClock};
use crate::config::SimulationConfig;
use crate::context::{ContextError, SimulationContext};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors restoring a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The snapshot could not be decoded or encoded.
    #[error("snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot was written by an incompatible version.
    #[error("snapshot version {found} is not supported (expected {expected})")]
    Version {
        /// Version in the snapshot.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// The configuration could not produce a farm.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Plots or weather violate an invariant.
    #[error(transparent)]
    World(#[from] WorldError),

    /// Care ledgers or progression violate an invariant.
    #[error(transparent)]
    Economy(#[from] EconomyError),

    /// The tick cannot be represented on the configured clock.
    #[error(transparent)]
    Clock(#[from] ClockError),

    /// Parts of the snapshot disagree with each other.
    #[error("inconsistent snapshot: {reason}")]
    Inconsistent {
        /// What disagrees.
        reason: String,
    },
}

fn inconsistent(reason: String) -> SnapshotError {
    SnapshotError::Inconsistent { reason }
}

/// One plant's care history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareLedger {
    /// The plant.
    pub plant: PlantId,
    /// Daily records in date order.
    pub records: Vec<CareRecord>,
}

/// Everything needed to rebuild a running farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmSnapshot {
    /// Format version.
    pub version: u32,
    /// World seed.
    pub seed: u64,
    /// Tick counter.
    pub tick: u64,
    /// Coins and consumables.
    pub resources: Wallet,
    /// Every plot, with its crop instance if any.
    pub plots: Vec<Plot>,
    /// Level and lifetime totals.
    pub progression: Progression,
    /// Care ledgers of living plants.
    pub care: Vec<CareLedger>,
    /// Weather engine state.
    pub weather: WeatherSchedule,
    /// Identifier the next planted crop receives.
    pub next_plant_id: PlantId,
    /// Whether the scheduler was paused.
    #[serde(default)]
    pub paused: bool,
    /// Notifications raised since the last tick.
    #[serde(default)]
    pub pending: Vec<Notification>,
}

impl FarmSnapshot {
    /// Decode a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl SimulationContext {
    /// Capture the persistent state.
    pub fn export_snapshot(&self) -> FarmSnapshot {
        FarmSnapshot {
            version: SNAPSHOT_VERSION,
            seed: self.seed,
            tick: self.clock.tick(),
            resources: self.wallet.clone(),
            plots: self.plots.plots().to_vec(),
            progression: self.progression.clone(),
            care: self
                .care
                .ledgers()
                .iter()
                .map(|(plant, records)| CareLedger {
                    plant: *plant,
                    records: records.clone(),
                })
                .collect(),
            weather: self.weather.schedule().clone(),
            next_plant_id: self.next_plant_id,
            paused: self.paused,
            pending: self.pending.clone(),
        }
    }

    /// Rebuild a farm from a snapshot, validating it against `config`.
    ///
    /// The external weather feed is not restored; attach one afterwards.
    pub fn restore(config: SimulationConfig, snapshot: FarmSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let mut context = Self::new(config)?;
        let tick = snapshot.tick;

        let plots = PlotStore::from_plots(
            context.config.farm.cols,
            context.config.farm.rows,
            snapshot.plots,
        )?;
        let mut plant_ids = BTreeSet::new();
        for plot in plots.plots() {
            let Some(crop) = &plot.crop else { continue };
            if crop.planted_at_tick > tick {
                return Err(inconsistent(format!(
                    "plot {} was planted at tick {} after snapshot tick {tick}",
                    plot.id, crop.planted_at_tick
                )));
            }
            if crop.plant_id >= snapshot.next_plant_id {
                return Err(inconsistent(format!(
                    "{} is not below next plant id {}",
                    crop.plant_id, snapshot.next_plant_id
                )));
            }
            if !plant_ids.insert(crop.plant_id) {
                return Err(inconsistent(format!("{} appears twice", crop.plant_id)));
            }
        }

        let mut ledgers = std::collections::BTreeMap::new();
        for ledger in snapshot.care {
            if !plant_ids.contains(&ledger.plant) {
                return Err(inconsistent(format!(
                    "care ledger for {} has no crop",
                    ledger.plant
                )));
            }
            if ledgers.insert(ledger.plant, ledger.records).is_some() {
                return Err(inconsistent(format!("{} has two care ledgers", ledger.plant)));
            }
        }
        let care = CareTracker::from_ledgers(ledgers)?;

        snapshot.progression.validate()?;

        if snapshot.weather.last_change_tick > tick {
            return Err(inconsistent(format!(
                "weather changed at tick {} after snapshot tick {tick}",
                snapshot.weather.last_change_tick
            )));
        }
        let weather = WeatherEngine::from_schedule(
            context.config.weather.change_interval_ticks,
            snapshot.weather,
        )?;

        let clock = FarmClock::from_parts(
            tick,
            context.config.time.ticks_per_season,
            context.config.time.ticks_per_day,
            context.config.time.start_date,
        )?;

        context.seed = snapshot.seed;
        context.clock = clock;
        context.weather = weather;
        context.plots = plots;
        context.wallet = snapshot.resources;
        context.progression = snapshot.progression;
        context.care = care;
        context.next_plant_id = snapshot.next_plant_id;
        context.paused = snapshot.paused;
        context.pending = snapshot.pending;

        info!(tick, seed = context.seed, "farm restored from snapshot");
        Ok(context)
    }

    /// Restore from JSON, or start a default farm if the snapshot is
    /// missing or rejected.
    ///
    /// A rejected snapshot is logged and discarded; only an invalid
    /// configuration is an error.
    pub fn load_or_default(
        config: SimulationConfig,
        json: Option<&str>,
    ) -> Result<Self, ContextError> {
        let Some(json) = json else {
            return Self::new(config);
        };
        let restored = FarmSnapshot::from_json(json)
            .and_then(|snapshot| Self::restore(config.clone(), snapshot));
        match restored {
            Ok(context) => Ok(context),
            Err(err) => {
                warn!(error = %err, "snapshot rejected, starting a new farm");
                Self::new(config)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tilth_types::SpeciesId;

    use super::*;

    fn farm() -> SimulationContext {
        let mut ctx = SimulationContext::new(SimulationConfig::default()).unwrap();
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        ctx.plant(1, SpeciesId::Wheat).unwrap();
        ctx
    }

    #[test]
    fn export_then_restore_is_identical() {
        let ctx = farm();
        let snapshot = ctx.export_snapshot();
        let json = snapshot.to_json().unwrap();
        let restored =
            SimulationContext::restore(SimulationConfig::default(), FarmSnapshot::from_json(&json).unwrap())
                .unwrap();
        assert_eq!(restored.export_snapshot(), snapshot);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let mut snapshot = farm().export_snapshot();
        snapshot.version = 99;
        assert!(matches!(
            SimulationContext::restore(SimulationConfig::default(), snapshot),
            Err(SnapshotError::Version { found: 99, .. })
        ));
    }

    #[test]
    fn out_of_range_water_is_rejected() {
        let mut snapshot = farm().export_snapshot();
        snapshot.plots.first_mut().unwrap().water_level = 1.5;
        assert!(matches!(
            SimulationContext::restore(SimulationConfig::default(), snapshot),
            Err(SnapshotError::World(_))
        ));
    }

    #[test]
    fn duplicate_plant_ids_are_rejected() {
        let mut snapshot = farm().export_snapshot();
        let first = snapshot.plots.first().unwrap().crop.clone();
        snapshot.plots.get_mut(1).unwrap().crop = first;
        assert!(matches!(
            SimulationContext::restore(SimulationConfig::default(), snapshot),
            Err(SnapshotError::Inconsistent { .. })
        ));
    }

    #[test]
    fn future_planting_is_rejected() {
        let mut snapshot = farm().export_snapshot();
        snapshot
            .plots
            .first_mut()
            .unwrap()
            .crop
            .as_mut()
            .unwrap()
            .planted_at_tick = 5;
        assert!(SimulationContext::restore(SimulationConfig::default(), snapshot).is_err());
    }

    #[test]
    fn grid_mismatch_is_rejected() {
        let snapshot = farm().export_snapshot();
        let mut config = SimulationConfig::default();
        config.farm.cols = 3;
        assert!(SimulationContext::restore(config, snapshot).is_err());
    }

    #[test]
    fn corrupt_json_falls_back_to_default() {
        let ctx = SimulationContext::load_or_default(SimulationConfig::default(), Some("{not json"))
            .unwrap();
        assert_eq!(ctx.tick(), 0);
        assert!(ctx.plots().plots().iter().all(|p| p.crop.is_none()));
    }

    #[test]
    fn valid_json_is_loaded() {
        let json = farm().export_snapshot().to_json().unwrap();
        let ctx = SimulationContext::load_or_default(SimulationConfig::default(), Some(&json))
            .unwrap();
        assert!(ctx.plots().get(0).unwrap().crop.is_some());
    }
}
