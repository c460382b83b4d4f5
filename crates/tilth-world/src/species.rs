//! Per-species crop statistics.
//!
//! The [`SpeciesTable`] is a static, strongly-typed table keyed by
//! [`SpeciesId`]. It ships with a standard set of stats and may be adjusted
//! from configuration; [`SpeciesTable::validate`] runs once at load time so
//! that the growth and economy code never sees a zero growth time or an
//! out-of-range water need.
//!
//! | Species | Growth | Yield | Seed | Sell | Water | Family  |
//! |---------|--------|-------|------|------|-------|---------|
//! | Wheat   | 5      | 3     | 5    | 8    | 0.20  | Grain   |
//! | Tomato  | 8      | 2     | 10   | 15   | 0.30  | Fruit   |
//! | Corn    | 12     | 4     | 15   | 25   | 0.25  | Grain   |
//! | Carrot  | 6      | 3     | 5    | 10   | 0.20  | Root    |
//! | Beet    | 9      | 2     | 8    | 16   | 0.25  | Root    |
//! | Apple   | 20     | 3     | 20   | 12   | 0.25  | Orchard |

use serde::{Deserialize, Serialize};
use tilth_types::{CropFamily, SpeciesId, StageSkin, StageTopology};

use crate::error::WorldError;

/// Upper bound for any companion bonus, including the base 1.0.
pub const COMPANION_BONUS_CAP: f64 = 1.5;

/// How neighbouring crops raise a species' yield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanionRule {
    /// Bonus for every planted neighbour regardless of species.
    AnyNeighbor {
        /// Additive bonus per neighbour.
        per_neighbor: f64,
    },
    /// Bonus for every neighbour of one particular species.
    Neighbor {
        /// The companion species.
        species: SpeciesId,
        /// Additive bonus per matching neighbour.
        per_neighbor: f64,
    },
}

impl CompanionRule {
    /// Bonus contributed by one neighbouring crop.
    pub fn bonus_for(&self, neighbor: SpeciesId) -> f64 {
        match *self {
            Self::AnyNeighbor { per_neighbor } => per_neighbor,
            Self::Neighbor {
                species,
                per_neighbor,
            } if species == neighbor => per_neighbor,
            Self::Neighbor { .. } => 0.0,
        }
    }
}

/// Static statistics for one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesStats {
    /// Ticks of full-rate growth from seed to ready.
    pub growth_time: u32,
    /// Produce units at full health with no bonuses.
    pub base_yield: u32,
    /// Coins per seed in the shop.
    pub seed_cost: u32,
    /// Coins per unit of produce.
    pub sell_price: u32,
    /// Water level below which the crop is thirsty.
    pub water_need: f64,
    /// Rotation family.
    pub family: CropFamily,
    /// Stage naming.
    pub skin: StageSkin,
    /// Which life-cycle branches apply.
    pub topology: StageTopology,
    /// Companion planting rule, if any.
    pub companion: Option<CompanionRule>,
}

impl SpeciesStats {
    /// Growth time as a float, for progress comparisons.
    pub fn growth_time_f64(&self) -> f64 {
        f64::from(self.growth_time)
    }

    /// Check the stats for values the simulation cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidSpecies`] naming the first problem.
    pub fn validate(&self, species: SpeciesId) -> Result<(), WorldError> {
        let invalid = |reason: &str| WorldError::InvalidSpecies {
            species,
            reason: reason.to_owned(),
        };
        if self.growth_time == 0 {
            return Err(invalid("growth_time must be at least 1"));
        }
        if self.base_yield == 0 {
            return Err(invalid("base_yield must be at least 1"));
        }
        if self.sell_price == 0 {
            return Err(invalid("sell_price must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.water_need) {
            return Err(invalid("water_need must lie in [0, 1]"));
        }
        if let Some(rule) = self.companion {
            let per_neighbor = match rule {
                CompanionRule::AnyNeighbor { per_neighbor }
                | CompanionRule::Neighbor { per_neighbor, .. } => per_neighbor,
            };
            if !per_neighbor.is_finite() || per_neighbor < 0.0 {
                return Err(invalid("companion bonus must be a non-negative number"));
            }
        }
        Ok(())
    }
}

/// Stats for every species, one field per [`SpeciesId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTable {
    wheat: SpeciesStats,
    tomato: SpeciesStats,
    corn: SpeciesStats,
    carrot: SpeciesStats,
    beet: SpeciesStats,
    apple: SpeciesStats,
}

impl SpeciesTable {
    /// The standard species stats.
    pub const fn standard() -> Self {
        Self {
            wheat: SpeciesStats {
                growth_time: 5,
                base_yield: 3,
                seed_cost: 5,
                sell_price: 8,
                water_need: 0.2,
                family: CropFamily::Grain,
                skin: StageSkin::Crop,
                topology: StageTopology::Full,
                companion: Some(CompanionRule::Neighbor {
                    species: SpeciesId::Corn,
                    per_neighbor: 0.1,
                }),
            },
            tomato: SpeciesStats {
                growth_time: 8,
                base_yield: 2,
                seed_cost: 10,
                sell_price: 15,
                water_need: 0.3,
                family: CropFamily::Fruit,
                skin: StageSkin::Crop,
                topology: StageTopology::Full,
                companion: Some(CompanionRule::AnyNeighbor { per_neighbor: 0.05 }),
            },
            corn: SpeciesStats {
                growth_time: 12,
                base_yield: 4,
                seed_cost: 15,
                sell_price: 25,
                water_need: 0.25,
                family: CropFamily::Grain,
                skin: StageSkin::Crop,
                topology: StageTopology::Full,
                companion: None,
            },
            carrot: SpeciesStats {
                growth_time: 6,
                base_yield: 3,
                seed_cost: 5,
                sell_price: 10,
                water_need: 0.2,
                family: CropFamily::Root,
                skin: StageSkin::Crop,
                topology: StageTopology::Full,
                companion: None,
            },
            beet: SpeciesStats {
                growth_time: 9,
                base_yield: 2,
                seed_cost: 8,
                sell_price: 16,
                water_need: 0.25,
                family: CropFamily::Root,
                skin: StageSkin::Crop,
                topology: StageTopology::Full,
                companion: None,
            },
            apple: SpeciesStats {
                growth_time: 20,
                base_yield: 3,
                seed_cost: 20,
                sell_price: 12,
                water_need: 0.25,
                family: CropFamily::Orchard,
                skin: StageSkin::Tree,
                topology: StageTopology::Full,
                companion: None,
            },
        }
    }

    /// Stats for a species.
    pub const fn get(&self, species: SpeciesId) -> &SpeciesStats {
        match species {
            SpeciesId::Wheat => &self.wheat,
            SpeciesId::Tomato => &self.tomato,
            SpeciesId::Corn => &self.corn,
            SpeciesId::Carrot => &self.carrot,
            SpeciesId::Beet => &self.beet,
            SpeciesId::Apple => &self.apple,
        }
    }

    /// Mutable stats for a species, for applying configuration overrides.
    pub const fn get_mut(&mut self, species: SpeciesId) -> &mut SpeciesStats {
        match species {
            SpeciesId::Wheat => &mut self.wheat,
            SpeciesId::Tomato => &mut self.tomato,
            SpeciesId::Corn => &mut self.corn,
            SpeciesId::Carrot => &mut self.carrot,
            SpeciesId::Beet => &mut self.beet,
            SpeciesId::Apple => &mut self.apple,
        }
    }

    /// Validate every species in the table.
    ///
    /// # Errors
    ///
    /// Returns the first [`WorldError::InvalidSpecies`] found.
    pub fn validate(&self) -> Result<(), WorldError> {
        for species in SpeciesId::ALL {
            self.get(species).validate(species)?;
        }
        Ok(())
    }

    /// Whether two species belong to the same rotation family.
    pub fn same_family(&self, a: SpeciesId, b: SpeciesId) -> bool {
        self.get(a).family == self.get(b).family
    }
}

impl Default for SpeciesTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_valid() {
        SpeciesTable::standard().validate().unwrap();
    }

    #[test]
    fn zero_growth_time_is_rejected() {
        let mut table = SpeciesTable::standard();
        table.get_mut(SpeciesId::Corn).growth_time = 0;
        let err = table.validate().unwrap_err();
        assert!(matches!(
            err,
            WorldError::InvalidSpecies {
                species: SpeciesId::Corn,
                ..
            }
        ));
    }

    #[test]
    fn water_need_out_of_range_is_rejected() {
        let mut table = SpeciesTable::standard();
        table.get_mut(SpeciesId::Beet).water_need = 1.5;
        assert!(table.validate().is_err());
    }

    #[test]
    fn families_group_grains() {
        let table = SpeciesTable::standard();
        assert!(table.same_family(SpeciesId::Wheat, SpeciesId::Corn));
        assert!(!table.same_family(SpeciesId::Wheat, SpeciesId::Tomato));
        assert!(table.same_family(SpeciesId::Carrot, SpeciesId::Beet));
    }

    #[test]
    fn companion_rules_match_neighbors() {
        let table = SpeciesTable::standard();
        let wheat = table.get(SpeciesId::Wheat).companion.unwrap();
        assert!((wheat.bonus_for(SpeciesId::Corn) - 0.1).abs() < f64::EPSILON);
        assert!(wheat.bonus_for(SpeciesId::Tomato).abs() < f64::EPSILON);
        let tomato = table.get(SpeciesId::Tomato).companion.unwrap();
        assert!((tomato.bonus_for(SpeciesId::Apple) - 0.05).abs() < f64::EPSILON);
    }
}
