//! The farm grid.
//!
//! [`PlotStore`] owns every [`Plot`] and the crops on them. Player actions
//! are validated here and refused with an [`ActionRejection`] rather than an
//! error. Consumables (seeds, fertilizer, sprinklers, coins) are owned by a
//! separate [`FarmSupplies`] collaborator and are only drawn once every
//! other check has passed.

use tilth_types::{ActionRejection, CropInstance, GrowthStage, PlantId, Plot, SpeciesId};
use tracing::debug;

use crate::error::WorldError;

/// Water added by one manual watering.
pub const WATERING_AMOUNT: f64 = 0.3;
/// Pollution added by one fertilizer application.
pub const FERTILIZER_POLLUTION: f64 = 0.05;

/// The resource collaborator that pays for player actions.
pub trait FarmSupplies {
    /// Consume one seed of `species`.
    fn take_seed(&mut self, species: SpeciesId) -> Result<(), ActionRejection>;
    /// Consume one fertilizer charge.
    fn take_fertilizer(&mut self) -> Result<(), ActionRejection>;
    /// Consume one spare sprinkler.
    fn take_sprinkler(&mut self) -> Result<(), ActionRejection>;
    /// Spend `coins`.
    fn spend(&mut self, coins: u64) -> Result<(), ActionRejection>;
}

/// Rectangular grid of plots in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotStore {
    cols: usize,
    rows: usize,
    plots: Vec<Plot>,
}

impl PlotStore {
    /// Create a grid with the first `unlocked` plots open.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGrid`] for an empty grid or when more
    /// plots are unlocked than exist.
    pub fn new(cols: usize, rows: usize, unlocked: usize) -> Result<Self, WorldError> {
        let len = grid_len(cols, rows)?;
        if unlocked > len {
            return Err(WorldError::InvalidGrid {
                reason: format!("cannot unlock {unlocked} of {len} plots"),
            });
        }
        let plots = (0..len).map(|id| Plot::new(id, id < unlocked)).collect();
        Ok(Self { cols, rows, plots })
    }

    /// Rebuild a grid from restored plots, checking every plot invariant.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGrid`] if the plot count does not match
    /// the dimensions, or [`WorldError::InvalidPlot`] for the first plot
    /// that is out of order, out of range, or holds a crop while locked.
    pub fn from_plots(cols: usize, rows: usize, plots: Vec<Plot>) -> Result<Self, WorldError> {
        let len = grid_len(cols, rows)?;
        if plots.len() != len {
            return Err(WorldError::InvalidGrid {
                reason: format!("expected {len} plots, found {}", plots.len()),
            });
        }
        for (index, plot) in plots.iter().enumerate() {
            validate_plot(index, plot)?;
        }
        Ok(Self { cols, rows, plots })
    }

    /// Number of columns.
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of plots.
    pub fn len(&self) -> usize {
        self.plots.len()
    }

    /// Whether the grid has no plots. Never true for a constructed store.
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    /// All plots in index order.
    pub fn plots(&self) -> &[Plot] {
        &self.plots
    }

    /// Mutable access to all plots, for the tick pipeline.
    pub fn plots_mut(&mut self) -> &mut [Plot] {
        &mut self.plots
    }

    /// A plot by index.
    pub fn get(&self, index: usize) -> Option<&Plot> {
        self.plots.get(index)
    }

    /// Number of unlocked plots.
    pub fn unlocked_count(&self) -> usize {
        self.plots.iter().filter(|p| p.unlocked).count()
    }

    /// Indices of the up to eight plots surrounding `index`.
    pub fn neighbor_indices(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::with_capacity(8);
        if index >= self.plots.len() || self.cols == 0 {
            return out;
        }
        let row = index.checked_div(self.cols).unwrap_or(0);
        let col = index.checked_rem(self.cols).unwrap_or(0);
        for dr in [-1_isize, 0, 1] {
            for dc in [-1_isize, 0, 1] {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let (Some(r), Some(c)) = (row.checked_add_signed(dr), col.checked_add_signed(dc))
                else {
                    continue;
                };
                if r >= self.rows || c >= self.cols {
                    continue;
                }
                if let Some(i) = r.checked_mul(self.cols).and_then(|base| base.checked_add(c)) {
                    out.push(i);
                }
            }
        }
        out
    }

    /// Species of the living crops surrounding `index`.
    pub fn neighbor_species(&self, index: usize) -> Vec<SpeciesId> {
        self.neighbor_indices(index)
            .into_iter()
            .filter_map(|i| self.plots.get(i))
            .filter_map(|p| p.crop.as_ref())
            .filter(|c| c.stage.is_alive())
            .map(|c| c.species)
            .collect()
    }

    /// Look up an unlocked plot for mutation.
    fn workable(&mut self, index: usize) -> Result<&mut Plot, ActionRejection> {
        let plot = self
            .plots
            .get_mut(index)
            .ok_or(ActionRejection::InvalidPlot)?;
        if !plot.unlocked {
            return Err(ActionRejection::PlotLocked);
        }
        Ok(plot)
    }

    /// Put a seed in the ground.
    ///
    /// The seed is only drawn from `supplies` after the plot checks pass.
    pub fn plant<S: FarmSupplies>(
        &mut self,
        index: usize,
        species: SpeciesId,
        plant_id: PlantId,
        tick: u64,
        rotation_bonus: f64,
        supplies: &mut S,
    ) -> Result<(), ActionRejection> {
        let plot = self.workable(index)?;
        if plot.crop.is_some() {
            return Err(ActionRejection::PlotOccupied);
        }
        supplies.take_seed(species)?;
        plot.crop = Some(CropInstance::seed(plant_id, species, tick, rotation_bonus));
        debug!(plot = index, %species, %plant_id, tick, "planted");
        Ok(())
    }

    /// Water a plot by hand.
    pub fn water(&mut self, index: usize, tick: u64) -> Result<(), ActionRejection> {
        let plot = self.workable(index)?;
        plot.add_water(WATERING_AMOUNT);
        plot.last_watered_tick = tick;
        Ok(())
    }

    /// Apply one fertilizer charge.
    pub fn fertilize<S: FarmSupplies>(
        &mut self,
        index: usize,
        supplies: &mut S,
    ) -> Result<(), ActionRejection> {
        let plot = self.workable(index)?;
        if plot.fertilized {
            return Err(ActionRejection::AlreadyFertilized);
        }
        supplies.take_fertilizer()?;
        plot.fertilized = true;
        plot.add_pollution(FERTILIZER_POLLUTION);
        Ok(())
    }

    /// Install a spare sprinkler.
    pub fn install_sprinkler<S: FarmSupplies>(
        &mut self,
        index: usize,
        supplies: &mut S,
    ) -> Result<(), ActionRejection> {
        let plot = self.workable(index)?;
        if plot.has_sprinkler {
            return Err(ActionRejection::SprinklerInstalled);
        }
        supplies.take_sprinkler()?;
        plot.has_sprinkler = true;
        Ok(())
    }

    /// Remove a ready crop, clearing fertilizer and remembering the species
    /// for rotation.
    pub fn harvest(&mut self, index: usize) -> Result<CropInstance, ActionRejection> {
        let plot = self.workable(index)?;
        match plot.crop.as_ref() {
            None => return Err(ActionRejection::PlotEmpty),
            Some(crop) if crop.stage != GrowthStage::Ready => {
                return Err(ActionRejection::NotReady);
            }
            Some(_) => {}
        }
        let crop = plot.crop.take().ok_or(ActionRejection::PlotEmpty)?;
        plot.fertilized = false;
        plot.last_species = Some(crop.species);
        Ok(crop)
    }

    /// Clear away a sick or dead crop.
    pub fn clear(&mut self, index: usize) -> Result<CropInstance, ActionRejection> {
        let plot = self.workable(index)?;
        match plot.crop.as_ref() {
            None => return Err(ActionRejection::PlotEmpty),
            Some(crop) if crop.stage.on_growth_line() => return Err(ActionRejection::CropAlive),
            Some(_) => {}
        }
        plot.crop.take().ok_or(ActionRejection::PlotEmpty)
    }

    /// Unlock up to `count` locked plots in index order at `cost_per_plot`
    /// coins each. Returns how many were unlocked.
    pub fn expand<S: FarmSupplies>(
        &mut self,
        count: usize,
        cost_per_plot: u64,
        supplies: &mut S,
    ) -> Result<usize, ActionRejection> {
        let locked = self.plots.len().saturating_sub(self.unlocked_count());
        let unlocking = count.min(locked);
        if unlocking == 0 {
            return Err(ActionRejection::NothingToUnlock);
        }
        let cost = u64::try_from(unlocking)
            .ok()
            .and_then(|n| n.checked_mul(cost_per_plot))
            .ok_or(ActionRejection::Overflow)?;
        supplies.spend(cost)?;
        for plot in self.plots.iter_mut().filter(|p| !p.unlocked).take(unlocking) {
            plot.unlocked = true;
        }
        debug!(unlocked = unlocking, cost, "farm expanded");
        Ok(unlocking)
    }
}

fn grid_len(cols: usize, rows: usize) -> Result<usize, WorldError> {
    if cols == 0 || rows == 0 {
        return Err(WorldError::InvalidGrid {
            reason: "grid needs at least one row and one column".to_owned(),
        });
    }
    cols.checked_mul(rows).ok_or_else(|| WorldError::InvalidGrid {
        reason: "grid dimensions overflow".to_owned(),
    })
}

fn validate_plot(index: usize, plot: &Plot) -> Result<(), WorldError> {
    let invalid = |reason: &str| WorldError::InvalidPlot {
        index,
        reason: reason.to_owned(),
    };
    if plot.id != index {
        return Err(invalid("plot id does not match its position"));
    }
    if !(0.0..=1.0).contains(&plot.water_level) {
        return Err(invalid("water level outside [0, 1]"));
    }
    if !(0.0..=1.0).contains(&plot.pollution) {
        return Err(invalid("pollution outside [0, 1]"));
    }
    if let Some(crop) = &plot.crop {
        if !plot.unlocked {
            return Err(invalid("locked plot holds a crop"));
        }
        if !(CropInstance::MIN_HEALTH..=CropInstance::MAX_HEALTH).contains(&crop.health) {
            return Err(invalid("crop health outside [0.1, 1]"));
        }
        if !crop.growth_progress.is_finite() || crop.growth_progress < 0.0 {
            return Err(invalid("crop growth progress is negative or not finite"));
        }
        if !crop.rotation_bonus.is_finite() || crop.rotation_bonus <= 0.0 {
            return Err(invalid("crop rotation bonus is not positive"));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Counted supplies and a coin purse.
    #[derive(Default)]
    struct Purse {
        coins: u64,
        seeds: u32,
        fertilizer: u32,
        sprinklers: u32,
    }

    impl FarmSupplies for Purse {
        fn take_seed(&mut self, _species: SpeciesId) -> Result<(), ActionRejection> {
            self.seeds = self.seeds.checked_sub(1).ok_or(ActionRejection::InsufficientSeeds)?;
            Ok(())
        }
        fn take_fertilizer(&mut self) -> Result<(), ActionRejection> {
            self.fertilizer = self.fertilizer.checked_sub(1).ok_or(ActionRejection::NoFertilizer)?;
            Ok(())
        }
        fn take_sprinkler(&mut self) -> Result<(), ActionRejection> {
            self.sprinklers = self.sprinklers.checked_sub(1).ok_or(ActionRejection::NoSprinkler)?;
            Ok(())
        }
        fn spend(&mut self, coins: u64) -> Result<(), ActionRejection> {
            self.coins = self.coins.checked_sub(coins).ok_or(ActionRejection::InsufficientFunds)?;
            Ok(())
        }
    }

    fn store() -> PlotStore {
        PlotStore::new(8, 6, 12).unwrap()
    }

    #[test]
    fn new_store_unlocks_prefix() {
        let store = store();
        assert_eq!(store.len(), 48);
        assert_eq!(store.unlocked_count(), 12);
        assert!(store.get(11).unwrap().unlocked);
        assert!(!store.get(12).unwrap().unlocked);
        assert!((store.get(0).unwrap().water_level - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_grids_are_rejected() {
        assert!(PlotStore::new(0, 6, 0).is_err());
        assert!(PlotStore::new(2, 2, 5).is_err());
    }

    #[test]
    fn plant_validates_before_taking_seed() {
        let mut store = store();
        let mut purse = Purse {
            seeds: 1,
            ..Purse::default()
        };
        let id = PlantId::FIRST;
        assert_eq!(
            store.plant(99, SpeciesId::Wheat, id, 0, 1.0, &mut purse),
            Err(ActionRejection::InvalidPlot)
        );
        assert_eq!(
            store.plant(20, SpeciesId::Wheat, id, 0, 1.0, &mut purse),
            Err(ActionRejection::PlotLocked)
        );
        assert_eq!(purse.seeds, 1);
        store.plant(0, SpeciesId::Wheat, id, 0, 1.0, &mut purse).unwrap();
        assert_eq!(purse.seeds, 0);
        assert_eq!(
            store.plant(0, SpeciesId::Wheat, id, 0, 1.0, &mut purse),
            Err(ActionRejection::PlotOccupied)
        );
        assert_eq!(
            store.plant(1, SpeciesId::Wheat, id, 0, 1.0, &mut purse),
            Err(ActionRejection::InsufficientSeeds)
        );
        assert!(store.get(1).unwrap().crop.is_none());
    }

    #[test]
    fn water_clamps_and_stamps_tick() {
        let mut store = store();
        store.water(3, 7).unwrap();
        store.water(3, 8).unwrap();
        let plot = store.get(3).unwrap();
        assert!((plot.water_level - 1.0).abs() < f64::EPSILON);
        assert_eq!(plot.last_watered_tick, 8);
        assert_eq!(store.water(40, 9), Err(ActionRejection::PlotLocked));
    }

    #[test]
    fn fertilize_needs_a_charge() {
        let mut store = store();
        let mut purse = Purse::default();
        assert_eq!(store.fertilize(0, &mut purse), Err(ActionRejection::NoFertilizer));
        purse.fertilizer = 2;
        store.fertilize(0, &mut purse).unwrap();
        assert_eq!(store.fertilize(0, &mut purse), Err(ActionRejection::AlreadyFertilized));
        assert_eq!(purse.fertilizer, 1);
        assert!((store.get(0).unwrap().pollution - FERTILIZER_POLLUTION).abs() < 1e-12);
    }

    #[test]
    fn harvest_only_when_ready() {
        let mut store = store();
        let mut purse = Purse {
            seeds: 1,
            fertilizer: 1,
            ..Purse::default()
        };
        assert_eq!(store.harvest(0), Err(ActionRejection::PlotEmpty));
        store.plant(0, SpeciesId::Corn, PlantId::FIRST, 0, 1.0, &mut purse).unwrap();
        store.fertilize(0, &mut purse).unwrap();
        assert_eq!(store.harvest(0), Err(ActionRejection::NotReady));
        if let Some(crop) = store.plots_mut().get_mut(0).and_then(|p| p.crop.as_mut()) {
            crop.stage = GrowthStage::Ready;
        }
        let crop = store.harvest(0).unwrap();
        assert_eq!(crop.species, SpeciesId::Corn);
        let plot = store.get(0).unwrap();
        assert!(plot.crop.is_none());
        assert!(!plot.fertilized);
        assert_eq!(plot.last_species, Some(SpeciesId::Corn));
    }

    #[test]
    fn clear_only_removes_sick_or_dead() {
        let mut store = store();
        let mut purse = Purse {
            seeds: 1,
            ..Purse::default()
        };
        store.plant(2, SpeciesId::Beet, PlantId::FIRST, 0, 1.0, &mut purse).unwrap();
        assert_eq!(store.clear(2), Err(ActionRejection::CropAlive));
        if let Some(crop) = store.plots_mut().get_mut(2).and_then(|p| p.crop.as_mut()) {
            crop.stage = GrowthStage::Dead;
        }
        assert!(store.clear(2).is_ok());
        assert!(store.get(2).unwrap().crop.is_none());
    }

    #[test]
    fn expand_charges_per_plot_and_caps() {
        let mut store = PlotStore::new(4, 1, 2).unwrap();
        let mut purse = Purse {
            coins: 40,
            ..Purse::default()
        };
        assert_eq!(store.expand(8, 25, &mut purse), Err(ActionRejection::InsufficientFunds));
        purse.coins = 100;
        assert_eq!(store.expand(8, 25, &mut purse), Ok(2));
        assert_eq!(purse.coins, 50);
        assert_eq!(store.unlocked_count(), 4);
        assert_eq!(store.expand(1, 25, &mut purse), Err(ActionRejection::NothingToUnlock));
    }

    #[test]
    fn neighbors_respect_edges() {
        let store = store();
        let mut corner = store.neighbor_indices(0);
        corner.sort_unstable();
        assert_eq!(corner, vec![1, 8, 9]);
        assert_eq!(store.neighbor_indices(9).len(), 8);
        let mut right_edge = store.neighbor_indices(15);
        right_edge.sort_unstable();
        assert_eq!(right_edge, vec![6, 7, 14, 22, 23]);
        assert!(store.neighbor_indices(48).is_empty());
    }

    #[test]
    fn restore_rejects_crop_on_locked_plot() {
        let mut plots: Vec<Plot> = (0..4).map(|i| Plot::new(i, i < 2)).collect();
        if let Some(plot) = plots.get_mut(3) {
            plot.crop = Some(CropInstance::seed(PlantId::FIRST, SpeciesId::Wheat, 0, 1.0));
        }
        let err = PlotStore::from_plots(2, 2, plots).unwrap_err();
        assert!(matches!(err, WorldError::InvalidPlot { index: 3, .. }));
    }

    #[test]
    fn restore_rejects_wrong_count() {
        let plots: Vec<Plot> = (0..3).map(|i| Plot::new(i, true)).collect();
        assert!(PlotStore::from_plots(2, 2, plots).is_err());
    }
}
