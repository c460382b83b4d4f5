//! The farm's complete mutable state and the player actions against it.
//!
//! [`SimulationContext`] is constructed once and passed by reference to
//! every subsystem. Nothing in the simulation reaches for global state.
//! Player actions return `Result<_, ActionRejection>`; a rejection leaves
//! the context untouched.

use std::sync::Arc;

use tilth_economy::{
    Appraisal, CareTracker, EconomyCalculator, LevelUp, Progression, ShopItem, ShopPrices, Wallet,
    purchase,
};
use tilth_types::{
    ActionRejection, FarmEvent, Grade, HarvestMode, HarvestResult, Notification, PlantId, Season,
    SpeciesId, WeatherKind, WeatherState,
};
use tilth_world::{ForecastEntry, PlotStore, SpeciesTable, WeatherEngine, WorldError};
use tracing::{info, warn};

use crate::clock::{ClockError, FarmClock};
use crate::config::{ConfigError, SimulationConfig};
use crate::feed::{WeatherFeed, WeatherSource};
use crate::rng::{RngStream, stream_rng};
use crate::view::{FarmView, PlotDetail};

/// Errors building a context from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Clock parameters were invalid.
    #[error(transparent)]
    Clock(#[from] ClockError),

    /// Grid or weather parameters were invalid.
    #[error(transparent)]
    World(#[from] WorldError),

    /// Starting resources could not be credited.
    #[error("starting resources: {0}")]
    Resources(#[from] ActionRejection),
}

/// Everything the simulation owns.
#[derive(Debug)]
pub struct SimulationContext {
    pub(crate) config: SimulationConfig,
    pub(crate) species: SpeciesTable,
    pub(crate) clock: FarmClock,
    pub(crate) weather: WeatherEngine,
    pub(crate) feed: WeatherFeed,
    pub(crate) plots: PlotStore,
    pub(crate) wallet: Wallet,
    pub(crate) progression: Progression,
    pub(crate) care: CareTracker,
    pub(crate) seed: u64,
    pub(crate) next_plant_id: PlantId,
    pub(crate) paused: bool,
    /// Notifications raised by actions between ticks, flushed with the
    /// next tick's batch.
    pub(crate) pending: Vec<Notification>,
}

impl SimulationContext {
    /// A fresh farm built from configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ContextError> {
        config.validate()?;
        let species = config.species_table()?;
        let clock = FarmClock::new(&config.time)?;
        let seed = config.world.seed;
        let mut rng = stream_rng(seed, 0, RngStream::Genesis);
        let weather = WeatherEngine::new(
            config.weather.change_interval_ticks,
            clock.season(),
            &mut rng,
        )?;
        let plots = PlotStore::new(config.farm.cols, config.farm.rows, config.farm.unlocked_plots)?;

        let mut wallet = Wallet::with_coins(config.farm.starting_coins);
        for (species_id, count) in &config.farm.starting_seeds {
            wallet.add_seeds(*species_id, *count)?;
        }
        wallet.add_fertilizer(config.farm.starting_fertilizer)?;
        wallet.add_sprinklers(config.farm.starting_sprinklers)?;

        info!(
            farm = %config.world.name,
            seed,
            plots = plots.len(),
            unlocked = plots.unlocked_count(),
            mode = ?config.farm.harvest_mode,
            "farm created"
        );

        Ok(Self {
            config,
            species,
            clock,
            weather,
            feed: WeatherFeed::disabled(),
            plots,
            wallet,
            progression: Progression::default(),
            care: CareTracker::new(),
            seed,
            next_plant_id: PlantId::FIRST,
            paused: false,
            pending: Vec::new(),
        })
    }

    /// Attach an external weather source.
    pub fn set_weather_source(&mut self, source: Arc<dyn WeatherSource>) {
        self.feed = WeatherFeed::new(source);
    }

    /// Issue the first external weather request, if a source is attached.
    pub fn prime_weather_feed(&mut self) {
        self.feed.prime();
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// The configuration this farm runs under.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current tick.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Current season.
    pub fn season(&self) -> Season {
        self.clock.season()
    }

    /// The farm clock.
    pub const fn clock(&self) -> &FarmClock {
        &self.clock
    }

    /// Weather in effect.
    pub const fn weather(&self) -> &WeatherState {
        self.weather.current()
    }

    /// The weather engine.
    pub const fn weather_engine(&self) -> &WeatherEngine {
        &self.weather
    }

    /// The plot grid.
    pub const fn plots(&self) -> &PlotStore {
        &self.plots
    }

    /// Resources held.
    pub const fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Level and lifetime totals.
    pub const fn progression(&self) -> &Progression {
        &self.progression
    }

    /// Care ledgers.
    pub const fn care(&self) -> &CareTracker {
        &self.care
    }

    /// Species stats in effect.
    pub const fn species(&self) -> &SpeciesTable {
        &self.species
    }

    /// World seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// How harvests are scored.
    pub const fn harvest_mode(&self) -> HarvestMode {
        self.config.farm.harvest_mode
    }

    /// Plots unlocked by a default expansion.
    pub const fn plots_per_expansion(&self) -> usize {
        self.config.economy.plots_per_expansion
    }

    /// Whether ticks are currently no-ops.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Predict the next `count` weather transitions.
    ///
    /// Uses a dedicated random stream, so asking for a forecast never
    /// changes what the farm will actually see.
    pub fn forecast(&self, count: usize) -> Vec<ForecastEntry> {
        let mut rng = stream_rng(self.seed, self.clock.tick(), RngStream::Forecast);
        self.weather
            .forecast(count, |tick| self.clock.season_at(tick), &mut rng)
    }

    /// Care grade a plant would receive if harvested now.
    pub fn grade(&self, plant: PlantId) -> Grade {
        self.care.grade(plant)
    }

    /// What harvesting `index` would pay right now.
    pub fn appraise(&self, index: usize) -> Option<Appraisal> {
        let mode = self.harvest_mode();
        let grade = match mode {
            HarvestMode::CareGrade => {
                let plant = self.plots.get(index)?.crop.as_ref()?.plant_id;
                Some(self.care.grade(plant))
            }
            HarvestMode::Yield => None,
        };
        EconomyCalculator::new(&self.species).appraise(
            &self.plots,
            index,
            self.clock.season(),
            mode,
            grade,
        )
    }

    /// Read-only snapshot of the whole farm for collaborators.
    pub fn view(&self) -> FarmView {
        FarmView::capture(self)
    }

    /// Read-only detail for one plot.
    pub fn plot_detail(&self, index: usize) -> Option<PlotDetail> {
        PlotDetail::capture(self, index)
    }

    // -----------------------------------------------------------------
    // Scheduler control
    // -----------------------------------------------------------------

    /// Make subsequent ticks no-ops.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            info!(tick = self.clock.tick(), "farm paused");
        }
    }

    /// Resume ticking exactly where the counter left off.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            info!(tick = self.clock.tick(), "farm resumed");
        }
    }

    // -----------------------------------------------------------------
    // Player actions
    // -----------------------------------------------------------------

    /// Plant a seed of `species` on `index`.
    pub fn plant(&mut self, index: usize, species: SpeciesId) -> Result<(), ActionRejection> {
        let previous = self
            .plots
            .get(index)
            .ok_or(ActionRejection::InvalidPlot)?
            .last_species;
        let rotation_bonus = EconomyCalculator::new(&self.species).rotation_bonus(previous, species);
        let plant_id = self.next_plant_id;
        let following = plant_id.next().ok_or(ActionRejection::Overflow)?;
        self.plots.plant(
            index,
            species,
            plant_id,
            self.clock.tick(),
            rotation_bonus,
            &mut self.wallet,
        )?;
        self.next_plant_id = following;
        Ok(())
    }

    /// Water `index` by hand.
    pub fn water(&mut self, index: usize) -> Result<(), ActionRejection> {
        self.plots.water(index, self.clock.tick())?;
        if let Some(plant) = self.living_plant(index) {
            self.record_care(plant, true);
        }
        Ok(())
    }

    /// Fertilize `index`.
    pub fn fertilize(&mut self, index: usize) -> Result<(), ActionRejection> {
        self.plots.fertilize(index, &mut self.wallet)
    }

    /// Install a spare sprinkler on `index`.
    pub fn install_sprinkler(&mut self, index: usize) -> Result<(), ActionRejection> {
        self.plots.install_sprinkler(index, &mut self.wallet)
    }

    /// Harvest a ready crop on `index`.
    ///
    /// Produce is sold immediately. Experience may trigger a level-up,
    /// whose notification is delivered with the next tick.
    pub fn harvest(&mut self, index: usize) -> Result<HarvestResult, ActionRejection> {
        let plot = self.plots.get(index).ok_or(ActionRejection::InvalidPlot)?;
        if !plot.unlocked {
            return Err(ActionRejection::PlotLocked);
        }
        let crop = plot.crop.as_ref().ok_or(ActionRejection::PlotEmpty)?;
        let (plant_id, species) = (crop.plant_id, crop.species);
        let appraisal = self.appraise(index).ok_or(ActionRejection::NotReady)?;

        let mut wallet = self.wallet.clone();
        wallet.earn(appraisal.earnings)?;
        self.plots.harvest(index)?;
        self.wallet = wallet;
        self.care.remove(plant_id);
        self.progression
            .record_harvest(appraisal.quantity, appraisal.earnings);

        info!(
            plot = index,
            %species,
            quantity = appraisal.quantity,
            earnings = appraisal.earnings,
            grade = ?appraisal.grade,
            "harvested"
        );

        if let Some(level_up) = self.progression.gain_experience(appraisal.experience) {
            self.reward_level_up(level_up);
        }

        Ok(HarvestResult {
            plot: index,
            plant_id,
            species,
            quantity: appraisal.quantity,
            earnings: appraisal.earnings,
            experience: appraisal.experience,
            grade: appraisal.grade,
        })
    }

    /// Remove a sick or dead crop from `index`, discarding its care history.
    pub fn clear(&mut self, index: usize) -> Result<(), ActionRejection> {
        let crop = self.plots.clear(index)?;
        self.care.remove(crop.plant_id);
        Ok(())
    }

    /// Unlock up to `count` plots. Returns how many were unlocked.
    pub fn expand(&mut self, count: usize) -> Result<usize, ActionRejection> {
        self.plots
            .expand(count, self.config.economy.plot_unlock_cost, &mut self.wallet)
    }

    /// Unlock the configured batch of plots.
    pub fn expand_default(&mut self) -> Result<usize, ActionRejection> {
        self.expand(self.plots_per_expansion())
    }

    /// Buy from the shop. Returns the coins spent.
    pub fn buy(&mut self, item: ShopItem) -> Result<u64, ActionRejection> {
        let prices = ShopPrices {
            fertilizer: self.config.economy.fertilizer_price,
            sprinkler: self.config.economy.sprinkler_price,
        };
        purchase(&mut self.wallet, item, &self.species, prices)
    }

    /// Install special weather for the next `duration` ticks.
    ///
    /// The coming tick is the first one whose plots grow under it.
    pub fn force_weather(&mut self, kind: WeatherKind, duration: u64) {
        let tick = self.clock.tick();
        let first_tick = tick.saturating_add(1);
        let mut rng = stream_rng(self.seed, tick, RngStream::Command);
        let state = self
            .weather
            .force(kind, self.clock.season(), first_tick, duration, &mut rng)
            .clone();
        info!(first_tick, ?kind, duration, "weather forced by operator");
        self.pending.push(Notification {
            tick: first_tick,
            event: FarmEvent::WeatherChanged { weather: state },
        });
    }

    // -----------------------------------------------------------------
    // Internal helpers shared with the tick pipeline
    // -----------------------------------------------------------------

    fn living_plant(&self, index: usize) -> Option<PlantId> {
        let crop = self.plots.get(index)?.crop.as_ref()?;
        crop.stage.is_alive().then_some(crop.plant_id)
    }

    fn record_care(&mut self, plant: PlantId, watered: bool) {
        if self.harvest_mode() == HarvestMode::CareGrade {
            let quality = self.weather.current().quality();
            self.care
                .record_day(plant, self.clock.date(), watered, quality);
        }
    }

    pub(crate) fn reward_level_up(&mut self, level_up: LevelUp) {
        if let Err(reason) = self.wallet.earn(level_up.reward) {
            warn!(level = level_up.level, %reason, "level-up reward not credited");
        }
        info!(level = level_up.level, reward = level_up.reward, "level up");
        self.pending.push(Notification {
            tick: self.clock.tick(),
            event: FarmEvent::LevelUp {
                level: level_up.level,
                reward: level_up.reward,
            },
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tilth_types::GrowthStage;

    use super::*;

    fn farm() -> SimulationContext {
        SimulationContext::new(SimulationConfig::default()).unwrap()
    }

    fn ripen(ctx: &mut SimulationContext, index: usize) {
        let plot = ctx.plots.plots_mut().get_mut(index).unwrap();
        let crop = plot.crop.as_mut().unwrap();
        crop.stage = GrowthStage::Ready;
        crop.health = 1.0;
    }

    #[test]
    fn new_farm_uses_starting_resources() {
        let ctx = farm();
        assert_eq!(ctx.tick(), 0);
        assert_eq!(ctx.wallet().coins(), 100);
        assert_eq!(ctx.wallet().seeds(SpeciesId::Wheat), 3);
        assert_eq!(ctx.plots().unlocked_count(), 12);
        assert_eq!(ctx.weather().kind, WeatherKind::Sunny);
    }

    #[test]
    fn plant_assigns_sequential_ids() {
        let mut ctx = farm();
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        ctx.plant(1, SpeciesId::Wheat).unwrap();
        let first = ctx.plots().get(0).unwrap().crop.as_ref().unwrap().plant_id;
        let second = ctx.plots().get(1).unwrap().crop.as_ref().unwrap().plant_id;
        assert_eq!(first, PlantId::new(1));
        assert_eq!(second, PlantId::new(2));
    }

    #[test]
    fn rejected_plant_consumes_nothing() {
        let mut ctx = farm();
        assert_eq!(
            ctx.plant(0, SpeciesId::Corn),
            Err(ActionRejection::InsufficientSeeds)
        );
        assert_eq!(ctx.plant(20, SpeciesId::Wheat), Err(ActionRejection::PlotLocked));
        assert_eq!(ctx.plant(99, SpeciesId::Wheat), Err(ActionRejection::InvalidPlot));
        assert_eq!(ctx.wallet().seeds(SpeciesId::Wheat), 3);
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        assert_eq!(ctx.plots().get(0).unwrap().crop.as_ref().unwrap().plant_id, PlantId::FIRST);
    }

    #[test]
    fn harvest_pays_and_clears() {
        let mut ctx = farm();
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        assert_eq!(ctx.harvest(0), Err(ActionRejection::NotReady));
        ripen(&mut ctx, 0);

        let result = ctx.harvest(0).unwrap();
        // 3 base yield in spring, 8 coins each.
        assert_eq!(result.quantity, 3);
        assert_eq!(result.earnings, 24);
        assert_eq!(ctx.wallet().coins(), 124);
        assert!(ctx.plots().get(0).unwrap().crop.is_none());
        assert_eq!(ctx.progression().total_harvested, 3);
        assert_eq!(ctx.harvest(0), Err(ActionRejection::PlotEmpty));
    }

    #[test]
    fn level_up_is_rewarded_and_queued() {
        let mut ctx = farm();
        ctx.progression.experience = 48;
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        ripen(&mut ctx, 0);
        ctx.harvest(0).unwrap();
        assert_eq!(ctx.progression().level, 2);
        // 24 from the sale, 40 from reaching level 2.
        assert_eq!(ctx.wallet().coins(), 164);
        assert!(matches!(
            ctx.pending.last().map(|n| &n.event),
            Some(FarmEvent::LevelUp { level: 2, reward: 40 })
        ));
    }

    #[test]
    fn watering_records_care_in_grade_mode() {
        let mut config = SimulationConfig::default();
        config.farm.harvest_mode = HarvestMode::CareGrade;
        let mut ctx = SimulationContext::new(config).unwrap();
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        ctx.water(0).unwrap();
        let plant = ctx.plots().get(0).unwrap().crop.as_ref().unwrap().plant_id;
        assert_eq!(ctx.care().history(plant).len(), 1);
        assert!(ctx.care().history(plant).first().unwrap().watered);
    }

    #[test]
    fn watering_skips_care_in_yield_mode() {
        let mut ctx = farm();
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        ctx.water(0).unwrap();
        assert!(ctx.care().ledgers().is_empty());
    }

    #[test]
    fn expand_charges_per_plot() {
        let mut ctx = farm();
        assert_eq!(ctx.expand(2), Ok(2));
        assert_eq!(ctx.wallet().coins(), 50);
        assert_eq!(ctx.plots().unlocked_count(), 14);
        assert_eq!(ctx.expand_default(), Err(ActionRejection::InsufficientFunds));
    }

    #[test]
    fn buy_uses_configured_prices() {
        let mut ctx = farm();
        assert_eq!(ctx.buy(ShopItem::Fertilizer { quantity: 2 }), Ok(50));
        assert_eq!(ctx.wallet().fertilizer(), 2);
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        ctx.fertilize(0).unwrap();
        assert_eq!(ctx.fertilize(0), Err(ActionRejection::AlreadyFertilized));
    }

    #[test]
    fn clear_requires_dead_or_sick_crop() {
        let mut ctx = farm();
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        assert_eq!(ctx.clear(0), Err(ActionRejection::CropAlive));
        ctx.plots.plots_mut().first_mut().unwrap().crop.as_mut().unwrap().stage = GrowthStage::Dead;
        assert_eq!(ctx.clear(0), Ok(()));
        assert!(ctx.plots().get(0).unwrap().is_free());
    }

    #[test]
    fn forecast_does_not_disturb_weather() {
        let ctx = farm();
        let before = ctx.weather().clone();
        let forecast = ctx.forecast(3);
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast.first().unwrap().tick, 15);
        assert_eq!(ctx.weather(), &before);
        assert_eq!(ctx.forecast(3), forecast);
    }

    #[test]
    fn forced_weather_is_announced() {
        let mut ctx = farm();
        ctx.force_weather(WeatherKind::Rainy, 10);
        assert_eq!(ctx.weather().kind, WeatherKind::Rainy);
        assert_eq!(ctx.weather_engine().next_transition_tick(), 11);
        assert_eq!(ctx.pending.len(), 1);
    }
}
