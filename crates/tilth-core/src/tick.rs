//! The per-tick effect pipeline.
//!
//! Each call to [`run_tick`] runs these phases in order, all against the
//! same [`SimulationContext`] and a single random stream derived from the
//! world seed and the new tick:
//!
//! 1. **Boundary** -- apply queued player commands.
//! 2. **Clock** -- advance the tick counter, announce a new season.
//! 3. **Weather** -- transition if due, consulting the external feed slot.
//! 4. **Plots** -- for every unlocked plot: crop growth, then the disease
//!    and pest check, then sprinkler and rain watering, then the day's
//!    care record.
//! 5. **Special events** -- roll for a rare farm-wide event.
//! 6. **Summary** -- batch every notification into one [`TickSummary`].
//!
//! A paused context makes the call a no-op. The counter is never advanced
//! while paused, so resuming continues exactly where it stopped.

use chrono::NaiveDate;
use serde::Serialize;
use tilth_types::{FarmEvent, GrowthStage, HarvestMode, Notification, Season, WeatherState};
use tilth_world::{disease, growth};
use tracing::{debug, info, warn};

use crate::commands::{CommandResult, QueuedCommand};
use crate::context::SimulationContext;
use crate::events::{self, SpecialEffect};
use crate::rng::{RngStream, stream_rng};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: crate::clock::ClockError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// The season during this tick.
    pub season: Season,
    /// Calendar date of this tick.
    pub date: NaiveDate,
    /// The weather at the end of this tick.
    pub weather: WeatherState,
    /// Whether the weather changed during this tick.
    pub weather_changed: bool,
    /// Everything noteworthy that happened, in order.
    pub notifications: Vec<Notification>,
    /// Outcomes of commands applied at the start of this tick.
    pub command_results: Vec<CommandResult>,
    /// Living crops not yet ready.
    pub crops_growing: usize,
    /// Crops waiting to be harvested.
    pub crops_ready: usize,
    /// Coin balance after the tick.
    pub coins: u64,
}

/// Execute one tick.
///
/// Returns `Ok(None)` without touching anything when the context is paused.
/// Commands passed to a paused context are dropped, so callers should only
/// drain their queue when [`SimulationContext::is_paused`] is false.
pub fn run_tick(
    context: &mut SimulationContext,
    commands: Vec<QueuedCommand>,
) -> Result<Option<TickSummary>, TickError> {
    if context.paused {
        debug!(tick = context.clock.tick(), "tick skipped while paused");
        return Ok(None);
    }

    // --- Phase 1: Boundary ---
    let command_results: Vec<CommandResult> = commands
        .into_iter()
        .map(|queued| CommandResult {
            id: queued.id,
            command: queued.command,
            outcome: queued.command.apply(context),
        })
        .collect();

    // --- Phase 2: Clock ---
    let tick = context.clock.advance()?;
    let season = context.clock.season();
    let date = context.clock.date();
    let mut rng = stream_rng(context.seed, tick, RngStream::Tick);
    let mut notifications = std::mem::take(&mut context.pending);
    let mut notify = |event: FarmEvent| notifications.push(Notification { tick, event });

    if context.clock.season_at(tick.saturating_sub(1)) != season {
        info!(tick, %season, "season changed");
        notify(FarmEvent::SeasonChanged { season });
    }

    // --- Phase 3: Weather ---
    let feed = &mut context.feed;
    let transitioned = context
        .weather
        .advance(tick, season, || feed.collect(tick), &mut rng)
        .cloned();
    let mut weather_changed = false;
    if let Some(state) = transitioned {
        context.feed.request();
        weather_changed = true;
        notify(FarmEvent::WeatherChanged { weather: state });
    }

    // --- Phase 4: Plots ---
    let weather = context.weather.current().clone();
    let quality = weather.quality();
    let economy = &context.config.economy;
    let track_care = context.config.farm.harvest_mode == HarvestMode::CareGrade;
    let mut care_marks = Vec::new();

    for (index, plot) in context.plots.plots_mut().iter_mut().enumerate() {
        if !plot.unlocked {
            continue;
        }

        if let Some(species) = plot.crop.as_ref().map(|c| c.species) {
            let stats = context.species.get(species);
            if let Some(outcome) = growth::update(plot, stats, &weather, &mut rng) {
                if outcome.became_ready() {
                    debug!(tick, plot = index, %species, "crop ready");
                    notify(FarmEvent::Ready { plot: index, species });
                }
                if outcome.fell_sick() {
                    info!(tick, plot = index, %species, "crop fell sick");
                    notify(FarmEvent::Sick { plot: index, species });
                }
                if outcome.died() {
                    info!(tick, plot = index, %species, "crop died");
                    notify(FarmEvent::Died { plot: index, species });
                }
            }
        }

        if let Some(outbreak) = disease::check(plot, &weather, &mut rng) {
            info!(
                tick,
                plot = index,
                disease = ?outbreak.kind,
                damage = outbreak.damage,
                "outbreak"
            );
            notify(FarmEvent::Disease {
                plot: index,
                disease: outbreak.kind,
                damage: outbreak.damage,
            });
        }

        let mut auto_watered = false;
        if plot.has_sprinkler {
            plot.add_water(economy.sprinkler_water);
            auto_watered = true;
        }
        if weather.effects.auto_water {
            plot.add_water(economy.rain_water);
            plot.add_pollution(-economy.rain_pollution_wash);
            auto_watered = true;
        }
        if auto_watered {
            plot.last_watered_tick = tick;
        }

        if track_care {
            if let Some(crop) = plot.crop.as_ref().filter(|c| c.stage.is_alive()) {
                care_marks.push((crop.plant_id, auto_watered));
            }
        }
    }

    for (plant, watered) in care_marks {
        context.care.record_day(plant, date, watered, quality);
    }

    // --- Phase 5: Special events ---
    if let Some((kind, effect)) = events::roll(&mut rng) {
        let mut coins = 0;
        let mut forced = None;
        match effect {
            SpecialEffect::Weather {
                kind: weather_kind,
                duration,
            } => {
                // Plots of this tick are already done; the spell starts next tick.
                let state = context
                    .weather
                    .force(weather_kind, season, tick.saturating_add(1), duration, &mut rng)
                    .clone();
                forced = Some(state);
            }
            SpecialEffect::Coins(amount) => match context.wallet.earn(amount) {
                Ok(()) => coins = amount,
                Err(reason) => warn!(tick, %reason, "coin shower not credited"),
            },
        }
        info!(tick, event = ?kind, coins, "special event");
        notify(FarmEvent::SpecialEvent { event: kind, coins });
        if let Some(state) = forced {
            weather_changed = true;
            notify(FarmEvent::WeatherChanged { weather: state });
        }
    }

    // --- Phase 6: Summary ---
    let (crops_growing, crops_ready) = count_crops(context);
    let summary = TickSummary {
        tick,
        season,
        date,
        weather: context.weather.current().clone(),
        weather_changed,
        notifications,
        command_results,
        crops_growing,
        crops_ready,
        coins: context.wallet.coins(),
    };

    debug!(
        tick,
        notifications = summary.notifications.len(),
        commands = summary.command_results.len(),
        "tick completed"
    );
    Ok(Some(summary))
}

fn count_crops(context: &SimulationContext) -> (usize, usize) {
    context
        .plots
        .plots()
        .iter()
        .filter_map(|p| p.crop.as_ref())
        .fold((0, 0), |(growing, ready), crop| match crop.stage {
            GrowthStage::Ready => (growing, ready.saturating_add(1)),
            GrowthStage::Dead => (growing, ready),
            _ => (growing.saturating_add(1), ready),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tilth_types::{CommandId, SpeciesId, WeatherKind};

    use super::*;
    use crate::commands::FarmCommand;
    use crate::config::SimulationConfig;

    fn farm() -> SimulationContext {
        SimulationContext::new(SimulationConfig::default()).unwrap()
    }

    fn tick(ctx: &mut SimulationContext) -> TickSummary {
        run_tick(ctx, Vec::new()).unwrap().unwrap()
    }

    #[test]
    fn paused_tick_is_a_noop() {
        let mut ctx = farm();
        ctx.pause();
        assert!(run_tick(&mut ctx, Vec::new()).unwrap().is_none());
        assert_eq!(ctx.tick(), 0);
        ctx.resume();
        assert_eq!(tick(&mut ctx).tick, 1);
    }

    #[test]
    fn weather_changes_only_when_due() {
        let mut ctx = farm();
        let mut transitions = 0;
        for _ in 0..60 {
            let due = ctx.weather_engine().is_transition_due(ctx.tick() + 1);
            let summary = tick(&mut ctx);
            let special = summary
                .notifications
                .iter()
                .any(|n| matches!(n.event, FarmEvent::SpecialEvent { .. }));
            if !special {
                assert_eq!(summary.weather_changed, due, "tick {}", summary.tick);
            }
            if due {
                transitions += 1;
                assert!(
                    summary
                        .notifications
                        .iter()
                        .any(|n| matches!(n.event, FarmEvent::WeatherChanged { .. }))
                );
            }
        }
        assert!(transitions >= 3);
    }

    #[test]
    fn season_change_is_announced_once() {
        let mut ctx = farm();
        let mut announcements = Vec::new();
        for _ in 0..210 {
            let summary = tick(&mut ctx);
            for n in summary.notifications {
                if let FarmEvent::SeasonChanged { season } = n.event {
                    announcements.push((n.tick, season));
                }
            }
        }
        assert_eq!(
            announcements,
            vec![(100, Season::Summer), (200, Season::Fall)]
        );
    }

    #[test]
    fn commands_apply_before_growth() {
        let mut ctx = farm();
        let summary = run_tick(
            &mut ctx,
            vec![
                QueuedCommand::new(CommandId::new(1), FarmCommand::Plant {
                    plot: 0,
                    species: SpeciesId::Wheat,
                }),
                QueuedCommand::new(CommandId::new(2), FarmCommand::Plant {
                    plot: 99,
                    species: SpeciesId::Wheat,
                }),
            ],
        )
        .unwrap()
        .unwrap();
        assert_eq!(summary.command_results.len(), 2);
        let crop = ctx.plots().get(0).unwrap().crop.as_ref().unwrap();
        assert!(crop.growth_progress > 0.0);
        assert_eq!(summary.crops_growing, 1);
    }

    #[test]
    fn wheat_ripens_and_is_announced() {
        let mut ctx = farm();
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        let mut ready_at = None;
        for _ in 0..30 {
            ctx.water(0).unwrap();
            let summary = tick(&mut ctx);
            if summary
                .notifications
                .iter()
                .any(|n| matches!(n.event, FarmEvent::Ready { plot: 0, .. }))
            {
                ready_at = Some(summary.tick);
                break;
            }
        }
        assert!(ready_at.is_some());
        assert!(ctx.harvest(0).is_ok());
    }

    #[test]
    fn sprinkler_keeps_plot_watered() {
        let mut config = SimulationConfig::default();
        config.farm.starting_sprinklers = 1;
        let mut ctx = SimulationContext::new(config).unwrap();
        ctx.install_sprinkler(3).unwrap();
        ctx.plots.plots_mut().get_mut(3).unwrap().water_level = 0.0;
        let summary = tick(&mut ctx);
        let plot = ctx.plots().get(3).unwrap();
        assert!(plot.water_level >= 0.1 - 1e-9);
        assert_eq!(plot.last_watered_tick, summary.tick);
    }

    #[test]
    fn rain_waters_and_washes_pollution() {
        let mut ctx = farm();
        ctx.force_weather(WeatherKind::Rainy, 10);
        {
            let plot = ctx.plots.plots_mut().get_mut(1).unwrap();
            plot.water_level = 0.0;
            plot.pollution = 0.5;
        }
        tick(&mut ctx);
        let plot = ctx.plots().get(1).unwrap();
        assert!((plot.water_level - 0.1).abs() < 1e-9);
        assert!((plot.pollution - 0.48).abs() < 1e-9);
    }

    #[test]
    fn care_mode_records_each_day_once() {
        let mut config = SimulationConfig::default();
        config.farm.harvest_mode = HarvestMode::CareGrade;
        let mut ctx = SimulationContext::new(config).unwrap();
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        let plant = ctx.plots().get(0).unwrap().crop.as_ref().unwrap().plant_id;
        for _ in 0..25 {
            tick(&mut ctx);
        }
        // Ticks 1..=25 span days 0, 1 and 2.
        assert_eq!(ctx.care().history(plant).len(), 3);
    }

    #[test]
    fn level_up_from_harvest_arrives_with_next_tick() {
        let mut ctx = farm();
        ctx.progression.experience = 49;
        ctx.plant(0, SpeciesId::Wheat).unwrap();
        {
            let crop = ctx.plots.plots_mut().first_mut().unwrap().crop.as_mut().unwrap();
            crop.stage = GrowthStage::Ready;
        }
        ctx.harvest(0).unwrap();
        let summary = tick(&mut ctx);
        assert!(
            summary
                .notifications
                .iter()
                .any(|n| matches!(n.event, FarmEvent::LevelUp { level: 2, .. }))
        );
        assert!(ctx.pending.is_empty());
    }
}
