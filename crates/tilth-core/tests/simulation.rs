//! End-to-end properties of the tick pipeline: determinism, snapshot
//! continuity, plot invariants under arbitrary play, both growth-stage
//! topologies, forced weather spells and the external weather feed.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::too_many_lines)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tilth_core::commands::{FarmCommand, QueuedCommand};
use tilth_core::config::SpeciesOverride;
use tilth_core::feed::{FeedError, PendingObservation, WeatherSource};
use tilth_core::{FarmSnapshot, SimulationConfig, SimulationContext, TickSummary, run_tick};
use tilth_economy::ShopItem;
use tilth_types::{
    CommandId, ConditionCategory, FarmEvent, GrowthStage, ObservedWeather, PlantId, SpeciesId,
    StageTopology, WeatherKind,
};
use tokio::sync::oneshot;

fn rich_config(seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.world.seed = seed;
    config.farm.starting_coins = 5_000;
    config.farm.starting_fertilizer = 10;
    config.farm.starting_seeds = SpeciesId::ALL.iter().map(|s| (*s, 20)).collect();
    config
}

fn step(ctx: &mut SimulationContext) -> TickSummary {
    run_tick(ctx, Vec::new()).unwrap().unwrap()
}

/// A scripted player: waters everything, harvests what is ready, replants
/// wheat and clears the dead.
fn tend(ctx: &mut SimulationContext) {
    for index in 0..ctx.plots().len() {
        let _ = ctx.harvest(index);
        let _ = ctx.clear(index);
        let _ = ctx.plant(index, SpeciesId::Wheat);
        let _ = ctx.water(index);
    }
}

#[test]
fn same_seed_same_farm() {
    let mut a = SimulationContext::new(rich_config(7)).unwrap();
    let mut b = SimulationContext::new(rich_config(7)).unwrap();
    for _ in 0..300 {
        tend(&mut a);
        tend(&mut b);
        let sa = serde_json::to_value(step(&mut a)).unwrap();
        let sb = serde_json::to_value(step(&mut b)).unwrap();
        assert_eq!(sa, sb);
    }
    assert_eq!(a.export_snapshot(), b.export_snapshot());
}

#[test]
fn different_seeds_diverge() {
    let mut a = SimulationContext::new(rich_config(1)).unwrap();
    let mut b = SimulationContext::new(rich_config(2)).unwrap();
    let mut kinds_a = Vec::new();
    let mut kinds_b = Vec::new();
    for _ in 0..300 {
        kinds_a.push(step(&mut a).weather.kind);
        kinds_b.push(step(&mut b).weather.kind);
    }
    assert_ne!(kinds_a, kinds_b);
}

#[test]
fn restored_farm_continues_identically() {
    let mut original = SimulationContext::new(rich_config(11)).unwrap();
    for _ in 0..120 {
        tend(&mut original);
        step(&mut original);
    }
    let json = original.export_snapshot().to_json().unwrap();
    let mut restored =
        SimulationContext::restore(rich_config(11), FarmSnapshot::from_json(&json).unwrap())
            .unwrap();

    for _ in 0..120 {
        tend(&mut original);
        tend(&mut restored);
        assert_eq!(step(&mut original), step(&mut restored));
    }
    assert_eq!(original.export_snapshot(), restored.export_snapshot());
}

#[test]
fn invariants_hold_under_random_play() {
    let mut ctx = SimulationContext::new(rich_config(3)).unwrap();
    let mut player = StdRng::seed_from_u64(99);
    let mut last_stage: BTreeMap<PlantId, GrowthStage> = BTreeMap::new();
    let len = ctx.plots().len();

    for _ in 0..1_500 {
        for _ in 0..3 {
            let plot = player.random_range(0..len);
            let species = SpeciesId::ALL[player.random_range(0..SpeciesId::ALL.len())];
            let command = match player.random_range(0..9) {
                0 | 1 => FarmCommand::Plant { plot, species },
                2 | 3 => FarmCommand::Water { plot },
                4 => FarmCommand::Fertilize { plot },
                5 => FarmCommand::Clear { plot },
                6 => FarmCommand::Expand { count: Some(1) },
                7 => FarmCommand::Buy {
                    item: ShopItem::Fertilizer { quantity: 1 },
                },
                _ => FarmCommand::Harvest { plot },
            };

            if let FarmCommand::Harvest { plot } = command {
                let before = ctx.plots().get(plot).unwrap().clone();
                let ready = before.unlocked
                    && before.crop.as_ref().is_some_and(|c| c.stage == GrowthStage::Ready);
                let result = ctx.harvest(plot);
                assert_eq!(result.is_ok(), ready, "harvest on {before:?}");
                if result.is_ok() {
                    let after = ctx.plots().get(plot).unwrap();
                    assert!(after.crop.is_none());
                    assert!(!after.fertilized);
                }
            } else {
                command.apply(&mut ctx);
            }
        }

        step(&mut ctx);

        let mut seen = BTreeMap::new();
        for plot in ctx.plots().plots() {
            assert!((0.0..=1.0).contains(&plot.water_level), "{plot:?}");
            assert!((0.0..=1.0).contains(&plot.pollution), "{plot:?}");
            let Some(crop) = &plot.crop else { continue };
            assert!(plot.unlocked);
            assert!((0.1..=1.0).contains(&crop.health), "{crop:?}");
            if let Some(previous) = last_stage.get(&crop.plant_id) {
                match previous {
                    GrowthStage::Dead => assert_eq!(crop.stage, GrowthStage::Dead),
                    GrowthStage::Sick => {
                        assert!(matches!(crop.stage, GrowthStage::Sick | GrowthStage::Dead));
                    }
                    _ if crop.stage.on_growth_line() => assert!(crop.stage >= *previous),
                    _ => {}
                }
            }
            seen.insert(crop.plant_id, crop.stage);
        }
        last_stage = seen;
    }
}

/// Apples that stay thirsty unless the plot is brim full.
fn parched_apples(topology: StageTopology) -> SimulationConfig {
    let mut config = rich_config(5);
    config.farm.starting_seeds = BTreeMap::from([(SpeciesId::Apple, 1)]);
    config.species.insert(
        SpeciesId::Apple,
        SpeciesOverride {
            water_need: Some(1.0),
            topology: Some(topology),
            ..SpeciesOverride::default()
        },
    );
    config
}

#[test]
fn neglected_tree_dies_under_full_topology() {
    let mut ctx = SimulationContext::new(parched_apples(StageTopology::Full)).unwrap();
    ctx.plant(0, SpeciesId::Apple).unwrap();

    let mut died = false;
    for _ in 0..400 {
        let summary = step(&mut ctx);
        if summary
            .notifications
            .iter()
            .any(|n| matches!(n.event, FarmEvent::Died { plot: 0, .. }))
        {
            died = true;
            break;
        }
    }
    assert!(died);
    let crop = ctx.plots().get(0).unwrap().crop.as_ref().unwrap();
    assert_eq!(crop.stage, GrowthStage::Dead);
    assert!(ctx.harvest(0).is_err());
    assert!(ctx.clear(0).is_ok());
}

// Two growth-stage topologies coexist: the seven-stage machine with Sick
// and Dead branches, and a five-stage line without them. Which one a
// species follows is configuration, not an assumption baked into the
// pipeline.
#[test]
fn neglected_tree_never_dies_under_simple_topology() {
    let mut ctx = SimulationContext::new(parched_apples(StageTopology::Simple)).unwrap();
    ctx.plant(0, SpeciesId::Apple).unwrap();

    for _ in 0..400 {
        step(&mut ctx);
        let crop = ctx.plots().get(0).unwrap().crop.as_ref().unwrap();
        assert!(crop.stage.on_growth_line(), "{crop:?}");
    }
    let crop = ctx.plots().get(0).unwrap().crop.as_ref().unwrap();
    assert_eq!(crop.stage, GrowthStage::Ready);
    assert!((crop.health - 0.1).abs() < 1e-9);
    assert!(ctx.harvest(0).is_ok());
}

fn special_event(summary: &TickSummary) -> bool {
    summary
        .notifications
        .iter()
        .any(|n| matches!(n.event, FarmEvent::SpecialEvent { .. }))
}

/// Ticks, out of the six after the command, that ran under `kind`.
fn forced_spell(kind: WeatherKind, duration: u64) -> (Vec<u64>, bool) {
    let mut ctx = SimulationContext::new(rich_config(21)).unwrap();
    for _ in 0..3 {
        step(&mut ctx);
    }
    let command = QueuedCommand::new(CommandId::new(1), FarmCommand::ForceWeather {
        kind,
        duration,
    });
    let first = run_tick(&mut ctx, vec![command]).unwrap().unwrap();
    let announced = first
        .notifications
        .iter()
        .any(|n| matches!(n.event, FarmEvent::WeatherChanged { .. }));

    let mut ticks = Vec::new();
    let mut summary = first;
    for _ in 0..6 {
        assert!(!special_event(&summary), "special event at {}", summary.tick);
        if summary.weather.kind == kind {
            ticks.push(summary.tick);
        }
        summary = step(&mut ctx);
    }
    (ticks, announced)
}

#[test]
fn forced_weather_lasts_its_full_duration() {
    let (ticks, announced) = forced_spell(WeatherKind::Drought, 1);
    assert!(announced);
    assert_eq!(ticks, vec![4]);

    let (ticks, _) = forced_spell(WeatherKind::Drought, 3);
    assert_eq!(ticks, vec![4, 5, 6]);
}

#[test]
fn forced_weather_reaches_the_plots() {
    let mut ctx = SimulationContext::new(rich_config(21)).unwrap();
    {
        let command = QueuedCommand::new(CommandId::new(1), FarmCommand::ForceWeather {
            kind: WeatherKind::Rainy,
            duration: 1,
        });
        let summary = run_tick(&mut ctx, vec![command]).unwrap().unwrap();
        assert_eq!(summary.weather.kind, WeatherKind::Rainy);
    }
    // Rain on the only forced tick tops every unlocked plot up.
    assert!(
        ctx.plots()
            .plots()
            .iter()
            .filter(|p| p.unlocked)
            .all(|p| p.last_watered_tick == 1)
    );
}

/// Answers every request at once with the same result and counts requests.
struct Instant {
    answer: Result<ObservedWeather, FeedError>,
    requests: AtomicUsize,
}

impl Instant {
    fn new(answer: Result<ObservedWeather, FeedError>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            requests: AtomicUsize::new(0),
        })
    }
}

impl WeatherSource for Instant {
    fn request(&self) -> PendingObservation {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(self.answer.clone());
        rx
    }
}

/// Never answers; the senders are kept alive so requests stay pending.
#[derive(Default)]
struct Silent(Mutex<Vec<oneshot::Sender<Result<ObservedWeather, FeedError>>>>);

impl WeatherSource for Silent {
    fn request(&self) -> PendingObservation {
        let (tx, rx) = oneshot::channel();
        self.0.lock().unwrap().push(tx);
        rx
    }
}

fn snowfall() -> ObservedWeather {
    ObservedWeather {
        condition: ConditionCategory::Snow,
        temperature: -2.0,
        humidity: 85.0,
    }
}

#[test]
fn observed_weather_applies_only_at_transitions() {
    let source = Instant::new(Ok(snowfall()));
    let mut ctx = SimulationContext::new(rich_config(9)).unwrap();
    ctx.set_weather_source(source.clone());
    ctx.prime_weather_feed();

    let mut previous = ctx.weather().clone();
    let mut snowy_transitions: usize = 0;
    for _ in 0..60 {
        let summary = step(&mut ctx);
        if summary.weather_changed {
            if !special_event(&summary) {
                assert_eq!(summary.weather.kind, WeatherKind::Snow, "tick {}", summary.tick);
                assert_eq!(summary.weather.temperature, -2);
                snowy_transitions = snowy_transitions.saturating_add(1);
            }
        } else {
            // An answer is waiting the whole time, yet nothing changes.
            assert_eq!(summary.weather, previous, "tick {}", summary.tick);
        }
        if summary.tick < 15 && !special_event(&summary) {
            assert_ne!(summary.weather.kind, WeatherKind::Snow);
        }
        previous = summary.weather;
    }
    assert!(snowy_transitions >= 3);
    // One request up front, then a fresh one after every transition.
    assert!(source.requests.load(Ordering::SeqCst) > snowy_transitions);
}

#[test]
fn failing_feed_falls_back_to_simulated_weather() {
    let failing = Instant::new(Err(FeedError::Timeout { timeout_ms: 5_000 }));
    let sources: [Arc<dyn WeatherSource>; 2] = [failing, Arc::new(Silent::default())];

    for source in sources {
        let mut fed = SimulationContext::new(rich_config(13)).unwrap();
        fed.set_weather_source(source);
        fed.prime_weather_feed();
        let mut plain = SimulationContext::new(rich_config(13)).unwrap();

        for _ in 0..60 {
            let with_feed = run_tick(&mut fed, Vec::new()).unwrap().unwrap();
            let without = step(&mut plain);
            assert_ne!(with_feed.weather.kind, WeatherKind::Snow);
            assert_eq!(with_feed, without);
        }
    }
}
