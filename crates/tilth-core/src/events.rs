//! Rare random events rolled once per tick.

use rand::Rng;
use tilth_types::{SpecialEventKind, WeatherKind};

/// Chance per tick that any special event fires.
pub const SPECIAL_EVENT_CHANCE: f64 = 0.001;

/// Ticks of forced rain after a golden rain.
pub const GOLDEN_RAIN_TICKS: u64 = 10;

/// Ticks of forced sun after a perfect sun.
pub const PERFECT_SUN_TICKS: u64 = 8;

/// Coin range of a coin shower, inclusive.
pub const COIN_SHOWER_COINS: (u64, u64) = (20, 50);

/// What a special event does to the farm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialEffect {
    /// Install weather for a number of ticks.
    Weather {
        /// Weather kind.
        kind: WeatherKind,
        /// Duration in ticks.
        duration: u64,
    },
    /// Credit coins.
    Coins(u64),
}

const KINDS: [SpecialEventKind; 3] = [
    SpecialEventKind::GoldenRain,
    SpecialEventKind::PerfectSun,
    SpecialEventKind::CoinShower,
];

/// Roll for this tick's special event.
pub fn roll<R: Rng>(rng: &mut R) -> Option<(SpecialEventKind, SpecialEffect)> {
    if !rng.random_bool(SPECIAL_EVENT_CHANCE) {
        return None;
    }
    let kind = KINDS
        .get(rng.random_range(0..KINDS.len()))
        .copied()
        .unwrap_or(SpecialEventKind::CoinShower);
    Some((kind, effect_of(kind, rng)))
}

/// Resolve an event's effect, drawing the coin amount where needed.
pub fn effect_of<R: Rng>(kind: SpecialEventKind, rng: &mut R) -> SpecialEffect {
    match kind {
        SpecialEventKind::GoldenRain => SpecialEffect::Weather {
            kind: WeatherKind::Rainy,
            duration: GOLDEN_RAIN_TICKS,
        },
        SpecialEventKind::PerfectSun => SpecialEffect::Weather {
            kind: WeatherKind::Sunny,
            duration: PERFECT_SUN_TICKS,
        },
        SpecialEventKind::CoinShower => {
            let (low, high) = COIN_SHOWER_COINS;
            SpecialEffect::Coins(rng.random_range(low..=high))
        }
    }
}
