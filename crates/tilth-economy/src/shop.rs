//! The farm shop.
//!
//! Seeds are priced per species from the species table; fertilizer and
//! sprinklers have fixed prices set in configuration.

use serde::{Deserialize, Serialize};
use tilth_types::{ActionRejection, SpeciesId};
use tilth_world::{FarmSupplies, SpeciesTable};
use tracing::debug;

use crate::wallet::Wallet;

/// Something the farmer can buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum ShopItem {
    /// Seeds of one species.
    Seeds {
        /// Species to buy.
        species: SpeciesId,
        /// How many seeds.
        quantity: u32,
    },
    /// Fertilizer charges.
    Fertilizer {
        /// How many charges.
        quantity: u32,
    },
    /// Spare sprinklers.
    Sprinkler {
        /// How many sprinklers.
        quantity: u32,
    },
}

/// Fixed shop prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopPrices {
    /// Coins per fertilizer charge.
    pub fertilizer: u64,
    /// Coins per sprinkler.
    pub sprinkler: u64,
}

impl Default for ShopPrices {
    fn default() -> Self {
        Self {
            fertilizer: 25,
            sprinkler: 100,
        }
    }
}

/// Price of an item, or `None` on overflow.
pub fn price(item: ShopItem, species: &SpeciesTable, prices: ShopPrices) -> Option<u64> {
    let (unit, quantity) = match item {
        ShopItem::Seeds { species: id, quantity } => (u64::from(species.get(id).seed_cost), quantity),
        ShopItem::Fertilizer { quantity } => (prices.fertilizer, quantity),
        ShopItem::Sprinkler { quantity } => (prices.sprinkler, quantity),
    };
    unit.checked_mul(u64::from(quantity))
}

/// Buy an item, returning the coins spent.
///
/// The wallet is only charged if the goods can be credited.
pub fn purchase(
    wallet: &mut Wallet,
    item: ShopItem,
    species: &SpeciesTable,
    prices: ShopPrices,
) -> Result<u64, ActionRejection> {
    let cost = price(item, species, prices).ok_or(ActionRejection::Overflow)?;
    let mut updated = wallet.clone();
    updated.spend(cost)?;
    match item {
        ShopItem::Seeds { species, quantity } => updated.add_seeds(species, quantity)?,
        ShopItem::Fertilizer { quantity } => updated.add_fertilizer(quantity)?,
        ShopItem::Sprinkler { quantity } => updated.add_sprinklers(quantity)?,
    }
    *wallet = updated;
    debug!(?item, cost, "purchased");
    Ok(cost)
}
