//! The farmer's resources: coins and consumables.
//!
//! All arithmetic is checked. Spending more than is held is refused with an
//! [`ActionRejection`] and leaves the wallet unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tilth_types::{ActionRejection, SpeciesId};
use tilth_world::FarmSupplies;

/// Coins, seeds, fertilizer charges and spare sprinklers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    coins: u64,
    seeds: BTreeMap<SpeciesId, u32>,
    fertilizer: u32,
    sprinklers: u32,
}

impl Wallet {
    /// A wallet holding only coins.
    pub const fn with_coins(coins: u64) -> Self {
        Self {
            coins,
            seeds: BTreeMap::new(),
            fertilizer: 0,
            sprinklers: 0,
        }
    }

    /// Coin balance.
    pub const fn coins(&self) -> u64 {
        self.coins
    }

    /// Seeds held for a species.
    pub fn seeds(&self, species: SpeciesId) -> u32 {
        self.seeds.get(&species).copied().unwrap_or(0)
    }

    /// All seed counts.
    pub const fn seed_counts(&self) -> &BTreeMap<SpeciesId, u32> {
        &self.seeds
    }

    /// Fertilizer charges held.
    pub const fn fertilizer(&self) -> u32 {
        self.fertilizer
    }

    /// Spare sprinklers held.
    pub const fn sprinklers(&self) -> u32 {
        self.sprinklers
    }

    /// Add coins.
    pub fn earn(&mut self, coins: u64) -> Result<(), ActionRejection> {
        self.coins = self
            .coins
            .checked_add(coins)
            .ok_or(ActionRejection::Overflow)?;
        Ok(())
    }

    /// Add seeds of a species.
    pub fn add_seeds(&mut self, species: SpeciesId, quantity: u32) -> Result<(), ActionRejection> {
        let held = self.seeds.entry(species).or_insert(0);
        *held = held.checked_add(quantity).ok_or(ActionRejection::Overflow)?;
        Ok(())
    }

    /// Add fertilizer charges.
    pub fn add_fertilizer(&mut self, quantity: u32) -> Result<(), ActionRejection> {
        self.fertilizer = self
            .fertilizer
            .checked_add(quantity)
            .ok_or(ActionRejection::Overflow)?;
        Ok(())
    }

    /// Add spare sprinklers.
    pub fn add_sprinklers(&mut self, quantity: u32) -> Result<(), ActionRejection> {
        self.sprinklers = self
            .sprinklers
            .checked_add(quantity)
            .ok_or(ActionRejection::Overflow)?;
        Ok(())
    }
}

impl FarmSupplies for Wallet {
    fn take_seed(&mut self, species: SpeciesId) -> Result<(), ActionRejection> {
        let held = self
            .seeds
            .get_mut(&species)
            .ok_or(ActionRejection::InsufficientSeeds)?;
        *held = held
            .checked_sub(1)
            .ok_or(ActionRejection::InsufficientSeeds)?;
        if *held == 0 {
            self.seeds.remove(&species);
        }
        Ok(())
    }

    fn take_fertilizer(&mut self) -> Result<(), ActionRejection> {
        self.fertilizer = self
            .fertilizer
            .checked_sub(1)
            .ok_or(ActionRejection::NoFertilizer)?;
        Ok(())
    }

    fn take_sprinkler(&mut self) -> Result<(), ActionRejection> {
        self.sprinklers = self
            .sprinklers
            .checked_sub(1)
            .ok_or(ActionRejection::NoSprinkler)?;
        Ok(())
    }

    fn spend(&mut self, coins: u64) -> Result<(), ActionRejection> {
        self.coins = self
            .coins
            .checked_sub(coins)
            .ok_or(ActionRejection::InsufficientFunds)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn spend_refuses_overdraft() {
        let mut wallet = Wallet::with_coins(10);
        assert_eq!(wallet.spend(11), Err(ActionRejection::InsufficientFunds));
        assert_eq!(wallet.coins(), 10);
        wallet.spend(10).unwrap();
        assert_eq!(wallet.coins(), 0);
    }

    #[test]
    fn earn_detects_overflow() {
        let mut wallet = Wallet::with_coins(u64::MAX);
        assert_eq!(wallet.earn(1), Err(ActionRejection::Overflow));
    }

    #[test]
    fn seeds_are_per_species() {
        let mut wallet = Wallet::default();
        wallet.add_seeds(SpeciesId::Tomato, 2).unwrap();
        assert_eq!(wallet.take_seed(SpeciesId::Corn), Err(ActionRejection::InsufficientSeeds));
        wallet.take_seed(SpeciesId::Tomato).unwrap();
        wallet.take_seed(SpeciesId::Tomato).unwrap();
        assert_eq!(wallet.seeds(SpeciesId::Tomato), 0);
        assert!(wallet.seed_counts().is_empty());
    }

    #[test]
    fn consumables_run_out() {
        let mut wallet = Wallet::default();
        wallet.add_fertilizer(1).unwrap();
        wallet.take_fertilizer().unwrap();
        assert_eq!(wallet.take_fertilizer(), Err(ActionRejection::NoFertilizer));
        assert_eq!(wallet.take_sprinkler(), Err(ActionRejection::NoSprinkler));
    }

    #[test]
    fn serializes_seed_map_by_name() {
        let mut wallet = Wallet::with_coins(5);
        wallet.add_seeds(SpeciesId::Wheat, 3).unwrap();
        let json = serde_json::to_value(&wallet).unwrap();
        assert_eq!(
            json.pointer("/seeds/wheat").and_then(serde_json::Value::as_u64),
            Some(3)
        );
    }
}
