//! Resources, care grading, yield and rewards for the Tilth farming
//! simulation.
//!
//! # Modules
//!
//! - [`wallet`] -- Coins, seeds, fertilizer and sprinklers with checked
//!   arithmetic; the resource collaborator behind plot actions.
//! - [`progression`] -- Experience, levels and lifetime totals.
//! - [`care`] -- Per-plant daily care ledger and grading.
//! - [`calculator`] -- Yield, earnings, companion and rotation bonuses.
//! - [`shop`] -- Buying seeds and equipment.
//! - [`error`] -- Restore-time validation errors.

pub mod calculator;
pub mod care;
pub mod error;
pub mod progression;
pub mod shop;
pub mod wallet;

pub use calculator::{Appraisal, EconomyCalculator, GradeReward, grade_reward};
pub use care::{CareTracker, grade_for_rates, grade_history};
pub use error::EconomyError;
pub use progression::{LevelUp, Progression};
pub use shop::{ShopItem, ShopPrices, purchase};
pub use wallet::Wallet;
