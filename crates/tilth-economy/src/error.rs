//! Error types for the `tilth-economy` crate.
//!
//! Spending and earning during play are refused with an
//! [`ActionRejection`](tilth_types::ActionRejection). [`EconomyError`] is
//! reserved for restored state that breaks an invariant.

use chrono::NaiveDate;
use tilth_types::PlantId;

/// Errors raised while restoring economy state.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    /// A care ledger lists the same day twice.
    #[error("care history for {plant} records {date} more than once")]
    DuplicateCareDay {
        /// The plant whose ledger is broken.
        plant: PlantId,
        /// The repeated day.
        date: NaiveDate,
    },

    /// A care ledger is not in date order.
    #[error("care history for {plant} is not in date order")]
    UnsortedCareHistory {
        /// The plant whose ledger is broken.
        plant: PlantId,
    },

    /// Progression counters are inconsistent.
    #[error("invalid progression: {reason}")]
    InvalidProgression {
        /// What is wrong.
        reason: String,
    },
}
