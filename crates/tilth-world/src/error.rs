//! Error types for the `tilth-world` crate.
//!
//! Player actions never produce these; they are refused with an
//! [`ActionRejection`](tilth_types::ActionRejection) instead. [`WorldError`]
//! covers invalid construction input: grid dimensions, species stats and
//! restored plot data.

use tilth_types::SpeciesId;

/// Errors raised while building or restoring the physical farm.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Grid dimensions or unlock counts are unusable.
    #[error("invalid grid: {reason}")]
    InvalidGrid {
        /// What is wrong with the grid.
        reason: String,
    },

    /// A species has stats that would break growth or economy math.
    #[error("invalid stats for {species}: {reason}")]
    InvalidSpecies {
        /// The offending species.
        species: SpeciesId,
        /// What is wrong with its stats.
        reason: String,
    },

    /// A restored plot violates a plot invariant.
    #[error("invalid plot {index}: {reason}")]
    InvalidPlot {
        /// Index of the plot.
        index: usize,
        /// Which invariant it breaks.
        reason: String,
    },

    /// The weather transition interval is zero.
    #[error("weather change interval must be at least 1 tick")]
    InvalidWeatherInterval,
}
