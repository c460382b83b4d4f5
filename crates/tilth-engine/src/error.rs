//! Error types for the engine binary.
//!
//! `main` itself reports through `anyhow`; these are the failures of the
//! engine's own helpers.

use std::path::PathBuf;

/// Failure while loading configuration or persisting the farm.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tilth_core::ConfigError,
    },

    /// A snapshot could not be encoded.
    #[error("snapshot error: {source}")]
    Snapshot {
        /// The underlying snapshot error.
        #[from]
        source: tilth_core::SnapshotError,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
