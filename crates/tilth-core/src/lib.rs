//! Farm clock, tick pipeline, and orchestration for the Tilth simulation.
//!
//! This crate owns the [`SimulationContext`], the single object holding
//! every piece of mutable farm state, and the ordered per-tick pipeline
//! that advances it.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter with season and calendar derivation.
//! - [`config`] -- Configuration loading from `tilth-config.yaml` into
//!   strongly-typed structs.
//! - [`context`] -- [`SimulationContext`] and the player actions.
//! - [`commands`] -- Serializable commands queued for the next tick.
//! - [`events`] -- Rare special events.
//! - [`feed`] -- Fire-and-forget boundary to an external weather source.
//! - [`operator`] -- Shared pause/speed/stop state and the command queue.
//! - [`rng`] -- Deterministic per-tick random streams.
//! - [`runner`] -- The async fixed-delay tick loop.
//! - [`snapshot`] -- Persistent state export and validated restore.
//! - [`tick`] -- The per-tick effect pipeline.
//! - [`view`] -- Read-only views for collaborators.

pub mod clock;
pub mod commands;
pub mod config;
pub mod context;
pub mod events;
pub mod feed;
pub mod operator;
pub mod rng;
pub mod runner;
pub mod snapshot;
pub mod tick;
pub mod view;

pub use commands::{CommandOutcome, CommandResult, FarmCommand, QueuedCommand};
pub use config::{ConfigError, SimulationConfig};
pub use context::{ContextError, SimulationContext};
pub use feed::{FeedError, WeatherFeed, WeatherSource};
pub use operator::{OperatorState, RunMode, SimulationEndReason, SimulationStatus};
pub use runner::{NoOpCallback, RunnerError, SimulationResult, TickCallback, run_simulation};
pub use snapshot::{FarmSnapshot, SnapshotError};
pub use tick::{TickError, TickSummary, run_tick};
pub use view::{FarmView, PlotDetail};
