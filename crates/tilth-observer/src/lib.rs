//! Observer and command API server for the Tilth farming simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/ticks`) streaming every
//!   [`TickSummary`](tilth_core::TickSummary) via [`tokio::sync::broadcast`]
//! - **REST endpoints** for reading the farm: plots, weather, forecast,
//!   notifications
//! - **Command endpoint** (`POST /api/commands`) queueing farm actions for
//!   the next tick boundary
//! - **Operator endpoints** for pause, resume, speed, status and stop
//!
//! # Architecture
//!
//! The engine publishes an [`ObservedFarm`] after every tick. REST reads
//! are served from that copy so the observer never blocks the tick loop,
//! and writes only ever reach the simulation through the operator's
//! command queue.
//!
//! [`ObservedFarm`]: state::ObservedFarm

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError, spawn_observer, start_server};
pub use state::{AppState, ObservedFarm};
