//! Simulation loop runner with operator controls.
//!
//! [`run_simulation`] drives the tick loop on a fixed delay with support
//! for:
//!
//! - **Bounded runs**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pause/resume**: the operator flag is mirrored into the farm's own
//!   pause flag, so no tick is lost or applied twice
//! - **Variable tick speed**: the interval is re-read after every tick
//! - **Command boundary**: queued commands are drained and applied only at
//!   the start of a tick
//! - **Operator stop**: clean stop via the API
//!
//! The runner wraps the single-tick [`run_tick`] function and adds the
//! control plane around it.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::sync::Arc;

use tracing::info;

use crate::context::SimulationContext;
use crate::operator::{OperatorState, SimulationEndReason};
use crate::tick::{self, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed by this run.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
///
/// Implementations use this to publish the post-tick view, broadcast
/// summaries or write periodic snapshots. The context is only readable
/// here; nothing may mutate the farm outside the tick pipeline.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, context: &SimulationContext);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _context: &SimulationContext) {}
}

async fn finish(
    operator: &OperatorState,
    reason: SimulationEndReason,
    final_summary: Option<TickSummary>,
    total_ticks: u64,
) -> SimulationResult {
    operator.set_end_reason(reason).await;
    SimulationResult {
        end_reason: reason,
        final_summary,
        total_ticks,
    }
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation(
    context: &mut SimulationContext,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    if context.is_paused() {
        operator.pause();
    }
    context.prime_weather_feed();

    info!(
        tick = context.tick(),
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Simulation starting"
    );

    loop {
        // --- Check pause ---
        if operator.is_paused() {
            context.pause();
            operator.wait_if_paused().await;
            if !operator.is_paused() {
                context.resume();
            }
        }

        // --- Check stop request (before tick) ---
        if operator.is_stop_requested() {
            info!(tick = context.tick(), "Operator stop requested");
            return Ok(finish(
                operator,
                SimulationEndReason::OperatorStop,
                last_summary,
                total_ticks,
            )
            .await);
        }

        // --- Check time limit (before tick) ---
        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            return Ok(finish(
                operator,
                SimulationEndReason::MaxRealTimeReached,
                last_summary,
                total_ticks,
            )
            .await);
        }

        // --- Execute tick ---
        let commands = operator.drain_commands().await;
        let Some(summary) = tick::run_tick(context, commands)? else {
            continue;
        };
        total_ticks = total_ticks.saturating_add(1);

        // --- Notify callback ---
        callback.on_tick(&summary, context);

        // --- Check tick limit (after tick) ---
        if operator.tick_limit_reached(summary.tick) {
            info!(
                tick = summary.tick,
                max_ticks = operator.max_ticks(),
                "Tick limit reached"
            );
            return Ok(finish(
                operator,
                SimulationEndReason::MaxTicksReached,
                Some(summary),
                total_ticks,
            )
            .await);
        }

        last_summary = Some(summary);

        // --- Sleep for tick interval ---
        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        final_coins = result.final_summary.as_ref().map(|s| s.coins),
        "Simulation ended"
    );
}
