//! Run controls shared by the tick loop and the observer API.
//!
//! The farm is always in exactly one [`RunMode`]. Pause, resume and stop
//! only move between modes; the tick loop reads the mode at the top of
//! every tick, so a tick is never interrupted halfway. Player commands
//! submitted over the API wait in a FIFO until the loop drains them at the
//! next boundary.
//!
//! `Stopping` is terminal: once requested, pause and resume are ignored.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tilth_types::CommandId;
use tokio::sync::{Mutex, Notify};

use crate::commands::{FarmCommand, QueuedCommand};
use crate::config::SimulationBoundsConfig;

/// Smallest tick interval the operator may set.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// An operator issued a stop command.
    OperatorStop,
}

/// Whether the farm is ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RunMode {
    /// Ticks fire on the configured interval.
    Running = 0,
    /// The tick loop sleeps until resumed.
    Paused = 1,
    /// The loop exits before its next tick.
    Stopping = 2,
}

impl RunMode {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Paused,
            _ => Self::Stopping,
        }
    }
}

/// Controls for one running farm, shared behind an `Arc`.
#[derive(Debug)]
pub struct OperatorState {
    mode: AtomicU8,
    /// Wakes a paused loop on resume or stop.
    wake: Notify,
    tick_interval_ms: AtomicU64,
    bounds: SimulationBoundsConfig,
    started_at: DateTime<Utc>,
    next_command_id: AtomicU64,
    queue: Mutex<VecDeque<QueuedCommand>>,
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Controls for a farm ticking every `tick_interval_ms`, within `bounds`.
    pub fn new(tick_interval_ms: u64, bounds: &SimulationBoundsConfig) -> Self {
        Self {
            mode: AtomicU8::new(RunMode::Running as u8),
            wake: Notify::new(),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            bounds: bounds.clone(),
            started_at: Utc::now(),
            next_command_id: AtomicU64::new(CommandId::FIRST.into_inner()),
            queue: Mutex::new(VecDeque::new()),
            end_reason: Mutex::new(None),
        }
    }

    /// Current run mode.
    pub fn mode(&self) -> RunMode {
        RunMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    fn transition(&self, from: RunMode, to: RunMode) -> bool {
        self.mode
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether the farm is paused.
    pub fn is_paused(&self) -> bool {
        self.mode() == RunMode::Paused
    }

    /// Pause a running farm.
    pub fn pause(&self) {
        self.transition(RunMode::Running, RunMode::Paused);
    }

    /// Resume a paused farm and wake the loop.
    pub fn resume(&self) {
        if self.transition(RunMode::Paused, RunMode::Running) {
            self.wake.notify_one();
        }
    }

    /// Sleep while paused. Returns at once when running or stopping.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() {
            self.wake.notified().await;
        }
    }

    /// Ask the loop to exit before its next tick.
    pub fn request_stop(&self) {
        self.mode.store(RunMode::Stopping as u8, Ordering::Release);
        self.wake.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.mode() == RunMode::Stopping
    }

    /// Record why the loop exited.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        *self.end_reason.lock().await = Some(reason);
    }

    /// Why the loop exited, once it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        *self.end_reason.lock().await
    }

    /// Delay between ticks.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the delay between ticks, returning the old one.
    ///
    /// `None` if `ms` is below [`MIN_TICK_INTERVAL_MS`].
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        (ms >= MIN_TICK_INTERVAL_MS).then(|| self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    /// Whether the farm has run its configured number of ticks.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.bounds.max_ticks > 0 && current_tick >= self.bounds.max_ticks
    }

    /// Whether the configured wall-clock budget is spent.
    pub fn time_limit_reached(&self) -> bool {
        self.bounds.max_real_time_seconds > 0
            && self.elapsed_seconds() >= self.bounds.max_real_time_seconds
    }

    /// Whole seconds since the controls were created.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        // Zero if the wall clock stepped backwards.
        u64::try_from(elapsed).unwrap_or(0)
    }

    /// Tick limit, 0 for none.
    pub const fn max_ticks(&self) -> u64 {
        self.bounds.max_ticks
    }

    /// Wall-clock limit in seconds, 0 for none.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.bounds.max_real_time_seconds
    }

    /// Queue a player command for the next tick boundary.
    pub async fn submit(&self, command: FarmCommand) -> CommandId {
        let id = CommandId::new(self.next_command_id.fetch_add(1, Ordering::AcqRel));
        self.queue
            .lock()
            .await
            .push_back(QueuedCommand::new(id, command));
        id
    }

    /// Commands waiting for the next boundary.
    pub async fn queued_commands(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Take every waiting command, oldest first.
    pub async fn drain_commands(&self) -> Vec<QueuedCommand> {
        self.queue.lock().await.drain(..).collect()
    }

    /// Report for `GET /api/operator/status`.
    pub async fn status(&self, tick: u64) -> SimulationStatus {
        SimulationStatus {
            tick,
            mode: self.mode(),
            tick_interval_ms: self.tick_interval_ms(),
            elapsed_seconds: self.elapsed_seconds(),
            max_ticks: self.max_ticks(),
            max_real_time_seconds: self.max_real_time_seconds(),
            queued_commands: self.queued_commands().await,
            end_reason: self.end_reason().await,
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// Operator view of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStatus {
    /// Last published tick.
    pub tick: u64,
    /// Running, paused or stopping.
    pub mode: RunMode,
    /// Delay between ticks.
    pub tick_interval_ms: u64,
    /// Wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Tick limit, 0 for none.
    pub max_ticks: u64,
    /// Wall-clock limit, 0 for none.
    pub max_real_time_seconds: u64,
    /// Commands waiting for the next tick.
    pub queued_commands: usize,
    /// Why the run ended, once it has.
    pub end_reason: Option<SimulationEndReason>,
    /// RFC 3339 start time.
    pub started_at: String,
}

#[cfg(test)]
mod tests {
    use tilth_types::SpeciesId;

    use super::*;

    fn unbounded() -> OperatorState {
        OperatorState::new(1000, &SimulationBoundsConfig::default())
    }

    #[test]
    fn starts_running() {
        let state = unbounded();
        assert_eq!(state.mode(), RunMode::Running);
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
    }

    #[test]
    fn pause_then_resume() {
        let state = unbounded();
        state.pause();
        assert_eq!(state.mode(), RunMode::Paused);
        state.resume();
        assert_eq!(state.mode(), RunMode::Running);
    }

    #[test]
    fn stopping_ignores_pause_and_resume() {
        let state = unbounded();
        state.request_stop();
        state.pause();
        assert_eq!(state.mode(), RunMode::Stopping);
        state.resume();
        assert!(state.is_stop_requested());
    }

    #[test]
    fn interval_has_a_floor() {
        let state = unbounded();
        assert_eq!(state.set_tick_interval_ms(2000), Some(1000));
        assert_eq!(state.tick_interval_ms(), 2000);
        assert!(state.set_tick_interval_ms(MIN_TICK_INTERVAL_MS - 1).is_none());
        assert_eq!(state.tick_interval_ms(), 2000);
    }

    #[test]
    fn zero_bounds_mean_unlimited() {
        let state = unbounded();
        assert!(!state.tick_limit_reached(999_999));
        assert!(!state.time_limit_reached());

        let bounded = OperatorState::new(1000, &SimulationBoundsConfig {
            max_ticks: 100,
            max_real_time_seconds: 0,
        });
        assert!(!bounded.tick_limit_reached(99));
        assert!(bounded.tick_limit_reached(100));
    }

    #[test]
    fn mode_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(RunMode::Stopping).ok(),
            Some(serde_json::json!("stopping"))
        );
    }

    #[tokio::test]
    async fn commands_drain_in_arrival_order() {
        let state = unbounded();
        let first = state.submit(FarmCommand::Water { plot: 0 }).await;
        let second = state
            .submit(FarmCommand::Plant {
                plot: 1,
                species: SpeciesId::Carrot,
            })
            .await;
        assert_eq!(first, CommandId::new(1));
        assert_eq!(second, CommandId::new(2));
        assert_eq!(state.status(0).await.queued_commands, 2);

        let drained = state.drain_commands().await;
        assert_eq!(
            drained.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![first, second]
        );
        assert!(state.drain_commands().await.is_empty());
    }

    #[tokio::test]
    async fn stop_wakes_a_paused_loop() {
        let state = std::sync::Arc::new(unbounded());
        state.pause();
        let waiter = {
            let state = std::sync::Arc::clone(&state);
            tokio::spawn(async move { state.wait_if_paused().await })
        };
        state.request_stop();
        assert!(waiter.await.is_ok());
    }
}
