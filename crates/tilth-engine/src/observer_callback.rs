//! Tick callback that publishes the farm to the observer API and writes
//! periodic snapshots.

use std::path::PathBuf;
use std::sync::Arc;

use tilth_core::config::PersistenceConfig;
use tilth_core::{SimulationContext, TickCallback, TickSummary};
use tilth_observer::AppState;
use tilth_types::Notification;
use tracing::{debug, warn};

use crate::persistence;

/// Callback that bridges the tick loop to the observer API.
pub struct ObserverCallback {
    state: Arc<AppState>,
    /// Notifications from ticks whose publish was skipped.
    backlog: Vec<Notification>,
    snapshot_path: PathBuf,
    snapshot_interval_ticks: u64,
}

impl ObserverCallback {
    /// Create a callback backed by the given app state.
    pub fn new(state: Arc<AppState>, persistence: &PersistenceConfig) -> Self {
        Self {
            state,
            backlog: Vec::new(),
            snapshot_path: PathBuf::from(&persistence.snapshot_path),
            snapshot_interval_ticks: persistence.snapshot_interval_ticks,
        }
    }
}

impl ObserverCallback {
    /// Copy the farm into the observer state.
    ///
    /// `try_write` keeps the tick loop from waiting on a slow reader. A
    /// skipped publish is caught up on the next tick, with its
    /// notifications held in the backlog until then.
    fn publish(&mut self, summary: &TickSummary, context: &SimulationContext) {
        let Ok(mut farm) = self.state.farm.try_write() else {
            self.backlog.extend(summary.notifications.iter().cloned());
            return;
        };
        farm.refresh(context);
        farm.push_notifications(self.backlog.drain(..));
        farm.record(summary);
    }
}

impl TickCallback for ObserverCallback {
    fn on_tick(&mut self, summary: &TickSummary, context: &SimulationContext) {
        let receivers = self.state.broadcast(summary);
        debug!(tick = summary.tick, receivers, "tick broadcast sent");

        self.publish(summary, context);

        if summary.tick.checked_rem(self.snapshot_interval_ticks) != Some(0) {
            return;
        }
        if let Err(e) = persistence::write_snapshot(&self.snapshot_path, context) {
            warn!(error = %e, tick = summary.tick, "periodic snapshot failed");
        }
    }
}
