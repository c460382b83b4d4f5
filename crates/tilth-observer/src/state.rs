//! Shared application state for the observer server.
//!
//! [`AppState`] holds the broadcast channel for tick summaries, the last
//! published [`ObservedFarm`] and, when a simulation is running, the
//! operator control state that commands are queued on.

use std::sync::Arc;

use tilth_core::{FarmView, OperatorState, PlotDetail, SimulationContext, TickSummary};
use tilth_types::Notification;
use tilth_world::ForecastEntry;
use tokio::sync::{RwLock, broadcast};

/// Capacity of the broadcast channel for tick summaries.
///
/// A subscriber that falls behind by more than this many messages
/// receives [`broadcast::error::RecvError::Lagged`] and skips ahead.
const BROADCAST_CAPACITY: usize = 256;

/// Most notifications kept for `GET /api/notifications`.
pub const MAX_NOTIFICATIONS: usize = 500;

/// Number of upcoming transitions published with the weather.
pub const FORECAST_LENGTH: usize = 5;

/// The farm as last published by the engine.
#[derive(Debug, Clone, Default)]
pub struct ObservedFarm {
    /// Whole-farm view, absent until the first publish.
    pub view: Option<FarmView>,
    /// Per-plot detail in index order.
    pub plots: Vec<PlotDetail>,
    /// Upcoming weather transitions.
    pub forecast: Vec<ForecastEntry>,
    /// Recent notifications, oldest first.
    pub notifications: Vec<Notification>,
    /// Summary of the most recent tick.
    pub last_summary: Option<TickSummary>,
}

impl ObservedFarm {
    /// Replace the farm view, plot details and forecast from the context.
    pub fn refresh(&mut self, context: &SimulationContext) {
        self.view = Some(context.view());
        self.plots = (0..context.plots().len())
            .filter_map(|index| context.plot_detail(index))
            .collect();
        self.forecast = context.forecast(FORECAST_LENGTH);
    }

    /// Remember a tick summary and append its notifications.
    pub fn record(&mut self, summary: &TickSummary) {
        self.push_notifications(summary.notifications.iter().cloned());
        self.last_summary = Some(summary.clone());
    }

    /// Append notifications, dropping the oldest beyond [`MAX_NOTIFICATIONS`].
    pub fn push_notifications(&mut self, notifications: impl IntoIterator<Item = Notification>) {
        self.notifications.extend(notifications);
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let drain_count = self.notifications.len().saturating_sub(MAX_NOTIFICATIONS);
            self.notifications.drain(..drain_count);
        }
    }

    /// Tick of the last publish, or 0.
    pub fn tick(&self) -> u64 {
        self.view.as_ref().map_or(0, |v| v.tick)
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Broadcast sender for tick summaries.
    pub tx: broadcast::Sender<TickSummary>,
    /// The farm as last published.
    pub farm: Arc<RwLock<ObservedFarm>>,
    /// Operator control state, present while a simulation is running.
    pub operator_state: Option<Arc<OperatorState>>,
}

impl AppState {
    /// Create application state with nothing published.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            farm: Arc::new(RwLock::new(ObservedFarm::default())),
            operator_state: None,
        }
    }

    /// Create application state with operator control attached.
    pub fn with_operator(operator: Arc<OperatorState>) -> Self {
        Self {
            operator_state: Some(operator),
            ..Self::new()
        }
    }

    /// Subscribe to the tick broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<TickSummary> {
        self.tx.subscribe()
    }

    /// Publish a tick summary to all connected clients.
    ///
    /// Returns the number of receivers; 0 when nobody is listening.
    pub fn broadcast(&self, summary: &TickSummary) -> usize {
        self.tx.send(summary.clone()).unwrap_or(0)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
