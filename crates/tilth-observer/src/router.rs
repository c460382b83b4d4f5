//! Axum router construction for the observer API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, operator, ws};

/// Build the complete router: status page, farm reads, the command
/// queue, operator control and the tick `WebSocket`.
///
/// CORS allows any origin so a local dashboard can connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/ticks", get(ws::ws_ticks))
        // Farm
        .route("/api/farm", get(handlers::get_farm))
        .route("/api/plots", get(handlers::list_plots))
        .route("/api/plots/{index}", get(handlers::get_plot))
        .route("/api/weather", get(handlers::get_weather))
        .route("/api/notifications", get(handlers::list_notifications))
        .route("/api/ticks/latest", get(handlers::latest_tick))
        .route("/api/commands", post(handlers::submit_command))
        // Operator
        .route("/api/operator/pause", post(operator::pause))
        .route("/api/operator/resume", post(operator::resume))
        .route("/api/operator/speed", post(operator::set_speed))
        .route("/api/operator/status", get(operator::status))
        .route("/api/operator/stop", post(operator::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
