//! REST handlers for reading the farm and submitting commands.
//!
//! Reads are served from the last published [`ObservedFarm`]. Commands
//! are never applied here: they are queued on the operator state and
//! take effect at the next tick boundary.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/farm` | Whole-farm view |
//! | `GET` | `/api/plots` | Every plot with derived detail |
//! | `GET` | `/api/plots/{index}` | One plot |
//! | `GET` | `/api/weather` | Current weather and forecast |
//! | `GET` | `/api/notifications` | Recent notifications |
//! | `GET` | `/api/ticks/latest` | Summary of the last tick |
//! | `POST` | `/api/commands` | Queue a farm command |
//!
//! [`ObservedFarm`]: crate::state::ObservedFarm

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use tilth_core::FarmCommand;
use tracing::debug;

use crate::error::ObserverError;
use crate::state::{AppState, MAX_NOTIFICATIONS};

/// Default page size for `GET /api/notifications`.
const DEFAULT_NOTIFICATION_LIMIT: usize = 100;

/// Query parameters for `GET /api/notifications`.
#[derive(Debug, serde::Deserialize)]
pub struct NotificationsQuery {
    /// Only notifications stamped at or after this tick.
    pub since: Option<u64>,
    /// Maximum number of notifications (default 100), newest kept.
    pub limit: Option<usize>,
}

/// Serve a minimal HTML page with the farm's headline numbers.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let farm = state.farm.read().await;
    let (name, tick, season, weather, coins, level) = farm.view.as_ref().map_or_else(
        || (String::from("Tilth"), 0, String::from("-"), String::from("-"), 0, 1),
        |v| {
            (
                v.name.clone(),
                v.tick,
                v.season.to_string(),
                format!("{:?}", v.weather.kind),
                v.wallet.coins(),
                v.progression.level,
            )
        },
    );

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{name} Observer</title>
    <style>
        body {{ background: #14110d; color: #e8dcc4; font-family: monospace; padding: 2rem; max-width: 760px; margin: 0 auto; }}
        h1 {{ color: #9ccc65; }}
        .metric {{ display: inline-block; border: 1px solid #4e4536; border-radius: 6px; padding: 1rem 1.5rem; margin: 0.5rem 0.5rem 0.5rem 0; }}
        .label {{ color: #a89c84; font-size: 0.85rem; }}
        .value {{ color: #9ccc65; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #9ccc65; }}
    </style>
</head>
<body>
    <h1>{name}</h1>
    <div>
        <div class="metric"><div class="label">Tick</div><div class="value">{tick}</div></div>
        <div class="metric"><div class="label">Season</div><div class="value">{season}</div></div>
        <div class="metric"><div class="label">Weather</div><div class="value">{weather}</div></div>
        <div class="metric"><div class="label">Coins</div><div class="value">{coins}</div></div>
        <div class="metric"><div class="label">Level</div><div class="value">{level}</div></div>
    </div>
    <ul>
        <li><a href="/api/farm">/api/farm</a></li>
        <li><a href="/api/plots">/api/plots</a></li>
        <li><a href="/api/weather">/api/weather</a></li>
        <li><a href="/api/notifications">/api/notifications</a></li>
        <li><a href="/api/ticks/latest">/api/ticks/latest</a></li>
        <li><a href="/api/operator/status">/api/operator/status</a></li>
        <li><code>ws://host:port/ws/ticks</code></li>
    </ul>
</body>
</html>"#
    ))
}

/// Return the whole-farm view.
pub async fn get_farm(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let farm = state.farm.read().await;
    let view = farm.view.as_ref().ok_or(ObserverError::NotReady)?;
    Ok(Json(serde_json::to_value(view)?))
}

/// List every plot with stage label, care days, grade and appraisal.
pub async fn list_plots(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let farm = state.farm.read().await;
    if farm.view.is_none() {
        return Err(ObserverError::NotReady);
    }
    Ok(Json(serde_json::json!({
        "count": farm.plots.len(),
        "plots": serde_json::to_value(&farm.plots)?,
    })))
}

/// Return one plot by grid index.
pub async fn get_plot(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, ObserverError> {
    let farm = state.farm.read().await;
    if farm.view.is_none() {
        return Err(ObserverError::NotReady);
    }
    let detail = farm
        .plots
        .get(index)
        .ok_or_else(|| ObserverError::NotFound(format!("plot {index}")))?;
    Ok(Json(serde_json::to_value(detail)?))
}

/// Return the current weather, forced weather and forecast.
pub async fn get_weather(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let farm = state.farm.read().await;
    let view = farm.view.as_ref().ok_or(ObserverError::NotReady)?;
    Ok(Json(serde_json::json!({
        "tick": view.tick,
        "current": serde_json::to_value(&view.weather)?,
        "forced": serde_json::to_value(view.forced_weather)?,
        "next_change_tick": view.next_weather_tick,
        "seasonal": serde_json::to_value(view.seasonal)?,
        "forecast": serde_json::to_value(&farm.forecast)?,
    })))
}

/// Return recent notifications, oldest first.
///
/// # Query Parameters
///
/// - `since`: only notifications at or after this tick.
/// - `limit`: newest N to return (default 100, max 500).
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NotificationsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let farm = state.farm.read().await;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .min(MAX_NOTIFICATIONS);
    let since = params.since.unwrap_or(0);

    let matching: Vec<_> = farm
        .notifications
        .iter()
        .filter(|n| n.tick >= since)
        .collect();
    let skip = matching.len().saturating_sub(limit);
    let page: Vec<_> = matching.into_iter().skip(skip).collect();

    Ok(Json(serde_json::json!({
        "count": page.len(),
        "notifications": serde_json::to_value(&page)?,
    })))
}

/// Return the summary of the most recent tick, including command results.
pub async fn latest_tick(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let farm = state.farm.read().await;
    let summary = farm.last_summary.as_ref().ok_or(ObserverError::NotReady)?;
    Ok(Json(serde_json::to_value(summary)?))
}

/// Queue a farm command for the next tick boundary.
///
/// Responds `202 Accepted` with the command id. The outcome appears in
/// the `command_results` of the tick that applies it.
pub async fn submit_command(
    State(state): State<Arc<AppState>>,
    Json(command): Json<FarmCommand>,
) -> Result<impl IntoResponse, ObserverError> {
    let operator = state
        .operator_state
        .as_ref()
        .ok_or_else(|| ObserverError::Internal("operator state not available".to_owned()))?;

    if let FarmCommand::Expand { count: Some(0) } = command {
        return Err(ObserverError::InvalidRequest(
            "expand count must be at least 1".to_owned(),
        ));
    }

    let id = operator.submit(command).await;
    debug!(%id, ?command, "command queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "id": id,
            "status": "queued",
        })),
    ))
}
