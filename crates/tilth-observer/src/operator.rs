//! Operator REST handlers for runtime simulation control.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/operator/pause` | Pause the tick loop |
//! | `POST` | `/api/operator/resume` | Resume the tick loop |
//! | `POST` | `/api/operator/speed` | Set tick interval (ms) |
//! | `GET` | `/api/operator/status` | Current simulation status |
//! | `POST` | `/api/operator/stop` | Trigger clean shutdown |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use tilth_core::OperatorState;
use tilth_core::operator::MIN_TICK_INTERVAL_MS;

use crate::error::ObserverError;
use crate::state::AppState;

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// New tick interval in milliseconds (minimum 100).
    pub tick_interval_ms: u64,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    ok: bool,
    message: String,
}

fn operator(state: &AppState) -> Result<&Arc<OperatorState>, ObserverError> {
    state
        .operator_state
        .as_ref()
        .ok_or_else(|| ObserverError::Internal("operator state not available".to_owned()))
}

/// Pause the tick loop. The farm is left exactly as it is.
pub async fn pause(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.pause();
    Ok(Json(OperatorResponse {
        ok: true,
        message: "Simulation paused".to_owned(),
    }))
}

/// Resume the tick loop after a pause.
pub async fn resume(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.resume();
    Ok(Json(OperatorResponse {
        ok: true,
        message: "Simulation resumed".to_owned(),
    }))
}

/// Change the tick interval at runtime.
///
/// Takes effect before the next tick's sleep.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?
        .set_tick_interval_ms(body.tick_interval_ms)
        .map_or_else(
            || {
                Err(ObserverError::InvalidRequest(format!(
                    "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}"
                )))
            },
            |prev| {
                Ok(Json(serde_json::json!({
                    "ok": true,
                    "message": format!("Tick interval changed from {prev}ms to {}ms", body.tick_interval_ms),
                    "previous_interval_ms": prev,
                    "new_interval_ms": body.tick_interval_ms,
                })))
            },
        )
}

/// Return the current simulation status.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let operator = operator(&state)?;
    let tick = state.farm.read().await.tick();
    Ok(Json(operator.status(tick).await))
}

/// Trigger a clean shutdown after the current tick.
///
/// The HTTP server keeps running so the final farm can still be read.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.request_stop();
    Ok(Json(OperatorResponse {
        ok: true,
        message: "Stop requested -- simulation will end after current tick".to_owned(),
    }))
}
