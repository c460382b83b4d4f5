//! `WebSocket` stream of tick summaries.
//!
//! `GET /ws/ticks` upgrades to a socket that speaks in [`TickFrame`]s, one
//! JSON text frame each:
//!
//! ```text
//! {"type":"hello","tick":41}
//! {"type":"tick","summary":{...}}
//! {"type":"lagged","skipped":3}
//! ```
//!
//! `hello` carries the last published tick so a client knows where the
//! stream picks up. A client that falls behind gets a `lagged` frame with
//! the number of summaries it missed, then continues from the newest one.
//! The socket is read only for close and ping; farm commands go through
//! `POST /api/commands`.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::Serialize;
use tilth_core::TickSummary;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// One message on the tick stream.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TickFrame<'a> {
    /// First frame after connecting.
    Hello {
        /// Last tick published before the client joined.
        tick: u64,
    },
    /// A completed tick.
    Tick {
        /// The tick's summary.
        summary: &'a TickSummary,
    },
    /// The client missed summaries.
    Lagged {
        /// How many were dropped.
        skipped: u64,
    },
}

impl TickFrame<'_> {
    /// Encode as a text frame, or `None` if serialization fails.
    pub fn to_message(&self) -> Option<Message> {
        serde_json::to_string(self)
            .inspect_err(|e| warn!(error = %e, "failed to encode tick frame"))
            .ok()
            .map(|json| Message::Text(json.into()))
    }
}

/// Upgrade to a `WebSocket` and start streaming.
///
/// # Route
///
/// `GET /ws/ticks`
pub async fn ws_ticks(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_ticks(socket, state))
}

/// Send a frame; `false` once the client is gone.
async fn send(socket: &mut WebSocket, frame: &TickFrame<'_>) -> bool {
    let Some(message) = frame.to_message() else {
        return true;
    };
    socket.send(message).await.is_ok()
}

async fn stream_ticks(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.subscribe();
    let tick = state.farm.read().await.tick();
    debug!(tick, "tick stream opened");
    if !send(&mut socket, &TickFrame::Hello { tick }).await {
        return;
    }

    loop {
        tokio::select! {
            received = rx.recv() => {
                let delivered = match received {
                    Ok(summary) => send(&mut socket, &TickFrame::Tick { summary: &summary }).await,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "tick stream lagged");
                        send(&mut socket, &TickFrame::Lagged { skipped }).await
                    }
                    Err(RecvError::Closed) => {
                        debug!("tick broadcast closed");
                        let _ = socket.send(Message::Close(None)).await;
                        return;
                    }
                };
                if !delivered {
                    debug!("tick stream client gone");
                    return;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => {
                    debug!("tick stream closed by client");
                    return;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn frame_json(frame: &TickFrame<'_>) -> Value {
        serde_json::to_value(frame).unwrap()
    }

    #[test]
    fn control_frames_are_tagged() {
        assert_eq!(
            frame_json(&TickFrame::Hello { tick: 41 }),
            json!({"type": "hello", "tick": 41})
        );
        assert_eq!(
            frame_json(&TickFrame::Lagged { skipped: 3 }),
            json!({"type": "lagged", "skipped": 3})
        );
    }

    #[test]
    fn tick_frame_wraps_the_summary() {
        let mut ctx =
            tilth_core::SimulationContext::new(tilth_core::SimulationConfig::default()).unwrap();
        let summary = tilth_core::run_tick(&mut ctx, Vec::new()).unwrap().unwrap();
        let value = frame_json(&TickFrame::Tick { summary: &summary });
        assert_eq!(value["type"], "tick");
        assert_eq!(value["summary"]["tick"], 1);
        assert!(TickFrame::Tick { summary: &summary }.to_message().is_some());
    }
}
