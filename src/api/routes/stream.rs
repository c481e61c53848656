//! WebSocket stream of finished ticks

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::api::state::ApiState;

/// GET /api/v1/stream
///
/// Sends every new payload as a JSON text message
pub async fn payload_stream(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(|socket| handle_stream(socket, state))
}

async fn handle_stream(socket: WebSocket, state: ApiState) {
    info!("stream client connected");

    let (mut sender, mut receiver) = socket.split();
    let mut payload_rx = state.refresh.subscribe();

    let mut send_task = tokio::spawn(async move {
        loop {
            let payload = match payload_rx.recv().await {
                Ok(payload) => payload,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("stream client lagged, skipped {skipped} payloads");
                    continue;
                }
                Err(RecvError::Closed) => {
                    debug!("payload channel closed");
                    break;
                }
            };

            let text = match serde_json::to_string(&payload) {
                Ok(text) => text,
                Err(e) => {
                    warn!("failed to serialize payload {}: {e}", payload.tick);
                    continue;
                }
            };

            if sender.send(Message::Text(text)).await.is_err() {
                debug!("stream send failed, client disconnected");
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    info!("stream client disconnected");
}
