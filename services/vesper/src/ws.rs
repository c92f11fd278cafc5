use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::info;

use crate::routes::{AppState, CommandRequest, CommandResponse, StatusPayload};

/// Handles WebSocket upgrade requests.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manages an individual WebSocket connection.
///
/// The server pushes a status snapshot once a second; the client may send
/// `{"text": "..."}` frames at any time and gets a command response frame
/// back for each. Malformed frames are logged and skipped rather than
/// closing the connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("WebSocket connection established");
    let (mut sender, mut receiver) = socket.split();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let payload = StatusPayload::from_snapshot(state.resolver.snapshot().await);
                let Ok(text) = serde_json::to_string(&payload) else { continue };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    // Client disconnected.
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let request = match serde_json::from_str::<CommandRequest>(&text) {
                            Ok(request) => request,
                            Err(e) => {
                                tracing::warn!(error = %e, "ignoring malformed command frame");
                                continue;
                            }
                        };
                        if request.text.trim().is_empty() {
                            continue;
                        }
                        let result = state.resolver.resolve(&request.text).await;
                        let response = CommandResponse::from_result(result);
                        let Ok(text) = serde_json::to_string(&response) else { continue };
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        info!("WebSocket error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    info!("WebSocket connection closed");
}
