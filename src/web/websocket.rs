//! WebSocket handler pushing status snapshots to connected clients.

use crate::web::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Text message a client sends to stop the active run.
pub const STOP_COMMAND: &str = "stop";

/// WebSocket upgrade handler.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let connected = state.client_count().await;
    if connected >= state.config.max_websocket_connections {
        warn!(
            "Refusing WebSocket client, {} of {} connections in use",
            connected, state.config.max_websocket_connections
        );
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_websocket(socket: WebSocket, state: AppState) {
    let client_id = uuid::Uuid::new_v4().to_string();
    info!("WebSocket client connected: {}", client_id);
    state.register_client(&client_id).await;

    let (mut sender, mut receiver) = socket.split();

    // Handle incoming messages from the client
    let client_id_recv = client_id.clone();
    let controller = state.controller.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    debug!("Received message from {}: {}", client_id_recv, text);
                    if text.trim().eq_ignore_ascii_case(STOP_COMMAND) {
                        controller.stop();
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket client {} disconnected", client_id_recv);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket error for client {}: {}", client_id_recv, e);
                    break;
                }
            }
        }
    });

    // Push the status snapshot on every interval
    let client_id_send = client_id.clone();
    let controller = state.controller.clone();
    let push_interval = state.config.status_push_interval();
    let mut send_task = tokio::spawn(async move {
        let mut ticks = interval(push_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticks.tick().await;
            match serde_json::to_string(&controller.status()) {
                Ok(json_string) => {
                    if let Err(e) = sender.send(Message::Text(json_string)).await {
                        warn!("Failed to send message to client {}: {}", client_id_send, e);
                        break;
                    }
                }
                Err(e) => {
                    error!(
                        "Failed to serialize status for client {}: {}",
                        client_id_send, e
                    );
                }
            }
        }
    });

    // Wait for either task to complete, then stop the other
    tokio::select! {
        _ = &mut recv_task => {
            debug!("Receive task completed for client {}", client_id);
            send_task.abort();
        }
        _ = &mut send_task => {
            debug!("Send task completed for client {}", client_id);
            recv_task.abort();
        }
    }

    match state.remove_client(&client_id).await {
        Some(client) => info!(
            "WebSocket client disconnected: {} after {}s",
            client.id,
            (Utc::now() - client.connected_at).num_seconds()
        ),
        None => info!("WebSocket client disconnected: {}", client_id),
    }
}
