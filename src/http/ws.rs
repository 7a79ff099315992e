//! WebSocket endpoint for the real-time broadcast rooms.
//!
//! A connected client drives its own subscriptions with `join`/`leave`
//! commands; leaving a room is the only cancellation primitive. Delivery
//! is best-effort: a client that lags past the room buffer simply misses
//! events and reconciles on its next full fetch.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::state::AppState;
use crate::realtime::{Hub, Room};

const OUTBOUND_BUFFER: usize = 64;

/// A command sent by the client over the socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum ClientCommand {
    Join { room: Room },
    Leave { room: Room },
}

/// GET /v1/ws
///
/// Upgrade to a WebSocket session against the broadcast hub.
pub async fn websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| client_session(socket, hub))
}

async fn client_session(socket: WebSocket, hub: Arc<Hub>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

    // Single writer task; room forwarders and acks both go through `tx`.
    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut joined: HashMap<Room, JoinHandle<()>> = HashMap::new();

    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            // Pings are answered by the protocol layer; ignore the rest.
            Ok(_) => continue,
        };

        match serde_json::from_str::<ClientCommand>(&text) {
            Ok(ClientCommand::Join { room }) => {
                joined
                    .entry(room)
                    .or_insert_with(|| spawn_room_forwarder(&hub, room, tx.clone()));
                send_ack(&tx, "joined", room).await;
            }
            Ok(ClientCommand::Leave { room }) => {
                if let Some(task) = joined.remove(&room) {
                    task.abort();
                }
                send_ack(&tx, "left", room).await;
            }
            Err(e) => {
                tracing::debug!(error = %e, "unrecognized websocket command");
                let error = serde_json::json!({
                    "event": "error",
                    "payload": {"message": "unrecognized command"},
                    "timestamp": Utc::now(),
                });
                let _ = tx.send(error.to_string()).await;
            }
        }
    }

    for (_, task) in joined {
        task.abort();
    }
    writer.abort();
    hub.prune_idle_rooms();
}

async fn send_ack(tx: &mpsc::Sender<String>, event: &str, room: Room) {
    let ack = serde_json::json!({
        "event": event,
        "payload": {"room": room},
        "timestamp": Utc::now(),
    });
    let _ = tx.send(ack.to_string()).await;
}

fn spawn_room_forwarder(hub: &Hub, room: Room, tx: mpsc::Sender<String>) -> JoinHandle<()> {
    let mut rx = hub.subscribe(room);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(event.as_ref()) else {
                        continue;
                    };
                    if tx.send(text).await.is_err() {
                        break;
                    }
                }
                // Dropped events are not replayed; the client refetches.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(room = %room, skipped, "websocket client lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
