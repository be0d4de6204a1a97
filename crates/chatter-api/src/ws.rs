//! `WebSocket` handler for the live message feed.
//!
//! Clients connect to `GET /ws/messages` and receive one JSON-encoded
//! [`Message`](chatter_types::Message) text frame per message: first the
//! history snapshot, then each new message as it is published.
//!
//! The connection owns its [`Subscription`]; when the client disconnects
//! the handler returns and the subscription is deregistered.

use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chatter_core::Subscription;
use futures::StreamExt;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming messages.
///
/// # Route
///
/// `GET /ws/messages`
pub async fn ws_messages(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Subscribe before the upgrade completes so the snapshot reflects the
    // moment the client asked.
    let subscription = state.broadcaster.subscribe();
    ws.on_upgrade(move |socket| handle_ws(socket, subscription))
}

/// Forward each message of the subscription as a text frame until either
/// side goes away.
async fn handle_ws(mut socket: WebSocket, mut subscription: Subscription) {
    let subscriber_id = subscription.id();
    debug!(%subscriber_id, "WebSocket client connected");

    loop {
        tokio::select! {
            next = subscription.next() => {
                let Some(message) = next else {
                    debug!(%subscriber_id, "Broadcaster closed, shutting down WebSocket");
                    let _ = socket.send(WsMessage::Close(None)).await;
                    return;
                };
                let json = match serde_json::to_string(&message) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!("Failed to serialize message: {e}");
                        continue;
                    }
                };
                if socket.send(WsMessage::Text(json.into())).await.is_err() {
                    debug!(%subscriber_id, "WebSocket client disconnected (send failed)");
                    return;
                }
            }
            // Check if the client sent a close frame or disconnected.
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(WsMessage::Close(_))) | None => {
                        debug!(%subscriber_id, "WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        if socket.send(WsMessage::Pong(data)).await.is_err() {
                            debug!(%subscriber_id, "WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%subscriber_id, "WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Clients publish over REST; inbound frames are ignored.
                    }
                }
            }
        }
    }
}
