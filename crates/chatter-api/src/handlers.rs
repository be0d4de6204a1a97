//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Message and subscriber counts |
//! | `POST` | `/api/messages` | Publish a message |
//! | `GET` | `/api/messages` | Every message published so far |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{Html, IntoResponse};
use chatter_types::{Message, MessageDraft};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing counts and the available routes.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.broadcaster.stats();
    let messages = stats.messages;
    let subscribers = stats.subscribers;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Chatter</title>
    <style>
        body {{ font-family: monospace; margin: 2rem; }}
        .metric {{ display: inline-block; margin-right: 2rem; }}
        .value {{ font-size: 1.5rem; }}
    </style>
</head>
<body>
    <h1>Chatter</h1>

    <div>
        <div class="metric">
            <div class="label">Messages</div>
            <div class="value">{messages}</div>
        </div>
        <div class="metric">
            <div class="label">Subscribers</div>
            <div class="value">{subscribers}</div>
        </div>
    </div>

    <h2>API</h2>
    <ul>
        <li><code>POST</code> /api/messages -- Publish <code>{{"user": "...", "text": "..."}}</code></li>
        <li><code>GET</code> <a href="/api/messages">/api/messages</a> -- History</li>
        <li><code>GET</code> <a href="/api/messages/live">/api/messages/live</a> -- Live feed (NDJSON)</li>
        <li><code>GET</code> <a href="/api/messages/events">/api/messages/events</a> -- Live feed (SSE)</li>
        <li><code>GET</code> <a href="/api/status">/api/status</a> -- Counts</li>
        <li><code>ws://host:port/ws/messages</code> -- Live feed (WebSocket)</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Return the current message and subscriber counts.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.broadcaster.stats())
}

// ---------------------------------------------------------------------------
// POST /api/messages -- publish
// ---------------------------------------------------------------------------

/// Publish a message and return it with its timestamp.
///
/// The body must be a JSON object with `user` and `text` string fields.
/// Empty strings are accepted; absent or `null` fields are rejected with
/// `400 Bad Request`.
pub async fn publish(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MessageDraft>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(draft) = payload?;
    let message = state.broadcaster.publish(draft)?;
    info!(user = %message.user, "Message posted");
    Ok(Json(message))
}

// ---------------------------------------------------------------------------
// GET /api/messages -- history
// ---------------------------------------------------------------------------

/// Return every message published so far, oldest first.
pub async fn list_messages(State(state): State<Arc<AppState>>) -> Json<Vec<Message>> {
    Json(state.broadcaster.history())
}
