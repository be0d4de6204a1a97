//! Streaming response builders and the live subscription endpoints.
//!
//! Two encodings are offered for any stream of [`Message`]s:
//!
//! - **NDJSON** (`application/x-ndjson`) -- one JSON object per line,
//!   flushed as each message arrives.
//! - **Server-sent events** (`text/event-stream`) -- one `message` event
//!   per item with the JSON object as `data`, plus periodic keep-alive
//!   comments.
//!
//! The response body owns the stream. When the client goes away, Axum
//! drops the body, which drops a [`Subscription`](chatter_core::Subscription)
//! and deregisters it from the broadcaster.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use chatter_types::Message;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::state::AppState;

/// MIME type for newline-delimited JSON.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Name of the server-sent event carrying a message.
pub const MESSAGE_EVENT: &str = "message";

/// Encode a message as a single NDJSON line.
///
/// # Errors
///
/// Returns the serializer error if the message cannot be encoded.
pub fn ndjson_line(message: &Message) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Build a streaming NDJSON response from a message stream.
pub fn ndjson_response<S>(messages: S) -> Response
where
    S: Stream<Item = Message> + Send + 'static,
{
    let lines = messages.map(|message| ndjson_line(&message));
    (
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(lines),
    )
        .into_response()
}

/// Build a server-sent events response from a message stream.
pub fn sse_response<S>(messages: S, keep_alive: Duration) -> Response
where
    S: Stream<Item = Message> + Send + 'static,
{
    let events = messages.map(|message| Event::default().event(MESSAGE_EVENT).json_data(&message));
    Sse::new(events)
        .keep_alive(KeepAlive::new().interval(keep_alive))
        .into_response()
}

/// Subscribe and stream the feed as NDJSON.
///
/// # Route
///
/// `GET /api/messages/live`
pub async fn live_ndjson(State(state): State<Arc<AppState>>) -> Response {
    let subscription = state.broadcaster.subscribe();
    debug!(
        subscriber_id = %subscription.id(),
        snapshot_len = subscription.snapshot_len(),
        "NDJSON subscriber attached"
    );
    ndjson_response(subscription)
}

/// Subscribe and stream the feed as server-sent events.
///
/// # Route
///
/// `GET /api/messages/events`
pub async fn live_sse(State(state): State<Arc<AppState>>) -> Response {
    let subscription = state.broadcaster.subscribe();
    debug!(
        subscriber_id = %subscription.id(),
        snapshot_len = subscription.snapshot_len(),
        "SSE subscriber attached"
    );
    sse_response(subscription, state.stream.keep_alive())
}
