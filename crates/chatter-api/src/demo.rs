//! Synthetic demo streams.
//!
//! These generators produce their own messages on a timer and never
//! touch the broadcaster or its history. They exist so a client can try
//! out the streaming encodings without anyone publishing.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::Response;
use chatter_types::Message;
use futures::{Stream, StreamExt};
use tokio::time::sleep;

use crate::state::AppState;
use crate::stream::{ndjson_response, sse_response};

/// An endless stream of identical greetings from `name`.
///
/// Each message is emitted `interval` after the previous one (the first
/// after one `interval`) and stamped when emitted.
pub fn greetings(name: String, text: String, interval: Duration) -> impl Stream<Item = Message> {
    futures::stream::unfold((name, text), move |(name, text)| async move {
        sleep(interval).await;
        let message = Message::stamped(name.clone(), text.clone());
        Some((message, (name, text)))
    })
}

/// A finite stream with one message per user, in order, spaced by
/// `interval`.
pub fn canned(users: Vec<String>, text: String, interval: Duration) -> impl Stream<Item = Message> {
    futures::stream::iter(users).then(move |user| {
        let text = text.clone();
        async move {
            sleep(interval).await;
            Message::stamped(user, text)
        }
    })
}

/// Stream endless greetings from `name` as NDJSON.
///
/// # Route
///
/// `GET /api/demo/greetings/{name}`
pub async fn demo_greetings(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let stream = greetings(
        name,
        state.demo.greeting_text.clone(),
        state.demo.greeting_interval(),
    );
    ndjson_response(stream)
}

/// Stream the canned messages as server-sent events.
///
/// # Route
///
/// `GET /api/demo/canned`
pub async fn demo_canned(State(state): State<Arc<AppState>>) -> Response {
    let stream = canned(
        state.demo.canned_users.clone(),
        state.demo.greeting_text.clone(),
        state.demo.canned_interval(),
    );
    sse_response(stream, state.stream.keep_alive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn greetings_repeat_forever() {
        let stream = greetings(
            String::from("Ann"),
            String::from("Hello"),
            Duration::from_secs(3),
        );
        let messages: Vec<Message> = stream.take(5).collect().await;

        assert_eq!(messages.len(), 5);
        assert!(messages.iter().all(|m| m.user == "Ann" && m.text == "Hello"));
    }

    #[tokio::test(start_paused = true)]
    async fn greetings_wait_one_interval_per_message() {
        let start = tokio::time::Instant::now();
        let stream = greetings(
            String::from("Ann"),
            String::from("Hello"),
            Duration::from_secs(3),
        );
        let _: Vec<Message> = stream.take(2).collect().await;
        assert!(start.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn canned_emits_each_user_once_in_order() {
        let users = vec![String::from("Kevin"), String::from("Garcia")];
        let messages: Vec<Message> = canned(users, String::from("Hello"), Duration::from_secs(2))
            .collect()
            .await;

        let names: Vec<&str> = messages.iter().map(|m| m.user.as_str()).collect();
        assert_eq!(names, ["Kevin", "Garcia"]);
    }

    #[tokio::test(start_paused = true)]
    async fn canned_with_no_users_is_empty() {
        let messages: Vec<Message> = canned(Vec::new(), String::from("Hello"), Duration::from_secs(2))
            .collect()
            .await;
        assert!(messages.is_empty());
    }
}
