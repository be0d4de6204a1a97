//! Chat message types.
//!
//! A [`Message`] is created exactly once, when it is published, and is
//! never mutated afterwards. A [`MessageDraft`] is the payload a client
//! submits to be published; its fields are optional so that a missing
//! `user` or `text` can be rejected with a precise error instead of a
//! generic deserialization failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A published chat message.
///
/// `timestamp` is the wall-clock time of publication and is serialized
/// as an RFC 3339 string (e.g. `2026-10-19T12:00:00.123456Z`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Message {
    /// Display name of the author.
    pub user: String,
    /// Message body. May be empty.
    pub text: String,
    /// When the message was published.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current wall-clock time.
    pub fn stamped(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// An unpublished message as submitted by a client.
///
/// Both fields must be present for the draft to be published. Empty
/// strings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MessageDraft {
    /// Display name of the author.
    #[serde(default)]
    pub user: Option<String>,
    /// Message body.
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageDraft {
    /// Build a complete draft from a user and a text.
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            text: Some(text.into()),
        }
    }
}
