//! Shared type definitions for the Chatter chat backend.
//!
//! Types defined here are used by the core broadcaster and by the HTTP
//! layer, and flow downstream to `TypeScript` via `ts-rs` for web clients.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for identifiers
//! - [`message`] -- The published chat message and its inbound draft

pub mod ids;
pub mod message;

pub use ids::SubscriberId;
pub use message::{Message, MessageDraft};
