//! HTTP API for the Chatter chat backend.
//!
//! This crate maps the three core operations onto HTTP:
//!
//! - **Publish** -- `POST /api/messages`
//! - **List history** -- `GET /api/messages`
//! - **Subscribe** -- as newline-delimited JSON (`GET /api/messages/live`),
//!   server-sent events (`GET /api/messages/events`), or a `WebSocket`
//!   (`GET /ws/messages`)
//!
//! It also serves two synthetic demo streams that never touch the
//! broadcaster, a status endpoint, and a minimal HTML status page.
//!
//! # Architecture
//!
//! All handlers share one [`AppState`] holding the injected
//! [`Broadcaster`](chatter_core::Broadcaster). Streaming handlers own the
//! [`Subscription`](chatter_core::Subscription) for the lifetime of the
//! response, so a client disconnect drops it and deregisters the
//! subscriber.

pub mod demo;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod stream;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{serve, start_server, ServerError};
pub use state::AppState;
