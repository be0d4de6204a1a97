//! Core of the Chatter chat backend.
//!
//! This crate owns the two components with real invariants:
//!
//! - [`history::HistoryLog`] -- the append-only, ordered record of every
//!   published message.
//! - [`broadcaster::Broadcaster`] -- owns the history log and the set of
//!   live subscribers, and guarantees that a new subscriber sees its
//!   history snapshot followed by every later message exactly once.
//!
//! It also carries the typed configuration ([`config::ChatConfig`]) shared
//! by the HTTP layer and the server binary.
//!
//! Nothing in this crate knows about HTTP. The routing layer maps
//! publish, subscribe, and list-history onto its transport.

pub mod broadcaster;
pub mod config;
pub mod error;
pub mod history;

pub use broadcaster::{Broadcaster, BroadcasterStats, Subscription};
pub use config::{ChatConfig, ConfigError};
pub use error::CoreError;
pub use history::HistoryLog;
