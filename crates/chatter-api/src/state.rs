//! Shared application state for the HTTP API.

use std::sync::Arc;

use chatter_core::config::{DemoConfig, StreamConfig};
use chatter_core::{Broadcaster, ChatConfig};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// broadcaster is constructed by the caller and handed in, so tests and
/// the server binary decide its lifetime.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The message broadcaster behind every publish and subscribe route.
    pub broadcaster: Arc<Broadcaster>,
    /// Demo stream settings.
    pub demo: DemoConfig,
    /// Streaming response settings.
    pub stream: StreamConfig,
}

impl AppState {
    /// Create application state with default demo and stream settings.
    pub fn new(broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            broadcaster,
            demo: DemoConfig::default(),
            stream: StreamConfig::default(),
        }
    }

    /// Create application state from loaded configuration.
    pub fn from_config(broadcaster: Arc<Broadcaster>, config: &ChatConfig) -> Self {
        Self {
            broadcaster,
            demo: config.demo.clone(),
            stream: config.stream.clone(),
        }
    }
}
