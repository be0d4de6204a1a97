//! Chatter server binary.
//!
//! Wires the message broadcaster to the HTTP API and serves it until
//! interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `chatter-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Create the broadcaster and application state
//! 4. Serve the HTTP API until `Ctrl-C`

mod error;

use std::path::Path;
use std::sync::Arc;

use chatter_api::AppState;
use chatter_core::config::LoggingConfig;
use chatter_core::{Broadcaster, ChatConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ServerBinError;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "chatter-config.yaml";

/// Application entry point for the chat server.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the server
/// fails to bind or serve.
#[tokio::main]
async fn main() -> Result<(), ServerBinError> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("chatter-server starting");
    if from_file {
        info!(path = CONFIG_PATH, "Configuration loaded");
    } else {
        info!("Config file not found, using defaults");
    }
    info!(
        host = config.server.host,
        port = config.server.port,
        demo_enabled = config.demo.enabled,
        "Effective configuration"
    );

    // 3. Create the broadcaster and shared state.
    let broadcaster = Arc::new(Broadcaster::new());
    let state = Arc::new(AppState::from_config(broadcaster, &config));

    // 4. Serve until interrupted.
    tokio::select! {
        result = chatter_api::start_server(&config.server, state) => result?,
        () = shutdown_signal() => info!("Shutdown signal received"),
    }

    info!("chatter-server shutdown complete");
    Ok(())
}

/// Load configuration from [`CONFIG_PATH`], falling back to defaults.
///
/// Returns the configuration and whether it came from the file.
/// Environment overrides apply in both cases.
fn load_config() -> Result<(ChatConfig, bool), ServerBinError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((ChatConfig::from_file(config_path)?, true))
    } else {
        let mut config = ChatConfig::default();
        config.apply_env_overrides()?;
        Ok((config, false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve when the process receives `Ctrl-C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}
