//! Configuration loading and typed config structures for Chatter.
//!
//! The configuration lives in `chatter-config.yaml` next to the binary's
//! working directory. Every field has a default, so an absent file or a
//! partial file is valid. A handful of deployment settings can be
//! overridden through environment variables.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held a value that could not be parsed.
    #[error("invalid value for {name}: {message}")]
    InvalidEnv {
        /// The environment variable name.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// A setting holds a value the server cannot run with.
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        /// Dotted path of the offending setting.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `chatter-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatConfig {
    /// Listen address for the HTTP server.
    #[serde(default)]
    pub server: ListenConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Demo generator settings.
    #[serde(default)]
    pub demo: DemoConfig,

    /// Streaming response settings.
    #[serde(default)]
    pub stream: StreamConfig,
}

impl ChatConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `CHATTER_HOST` overrides `server.host`
    /// - `CHATTER_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML,
    /// [`ConfigError::InvalidEnv`] if an override cannot be parsed, or
    /// [`ConfigError::Invalid`] if a setting fails [`Self::validate`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No overrides are applied.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a setting fails [`Self::validate`].
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that deserialize fine but cannot drive the server.
    ///
    /// Stream intervals must be nonzero: a zero keep-alive or demo interval
    /// would make its stream fire continuously.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("stream.keep_alive_secs", self.stream.keep_alive_secs),
            ("demo.greeting_interval_ms", self.demo.greeting_interval_ms),
            ("demo.canned_interval_ms", self.demo.canned_interval_ms),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: String::from("must be greater than zero"),
                });
            }
        }
        Ok(())
    }

    /// Override settings with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `CHATTER_PORT` is not a
    /// valid port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Override settings using `lookup` to resolve variable names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `CHATTER_PORT` is not a
    /// valid port number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CHATTER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("CHATTER_PORT") {
            self.server.port = port.parse().map_err(|e| ConfigError::InvalidEnv {
                name: "CHATTER_PORT",
                message: format!("{port:?}: {e}"),
            })?;
        }
        Ok(())
    }
}

/// Listen address for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive). `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON-formatted log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Settings for the synthetic demo streams.
///
/// The demo streams are independent of real publication.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// Whether the demo routes are mounted.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Milliseconds between messages of the endless greeting stream.
    #[serde(default = "default_greeting_interval_ms")]
    pub greeting_interval_ms: u64,

    /// Milliseconds between messages of the canned stream.
    #[serde(default = "default_canned_interval_ms")]
    pub canned_interval_ms: u64,

    /// Text carried by every demo message.
    #[serde(default = "default_greeting_text")]
    pub greeting_text: String,

    /// Authors of the canned stream, in emission order.
    #[serde(default = "default_canned_users")]
    pub canned_users: Vec<String>,
}

impl DemoConfig {
    /// Interval between greeting messages.
    pub const fn greeting_interval(&self) -> Duration {
        Duration::from_millis(self.greeting_interval_ms)
    }

    /// Interval between canned messages.
    pub const fn canned_interval(&self) -> Duration {
        Duration::from_millis(self.canned_interval_ms)
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            greeting_interval_ms: default_greeting_interval_ms(),
            canned_interval_ms: default_canned_interval_ms(),
            greeting_text: default_greeting_text(),
            canned_users: default_canned_users(),
        }
    }
}

/// Settings for streaming responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamConfig {
    /// Seconds between keep-alive comments on server-sent event streams.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

impl StreamConfig {
    /// Interval between keep-alive comments.
    pub const fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

const fn default_greeting_interval_ms() -> u64 {
    3000
}

const fn default_canned_interval_ms() -> u64 {
    2000
}

fn default_greeting_text() -> String {
    "Hello".to_owned()
}

fn default_canned_users() -> Vec<String> {
    ["Kevin", "Garcia", "Rodrigues", "Batista"]
        .into_iter()
        .map(String::from)
        .collect()
}

const fn default_keep_alive_secs() -> u64 {
    15
}
