//! # Configuration
//!
//! Process configuration for the routing engine.
//!
//! Loaded from defaults, then a JSON file when `CORRIDOR_CONFIG` points
//! at one, then environment overrides for the operational knobs.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CORRIDOR_CONFIG` | Path to a JSON config file | unset |
//! | `CORRIDOR_HOST` | HTTP bind host | `0.0.0.0` |
//! | `CORRIDOR_PORT` | HTTP bind port | `8080` |
//! | `CORRIDOR_REDIS_URL` | Redis URL; unset runs the in-memory store | unset |
//! | `CORRIDOR_FAST_PERIOD_SECS` | Fast prefetch tier period | `30` |
//! | `CORRIDOR_SLOW_PERIOD_SECS` | Slow prefetch tier period | `60` |

use crate::application::prefetch::PrefetchConfig;
use crate::application::scorer::ScoringConfig;
use crate::application::pipeline::DepositConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("invalid config value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns an error when host and port do not parse as an address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                field: "server.host:port".to_string(),
                message: format!("{e}"),
            })
    }
}

/// Key-value store backend selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis URL. Unset selects the in-memory store (single-process
    /// deployments and development).
    #[serde(default)]
    pub redis_url: Option<String>,
}

/// One configured HTTP FX feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxFeedConfig {
    /// Venue id the feed's quotes carry.
    pub venue_id: String,
    /// Base URL of the feed.
    pub base_url: String,
    /// Pairs to poll, as `BASE/QUOTE` codes.
    pub pairs: Vec<String>,
}

/// Quote provider wiring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Serve the built-in static development book on the fast tier.
    #[serde(default = "default_true")]
    pub static_book: bool,
    /// Single-pair rate-limited FX feed, when configured.
    #[serde(default)]
    pub fx_single: Option<FxFeedConfig>,
    /// Batched FX feed, when configured.
    #[serde(default)]
    pub fx_batch: Option<FxFeedConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            static_book: true,
            fx_single: None,
            fx_batch: None,
        }
    }
}

/// Execution simulator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Per-step settlement delay in milliseconds.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server.
    #[serde(default)]
    pub server: ServerConfig,
    /// Store backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Prefetch cadences.
    #[serde(default)]
    pub prefetch: PrefetchConfig,
    /// Provider wiring.
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Scoring tables.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Deposit banking details.
    #[serde(default)]
    pub deposits: DepositConfig,
    /// Execution simulator.
    #[serde(default)]
    pub executor: ExecutorConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_step_delay_ms() -> u64 {
    2_000
}

impl AppConfig {
    /// Loads configuration: defaults, then the `CORRIDOR_CONFIG` file
    /// when present, then environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is unreadable or a value is
    /// invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("CORRIDOR_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is unreadable or unparseable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("CORRIDOR_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("CORRIDOR_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }
        if let Ok(url) = std::env::var("CORRIDOR_REDIS_URL") {
            self.store.redis_url = Some(url);
        }
        if let Ok(secs) = std::env::var("CORRIDOR_FAST_PERIOD_SECS")
            && let Ok(secs) = secs.parse()
        {
            self.prefetch.fast_period_secs = secs;
        }
        if let Ok(secs) = std::env::var("CORRIDOR_SLOW_PERIOD_SECS")
            && let Ok(secs) = secs.parse()
        {
            self.prefetch.slow_period_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.prefetch.fast_period_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "prefetch.fast_period_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        for feed in [&self.providers.fx_single, &self.providers.fx_batch]
            .into_iter()
            .flatten()
        {
            if feed.pairs.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "providers.fx.pairs".to_string(),
                    message: format!("feed {} has no pairs", feed.venue_id),
                });
            }
        }
        self.server.socket_addr().map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert!(config.store.redis_url.is_none());
        assert_eq!(config.prefetch.fast_period_secs, 30);
        assert!(config.providers.fx_single.is_none());
    }

    #[test]
    fn socket_addr_parses() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
        };
        assert_eq!(server.socket_addr().unwrap().port(), 9000);
    }

    #[test]
    fn bad_host_is_rejected() {
        let server = ServerConfig {
            host: "not a host".to_string(),
            port: 9000,
        };
        assert!(server.socket_addr().is_err());
    }

    #[test]
    fn empty_feed_pairs_rejected() {
        let mut config = AppConfig::default();
        config.providers.fx_single = Some(FxFeedConfig {
            venue_id: "fx:openrates".to_string(),
            base_url: "https://rates.example".to_string(),
            pairs: vec![],
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_fast_period_rejected() {
        let mut config = AppConfig::default();
        config.prefetch.fast_period_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.server.port, config.server.port);
    }
}
