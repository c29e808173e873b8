//! Environment configuration.
//!
//! Credentials and endpoints are resolved here, before the gateway is
//! constructed. The gateway core never reads the environment itself; it
//! only consumes the ready/not-ready state that results from this step.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

pub const DEFAULT_PAPER_URL: &str = "https://paper-api.alpaca.markets";
pub const DEFAULT_DATA_URL: &str = "https://data.alpaca.markets";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Alpaca API keys not found. Set APCA_API_KEY_ID and APCA_API_SECRET_KEY in the environment or .env file")]
    MissingKeys,

    #[error("Invalid {var} '{value}': {reason}")]
    InvalidUrl {
        var: String,
        value: String,
        reason: String,
    },
}

/// Alpaca credentials and endpoints.
#[derive(Clone)]
pub struct AlpacaConfig {
    pub key_id: String,
    pub secret_key: Zeroizing<String>,
    pub trading_base_url: String,
    pub data_base_url: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for AlpacaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlpacaConfig")
            .field("key_id", &self.key_id)
            .field("secret_key", &"<REDACTED>")
            .field("trading_base_url", &self.trading_base_url)
            .field("data_base_url", &self.data_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl AlpacaConfig {
    /// Load configuration from environment variables. Base URLs default to
    /// the paper-trading and market-data hosts.
    pub fn from_env() -> Result<Self, ConfigError> {
        let key_id = non_empty_env("APCA_API_KEY_ID");
        let secret_key = non_empty_env("APCA_API_SECRET_KEY");
        let (key_id, secret_key) = match (key_id, secret_key) {
            (Some(key_id), Some(secret_key)) => (key_id, secret_key),
            _ => return Err(ConfigError::MissingKeys),
        };

        let trading_base_url = env_url("APCA_API_BASE_URL", DEFAULT_PAPER_URL)?;
        let data_base_url = env_url("APCA_API_DATA_URL", DEFAULT_DATA_URL)?;

        let mut request_timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        if let Ok(secs) = std::env::var("ALPACA_HTTP_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(value) if value > 0 => request_timeout = Duration::from_secs(value),
                _ => tracing::warn!(
                    "Invalid ALPACA_HTTP_TIMEOUT_SECS '{}', using default: {}s",
                    secs,
                    DEFAULT_TIMEOUT_SECS
                ),
            }
        }

        Ok(Self {
            key_id,
            secret_key: Zeroizing::new(secret_key),
            trading_base_url,
            data_base_url,
            request_timeout,
        })
    }
}

/// Listen address for the HTTP layer.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let raw = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = match raw.parse() {
            Ok(addr) => addr,
            Err(_) => {
                tracing::warn!("Invalid BIND_ADDR '{}', using default: {}", raw, DEFAULT_BIND_ADDR);
                DEFAULT_BIND_ADDR
                    .parse()
                    .expect("default bind address is valid")
            }
        };
        Self { bind_addr }
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn env_url(var: &str, default: &str) -> Result<String, ConfigError> {
    let value = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&value).map_err(|e| ConfigError::InvalidUrl {
        var: var.to_string(),
        value: value.clone(),
        reason: e.to_string(),
    })?;
    Ok(value.trim_end_matches('/').to_string())
}
