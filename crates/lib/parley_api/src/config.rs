//! API server configuration.

use std::env;

use parley_core::provider::ProviderError;
use parley_core::provider::config::ProviderConfig;
use thiserror::Error;

/// Default request body limit: room for five 10 MiB attachments in base64.
pub const DEFAULT_MAX_BODY_BYTES: usize = 72 * 1024 * 1024;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Provider config: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:5000").
    pub bind_addr: String,
    /// Maximum accepted request body size, in bytes.
    pub max_body_bytes: usize,
    /// Generation provider settings.
    pub provider: ProviderConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            provider: ProviderConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable         | Default            |
    /// |------------------|--------------------|
    /// | `BIND_ADDR`      | `127.0.0.1:5000`   |
    /// | `MAX_BODY_BYTES` | `75497472` (72 MiB) |
    ///
    /// Provider variables are documented on [`ProviderConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let max_body_bytes = match env::var("MAX_BODY_BYTES") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "MAX_BODY_BYTES",
                value: raw,
            })?,
            Err(_) => defaults.max_body_bytes,
        };
        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_body_bytes,
            provider: ProviderConfig::from_env()?,
        })
    }
}
