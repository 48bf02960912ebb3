//! Provider configuration resolution.
//!
//! Resolves provider settings from environment variables with defaults.

use std::env;
use std::fmt;
use std::str::FromStr;

use super::ProviderError;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Which provider implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Local,
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "local" => Ok(ProviderKind::Local),
            other => Err(ProviderError::Config(format!("Unsupported provider: {other}"))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => f.write_str("gemini"),
            ProviderKind::Local => f.write_str("local"),
        }
    }
}

/// Resolved provider configuration.
#[derive(Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Gemini API key (required when `kind` is `Gemini`).
    pub api_key: Option<String>,
    /// Base URL of the Gemini REST API.
    pub base_url: String,
    /// Model used for text and chart generation.
    pub text_model: String,
    /// Model used for image generation.
    pub image_model: String,
    /// HTTP request timeout, in seconds.
    pub timeout_secs: u64,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Local,
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    /// Read configuration from environment variables.
    ///
    /// | Variable                | Default                                      |
    /// |-------------------------|----------------------------------------------|
    /// | `PARLEY_PROVIDER`       | `gemini` if `GEMINI_API_KEY` is set, else `local` |
    /// | `GEMINI_API_KEY`        | unset                                        |
    /// | `GEMINI_BASE_URL`       | `https://generativelanguage.googleapis.com`  |
    /// | `GEMINI_TEXT_MODEL`     | `gemini-2.5-flash`                           |
    /// | `GEMINI_IMAGE_MODEL`    | `gemini-2.0-flash-exp`                       |
    /// | `PROVIDER_TIMEOUT_SECS` | `60`                                         |
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ProviderError> {
        let defaults = Self::default();
        let api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());

        // Auto-select gemini when a key is available and no provider was chosen
        let kind = match lookup("PARLEY_PROVIDER") {
            Some(explicit) => explicit.parse()?,
            None if api_key.is_some() => ProviderKind::Gemini,
            None => ProviderKind::Local,
        };

        let timeout_secs = match lookup("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ProviderError::Config(format!("Invalid PROVIDER_TIMEOUT_SECS: {raw}"))
            })?,
            None => defaults.timeout_secs,
        };

        Ok(Self {
            kind,
            api_key,
            base_url: lookup("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            text_model: lookup("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: lookup("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            timeout_secs,
        })
    }
}
