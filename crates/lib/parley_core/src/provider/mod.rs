//! Generative-AI providers.
//!
//! The chat orchestrator talks to a [`GenerationProvider`] and never to a
//! vendor API directly.
//!
//! # Providers
//!
//! - `"gemini"`: Google Gemini `generateContent` REST API
//! - `"local"`: deterministic offline replies (no external calls)

pub mod config;
pub mod gemini;
pub mod local;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ChartSpec;

use config::{ProviderConfig, ProviderKind};

/// Errors returned by providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response parse error: {0}")]
    Parse(String),

    /// The call succeeded but carried nothing to use.
    #[error("No content: {0}")]
    NoContent(String),
}

/// One piece of a multimodal prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    /// Base64-encoded binary content.
    InlineData { mime_type: String, data: String },
}

impl PromptPart {
    pub fn text(text: impl Into<String>) -> Self {
        PromptPart::Text(text.into())
    }
}

/// An image returned by a provider, base64-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: String,
}

/// A text, chart and image generator.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short identifier used in logs and the health endpoint.
    fn name(&self) -> &str;

    /// Generate the primary text reply for a prompt.
    async fn generate_text(&self, parts: Vec<PromptPart>) -> Result<String, ProviderError>;

    /// Generate chart data for a prompt.
    async fn generate_chart(&self, prompt: &str) -> Result<ChartSpec, ProviderError>;

    /// Generate an image. `Ok(None)` means the provider answered without one.
    async fn generate_image(&self, prompt: &str) -> Result<Option<GeneratedImage>, ProviderError>;
}

/// Build the provider selected by `config`.
pub fn build_provider(
    config: &ProviderConfig,
) -> Result<Arc<dyn GenerationProvider>, ProviderError> {
    match config.kind {
        ProviderKind::Gemini => Ok(Arc::new(gemini::GeminiProvider::new(config)?)),
        ProviderKind::Local => Ok(Arc::new(local::LocalProvider)),
    }
}
