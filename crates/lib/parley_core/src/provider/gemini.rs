//! Google Gemini provider.
//!
//! Calls `POST {base}/v1beta/models/{model}:generateContent` with the key in
//! the `x-goog-api-key` header. One attempt per call; failures are returned
//! to the caller unchanged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::config::ProviderConfig;
use super::{GeneratedImage, GenerationProvider, ProviderError, PromptPart};
use crate::models::ChartSpec;

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart<'a> {
    Text(&'a str),
    InlineData(InlineData<'a>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<ResponseInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseInlineData {
    mime_type: Option<String>,
    data: String,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|c| c.parts.iter())
    }

    /// Concatenation of every text part of the first candidate.
    fn text(&self) -> String {
        self.parts().filter_map(|p| p.text.as_deref()).collect()
    }

    fn first_image(&self) -> Option<GeneratedImage> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| !d.data.is_empty())
            .map(|d| GeneratedImage {
                mime_type: d
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "image/jpeg".to_string()),
                data: d.data.clone(),
            })
    }
}

/// JSON schema the chart response must follow.
fn chart_response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "chartType": {
                "type": "STRING",
                "enum": ["bar", "line", "pie", "area", "scatter"]
            },
            "title": { "type": "STRING" },
            "data": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": { "type": "STRING" },
                        "value": { "type": "NUMBER" },
                        "category": { "type": "STRING" }
                    }
                }
            },
            "description": { "type": "STRING" }
        }
    })
}

// =============================================================================
// Provider
// =============================================================================

/// Gemini REST client.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ProviderError::Config("GEMINI_API_KEY is required for gemini provider".to_string())
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    async fn generate(
        &self,
        model: &str,
        parts: Vec<RequestPart<'_>>,
        generation_config: Option<serde_json::Value>,
    ) -> Result<GenerateResponse, ProviderError> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);
        debug!(%model, parts = parts.len(), "gemini generateContent");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest {
                contents: [RequestContent {
                    role: "user",
                    parts,
                }],
                generation_config,
            })
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("Gemini request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ProviderError::Status { status, body });
        }

        resp.json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Gemini response parse error: {e}")))
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_text(&self, parts: Vec<PromptPart>) -> Result<String, ProviderError> {
        let request_parts = parts
            .iter()
            .map(|p| match p {
                PromptPart::Text(text) => RequestPart::Text(text),
                PromptPart::InlineData { mime_type, data } => {
                    RequestPart::InlineData(InlineData { mime_type, data })
                }
            })
            .collect();
        let response = self.generate(&self.text_model, request_parts, None).await?;
        Ok(response.text())
    }

    async fn generate_chart(&self, prompt: &str) -> Result<ChartSpec, ProviderError> {
        let config = json!({
            "responseMimeType": "application/json",
            "responseSchema": chart_response_schema(),
        });
        let response = self
            .generate(&self.text_model, vec![RequestPart::Text(prompt)], Some(config))
            .await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(ProviderError::NoContent(
                "Gemini returned no chart data".to_string(),
            ));
        }
        serde_json::from_str(&text)
            .map_err(|e| ProviderError::Parse(format!("Chart JSON parse error: {e}")))
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<GeneratedImage>, ProviderError> {
        let config = json!({ "responseModalities": ["TEXT", "IMAGE"] });
        let response = self
            .generate(&self.image_model, vec![RequestPart::Text(prompt)], Some(config))
            .await?;
        Ok(response.first_image())
    }
}
