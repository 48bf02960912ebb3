//! Local provider: deterministic replies without any network access.
//!
//! Used for development and when no API key is configured. Text replies
//! echo the question, charts count word lengths, images are a small SVG
//! card carrying the prompt.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::{GeneratedImage, GenerationProvider, ProviderError, PromptPart};
use crate::models::{ChartKind, ChartPoint, ChartSpec};

/// Maximum number of data points in a local chart.
const MAX_POINTS: usize = 8;

/// Offline provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProvider;

/// Pull the user's question back out of a built prompt.
fn question_of(prompt: &str) -> &str {
    prompt
        .rsplit_once("User question: ")
        .map(|(_, q)| q)
        .unwrap_or(prompt)
        .trim()
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[async_trait]
impl GenerationProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate_text(&self, parts: Vec<PromptPart>) -> Result<String, ProviderError> {
        let mut question = None;
        let mut attachments = 0usize;
        for part in &parts {
            match part {
                PromptPart::Text(text) if question.is_none() => question = Some(question_of(text)),
                _ => attachments += 1,
            }
        }
        let question = question.unwrap_or_default();
        let mut reply = format!("## Local reply\n\nYou asked: **{question}**");
        if attachments > 0 {
            reply.push_str(&format!("\n\n{attachments} attachment(s) received."));
        }
        Ok(reply)
    }

    async fn generate_chart(&self, prompt: &str) -> Result<ChartSpec, ProviderError> {
        let data = prompt
            .split_whitespace()
            .filter(|w| w.chars().any(char::is_alphanumeric))
            .take(MAX_POINTS)
            .map(|w| ChartPoint {
                label: w.to_string(),
                value: w.chars().count() as f64,
                category: None,
            })
            .collect();
        Ok(ChartSpec {
            chart_type: ChartKind::Bar,
            title: "Word lengths".to_string(),
            data,
            description: "Generated offline by the local provider".to_string(),
        })
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<GeneratedImage>, ProviderError> {
        let label: String = prompt.chars().take(60).collect();
        let svg = format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="480" height="120"><rect width="100%" height="100%" fill="#0084FF"/><text x="16" y="64" fill="#ffffff" font-size="16">{}</text></svg>"##,
            escape_xml(&label)
        );
        Ok(Some(GeneratedImage {
            mime_type: "image/svg+xml".to_string(),
            data: STANDARD.encode(svg),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn text_reply_quotes_question() {
        let reply = LocalProvider
            .generate_text(vec![
                PromptPart::text("Be helpful.\n\nUser question: why is the sky blue?"),
                PromptPart::InlineData {
                    mime_type: "image/png".into(),
                    data: "AAAA".into(),
                },
            ])
            .await
            .unwrap();
        assert!(reply.contains("**why is the sky blue?**"));
        assert!(reply.contains("1 attachment(s)"));
    }

    #[tokio::test]
    async fn chart_is_capped() {
        let chart = LocalProvider
            .generate_chart("one two three four five six seven eight nine ten")
            .await
            .unwrap();
        assert_eq!(chart.data.len(), MAX_POINTS);
        assert_eq!(chart.data[2].value, 5.0);
    }

    #[tokio::test]
    async fn image_is_escaped_svg() {
        let image = LocalProvider
            .generate_image("<cats & dogs>")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(image.mime_type, "image/svg+xml");
        let svg = String::from_utf8(STANDARD.decode(image.data).unwrap()).unwrap();
        assert!(svg.contains("&lt;cats &amp; dogs&gt;"));
    }
}
