//! Prompt construction.

use crate::intent::strip_image_triggers;

const EXPERT_PREAMBLE: &str = "You are an expert AI assistant. For this query, provide a comprehensive, well-formatted response using proper markdown:

## Format Guidelines:
- Use ## for main headings
- Use ### for sub-headings
- Use **bold** for key terms and important concepts
- Use bullet points (•) for lists
- Use numbered lists (1. 2. 3.) for steps/processes
- Use > for important quotes or highlights
- Organize information in clear sections
- Include specific facts, numbers, and examples
- Make responses scannable and easy to read";

const HELPFUL_PREAMBLE: &str = "You are a helpful AI assistant. Provide clear, accurate, and engaging responses with proper formatting when appropriate.";

/// Which prompt template fits the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Files were attached; ask the model to analyse them.
    Attachments,
    /// Factual or search-like question; ask for structured markdown.
    Expert,
    /// Everything else.
    Conversational,
}

/// Build the text prompt for the primary reply.
pub fn text_prompt(message: &str, style: PromptStyle) -> String {
    match style {
        PromptStyle::Attachments => {
            format!("Analyze the uploaded files and answer this question: \"{message}\"")
        }
        PromptStyle::Expert => format!("{EXPERT_PREAMBLE}\n\nUser question: {message}"),
        PromptStyle::Conversational => format!("{HELPFUL_PREAMBLE}\n\nUser question: {message}"),
    }
}

/// Build the chart-data request for a message.
pub fn chart_prompt(content: &str) -> String {
    format!(
        "Create chart data for: \"{content}\". Return JSON with chartType (bar/line/pie), title, data array with label/value pairs, and description. 6-8 data points max."
    )
}

/// Build the image request for a message.
///
/// Explicit requests keep only the subject; implied ones ask for an
/// illustration of the start of the message.
pub fn image_prompt(content: &str, explicit: bool) -> String {
    let subject = if explicit {
        strip_image_triggers(content)
    } else {
        let head: String = content.chars().take(100).collect();
        format!("Professional illustration: {head}")
    };
    let subject = if subject.is_empty() { content } else { subject.as_str() };
    format!("Create a detailed image: {subject}")
}
