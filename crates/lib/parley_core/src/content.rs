//! Chart and image payloads embedded in message content.
//!
//! Charts are stored as `CHART_DATA:` followed by the chart JSON; images as
//! a markdown image whose target is a base64 `data:` URL.

use crate::models::ChartSpec;

/// Prefix marking a serialized chart.
pub const CHART_PREFIX: &str = "CHART_DATA:";

const IMAGE_PREFIX: &str = "![Generated Image](data:";

/// Serialize a chart into message content.
pub fn encode_chart(chart: &ChartSpec) -> Result<String, serde_json::Error> {
    Ok(format!("{CHART_PREFIX}{}", serde_json::to_string(chart)?))
}

/// Parse a chart out of message content, if it holds one.
pub fn decode_chart(content: &str) -> Option<ChartSpec> {
    let json = content.strip_prefix(CHART_PREFIX)?;
    serde_json::from_str(json).ok()
}

/// Embed base64-encoded image data as a markdown data-URL image.
pub fn encode_image(mime_type: &str, data: &str) -> String {
    format!("{IMAGE_PREFIX}{mime_type};base64,{data})")
}

/// Whether message content holds an embedded image.
pub fn is_image(content: &str) -> bool {
    content.starts_with(IMAGE_PREFIX)
}
