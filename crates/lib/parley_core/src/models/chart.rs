//! Chart payloads produced by chart generation.

use serde::{Deserialize, Serialize};

/// Rendering style of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
    Area,
    Scatter,
}

/// One labelled data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A complete chart, as stored behind the `CHART_DATA:` content prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(default)]
    pub chart_type: ChartKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub data: Vec<ChartPoint>,
    #[serde(default)]
    pub description: String,
}

impl ChartSpec {
    /// Placeholder chart stored when chart generation fails.
    pub fn fallback(content: &str) -> Self {
        let head: String = content.chars().take(50).collect();
        let point = |label: &str, value: f64| ChartPoint {
            label: label.to_string(),
            value,
            category: Some("data".to_string()),
        };
        Self {
            chart_type: ChartKind::Bar,
            title: format!("Data Overview: {head}"),
            data: vec![
                point("Item A", 35.0),
                point("Item B", 28.0),
                point("Item C", 42.0),
                point("Item D", 19.0),
                point("Item E", 31.0),
            ],
            description: "Sample data visualization".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_truncates_title_on_char_boundary() {
        let content = "é".repeat(80);
        let chart = ChartSpec::fallback(&content);
        assert_eq!(chart.title.chars().count(), "Data Overview: ".len() + 50);
        assert_eq!(chart.data.len(), 5);
        assert_eq!(chart.chart_type, ChartKind::Bar);
    }

    #[test]
    fn parses_provider_json_with_missing_fields() {
        let chart: ChartSpec = serde_json::from_str(
            r#"{"chartType":"pie","data":[{"label":"A","value":3}]}"#,
        )
        .unwrap();
        assert_eq!(chart.chart_type, ChartKind::Pie);
        assert_eq!(chart.data[0].value, 3.0);
        assert!(chart.title.is_empty());
    }
}
