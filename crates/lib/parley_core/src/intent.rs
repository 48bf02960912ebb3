//! Detection of follow-up visual content a message asks for.

use std::sync::LazyLock;

use regex::Regex;

const SEARCH_PHRASES: &[&str] = &[
    "search for",
    "find information",
    "look up",
    "research",
    "tell me about",
    "explain",
];
const QUESTION_WORDS: &[&str] = &["what", "how", "when", "where", "why"];
const IMAGE_PHRASES: &[&str] = &[
    "generate image",
    "create image",
    "draw",
    "picture of",
    "show me",
    "image of",
];
const CHART_WORDS: &[&str] = &[
    "chart",
    "graph",
    "visualization",
    "data",
    "statistics",
    "compare",
    "trend",
    "analysis",
];
const CHARTABLE_SEARCH_TOPICS: &[&str] = &["market", "growth", "economy", "population", "sales"];
const PICTURABLE_SEARCH_TOPICS: &[&str] = &[
    "city",
    "country",
    "animal",
    "plant",
    "building",
    "architecture",
    "landscape",
    "technology",
    "space",
    "ocean",
];
const INFO_PHRASES: &[&str] = &["what is", "how to", "explain", "tell me about"];

static IMAGE_TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)generate image|create image|draw|picture of|show me|image of")
        .expect("image trigger pattern is valid")
});

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// What kind of reply a message is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisualIntent {
    /// The message reads like a search or factual question.
    pub is_search: bool,
    /// The message explicitly asks for a picture.
    pub wants_image: bool,
    /// The message asks for, or would benefit from, a chart.
    pub wants_chart: bool,
    /// A search about a picturable subject that is not already charted.
    pub auto_image: bool,
}

impl VisualIntent {
    /// Inspect a user message.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();

        let is_search = contains_any(&lower, SEARCH_PHRASES)
            || (content.contains('?') && contains_any(&lower, QUESTION_WORDS));
        let wants_image = contains_any(&lower, IMAGE_PHRASES);
        let wants_chart = contains_any(&lower, CHART_WORDS)
            || (is_search && contains_any(&lower, CHARTABLE_SEARCH_TOPICS));
        let auto_image =
            is_search && !wants_chart && contains_any(&lower, PICTURABLE_SEARCH_TOPICS);

        Self {
            is_search,
            wants_image,
            wants_chart,
            auto_image,
        }
    }

    /// An image should be generated, whether asked for or implied.
    pub fn needs_image(&self) -> bool {
        self.wants_image || self.auto_image
    }

    pub fn has_visuals(&self) -> bool {
        self.wants_chart || self.needs_image()
    }
}

/// Whether the reply should use the structured, markdown-heavy prompt.
pub fn is_info_request(content: &str, intent: &VisualIntent) -> bool {
    intent.is_search || contains_any(&content.to_lowercase(), INFO_PHRASES)
}

/// Remove image trigger phrases, leaving the subject of the picture.
pub fn strip_image_triggers(content: &str) -> String {
    IMAGE_TRIGGER_RE.replace_all(content, "").trim().to_string()
}
