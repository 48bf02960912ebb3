//! Keyword heuristics that label free text.
//!
//! Both classifiers lowercase the input and walk an ordered rule table;
//! the first rule with a matching keyword wins.

use crate::models::{Sentiment, Topic};

const SENTIMENT_RULES: &[(Sentiment, &[&str])] = &[
    (
        Sentiment::Frustrated,
        &["frustrated", "annoying", "stupid", "wrong", "terrible", "awful"],
    ),
    (
        Sentiment::Confused,
        &[
            "confused",
            "don't understand",
            "unclear",
            "what do you mean",
            "i don't get it",
            "explain",
        ],
    ),
    (
        Sentiment::Positive,
        &["thank", "great", "awesome", "perfect", "excellent", "love"],
    ),
    (
        Sentiment::Negative,
        &["bad", "hate", "dislike", "problem", "issue", "error"],
    ),
];

const TOPIC_RULES: &[(Topic, &[&str])] = &[
    (
        Topic::Technical,
        &[
            "code",
            "programming",
            "software",
            "algorithm",
            "database",
            "api",
            "compile",
            "function",
            "server",
            "rust",
            "python",
            "javascript",
        ],
    ),
    (
        Topic::Creative,
        &[
            "story", "poem", "write a", "creative", "imagine", "design", "draw", "art", "song",
            "idea",
        ],
    ),
    (
        Topic::Educational,
        &[
            "learn",
            "teach",
            "explain",
            "lesson",
            "tutorial",
            "what is",
            "how does",
            "understand",
        ],
    ),
    (
        Topic::Research,
        &[
            "research",
            "search for",
            "find information",
            "look up",
            "statistics",
            "data",
            "compare",
            "study",
        ],
    ),
    (
        Topic::ProblemSolving,
        &[
            "solve",
            "fix",
            "problem",
            "issue",
            "troubleshoot",
            "help me",
            "error",
            "broken",
        ],
    ),
];

fn first_match<L: Copy>(text: &str, rules: &[(L, &[&str])]) -> Option<L> {
    let lower = text.to_lowercase();
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(label, _)| *label)
}

/// Classify the emotional tone of a message.
pub fn analyze_sentiment(text: &str) -> Sentiment {
    first_match(text, SENTIMENT_RULES).unwrap_or(Sentiment::Neutral)
}

/// Classify the subject area of a message.
pub fn categorize_topic(text: &str) -> Topic {
    first_match(text, TOPIC_RULES).unwrap_or(Topic::General)
}
