//! Suggested follow-ups and tone adjustments for assistant replies.

use crate::models::Sentiment;

/// Maximum number of quick replies attached to a message.
pub const MAX_QUICK_REPLIES: usize = 4;

/// Suggest follow-up replies for the user.
///
/// Context rules come first (what the user asked, what the reply talks
/// about), then sentiment rules, then generic suggestions. Duplicates are
/// dropped and the list is cut to [`MAX_QUICK_REPLIES`].
pub fn quick_replies(user_message: &str, bot_reply: &str, sentiment: Sentiment) -> Vec<String> {
    let user = user_message.to_lowercase();
    let bot = bot_reply.to_lowercase();
    let mut candidates: Vec<&str> = Vec::new();

    if user.contains("explain") || user.contains("how") {
        candidates.extend(["Can you explain more?", "Give me an example", "What are the steps?"]);
    }
    if user.contains("compare") || user.contains("difference") {
        candidates.extend([
            "Show me a comparison",
            "What are the pros and cons?",
            "Which is better?",
        ]);
    }
    if user.contains("create") || user.contains("generate") {
        candidates.extend(["Make another one", "Try a different style", "Show me variations"]);
    }
    if bot.contains("image") || bot.contains("chart") {
        candidates.extend([
            "Show me another example",
            "Make it interactive",
            "Explain what I see",
        ]);
    }

    match sentiment {
        Sentiment::Confused => candidates.extend([
            "Break it down step by step",
            "Use simpler terms",
            "Give me an analogy",
        ]),
        Sentiment::Frustrated => candidates.extend([
            "Let's try a different approach",
            "Show me alternatives",
            "Contact support",
        ]),
        Sentiment::Positive => candidates.extend([
            "Tell me more",
            "What else can you do?",
            "Show me related topics",
        ]),
        Sentiment::Negative | Sentiment::Neutral => {}
    }

    candidates.extend(["That's helpful!", "Can you elaborate?", "What's next?"]);

    let mut replies: Vec<String> = Vec::with_capacity(MAX_QUICK_REPLIES);
    for candidate in candidates {
        if replies.len() == MAX_QUICK_REPLIES {
            break;
        }
        if !replies.iter().any(|r| r == candidate) {
            replies.push(candidate.to_string());
        }
    }
    replies
}

/// Opening line that acknowledges the user's tone, if any.
pub fn empathy_prefix(sentiment: Sentiment) -> Option<&'static str> {
    match sentiment {
        Sentiment::Frustrated => {
            Some("I understand this might be frustrating. Let me help you with that. 😊")
        }
        Sentiment::Confused => {
            Some("I can see this might be confusing. Let me break it down for you. 🤔")
        }
        Sentiment::Positive => Some("Great question! I'm happy to help. ✨"),
        Sentiment::Negative | Sentiment::Neutral => None,
    }
}
