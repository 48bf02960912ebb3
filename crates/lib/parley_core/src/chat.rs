//! Chat orchestration.
//!
//! [`ChatService::send_message`] handles one inbound user message: it
//! stores the message with its sentiment, asks the provider for a reply,
//! stores the reply and queues any chart or image follow-ups.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::classify::{analyze_sentiment, categorize_topic};
use crate::intent::{VisualIntent, is_info_request};
use crate::jobs::{Job, JobKind, JobQueue, JobSpec};
use crate::models::{Message, MessageMetadata, NewMessage, Sentiment};
use crate::prompt::{PromptStyle, text_prompt};
use crate::provider::{GenerationProvider, PromptPart};
use crate::replies::{empathy_prefix, quick_replies};
use crate::storage::{Storage, StorageError};

/// Reply stored when the provider call fails.
pub const APOLOGY: &str =
    "I apologize, but I'm experiencing technical difficulties right now. Please try again later.";

/// Reply stored when the provider answers with nothing.
pub const EMPTY_REPLY: &str =
    "I'm here to help! Could you please rephrase your question or provide more details?";

/// Message text used when only files were sent.
pub const FILES_ONLY_TEXT: &str = "Analyze these files:";

pub const CHART_NOTICE: &str = "📊 Creating data visualization...";
pub const IMAGE_NOTICE: &str = "🎨 Generating relevant image...";

pub const MAX_ATTACHMENTS: usize = 5;
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "text/plain",
    "application/pdf",
];

/// Chat errors.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A file sent along with a message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// How the attachment is shown in the stored user message.
    fn listing(&self) -> String {
        format!("📎 {} ({})", self.file_name, self.mime_type)
    }

    /// Prompt part for the provider, if the type is one it can read.
    fn prompt_part(&self) -> Option<PromptPart> {
        if self.is_image() {
            Some(PromptPart::InlineData {
                mime_type: self.mime_type.clone(),
                data: STANDARD.encode(&self.data),
            })
        } else if self.mime_type == "text/plain" {
            Some(PromptPart::Text(format!(
                "File content of {}:\n{}",
                self.file_name,
                String::from_utf8_lossy(&self.data)
            )))
        } else {
            None
        }
    }
}

/// An inbound user message.
#[derive(Debug, Clone, Default)]
pub struct SendMessage {
    pub content: String,
    pub attachments: Vec<Attachment>,
}

impl SendMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), ChatError> {
        if self.content.trim().is_empty() && self.attachments.is_empty() {
            return Err(ChatError::Validation(
                "Message content or files are required".into(),
            ));
        }
        if self.attachments.len() > MAX_ATTACHMENTS {
            return Err(ChatError::Validation(format!(
                "At most {MAX_ATTACHMENTS} files may be attached"
            )));
        }
        for file in &self.attachments {
            if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
                return Err(ChatError::Validation(format!(
                    "Unsupported file type: {}",
                    file.mime_type
                )));
            }
            if file.data.len() > MAX_ATTACHMENT_BYTES {
                return Err(ChatError::Validation(format!(
                    "File too large: {}",
                    file.file_name
                )));
            }
        }
        Ok(())
    }

    /// Text stored as the user message: the content (or a stand-in when
    /// only files were sent) followed by one line per attachment.
    fn compose(&self) -> String {
        let mut text = if self.content.trim().is_empty() {
            FILES_ONLY_TEXT.to_string()
        } else {
            self.content.clone()
        };
        if !self.attachments.is_empty() {
            let listing: Vec<String> = self.attachments.iter().map(Attachment::listing).collect();
            text.push_str("\n\n");
            text.push_str(&listing.join("\n"));
        }
        text
    }
}

/// Result of [`ChatService::send_message`].
#[derive(Debug, Clone)]
pub struct ChatExchange {
    pub user_message: Message,
    pub bot_message: Message,
    /// Follow-up jobs queued for this message.
    pub jobs: Vec<Job>,
}

/// Request orchestrator shared by all handlers.
pub struct ChatService {
    storage: Arc<dyn Storage>,
    provider: Arc<dyn GenerationProvider>,
    jobs: JobQueue,
}

impl ChatService {
    pub fn new(
        storage: Arc<dyn Storage>,
        provider: Arc<dyn GenerationProvider>,
        jobs: JobQueue,
    ) -> Self {
        Self {
            storage,
            provider,
            jobs,
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn jobs(&self) -> &JobQueue {
        &self.jobs
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Delete a conversation, its messages and its follow-up jobs.
    ///
    /// Returns `false` if the conversation did not exist.
    pub async fn delete_conversation(&self, conversation_id: Uuid) -> Result<bool, ChatError> {
        if !self.storage.delete_conversation(conversation_id).await? {
            return Ok(false);
        }
        let jobs = self.jobs.forget_conversation(conversation_id);
        info!(%conversation_id, jobs, "conversation deleted");
        Ok(true)
    }

    /// Store a user message, generate and store the assistant reply.
    ///
    /// Provider failures do not fail the call: the fixed [`APOLOGY`] is
    /// stored as the reply and no follow-up jobs are queued.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        request: SendMessage,
    ) -> Result<ChatExchange, ChatError> {
        request.validate()?;
        if self
            .storage
            .get_conversation(conversation_id)
            .await?
            .is_none()
        {
            return Err(ChatError::ConversationNotFound(conversation_id));
        }

        let message_text = request.compose();
        let sentiment = analyze_sentiment(&message_text);
        let user_message = self
            .storage
            .create_message(
                NewMessage::user(conversation_id, message_text.clone()).with_sentiment(sentiment),
            )
            .await?;

        let intent = VisualIntent::detect(&request.content);
        let topic = categorize_topic(&message_text);
        let style = if !request.attachments.is_empty() {
            PromptStyle::Attachments
        } else if is_info_request(&message_text, &intent) {
            PromptStyle::Expert
        } else {
            PromptStyle::Conversational
        };
        debug!(%conversation_id, %sentiment, %topic, ?intent, ?style, "classified message");

        let mut parts = vec![PromptPart::Text(text_prompt(&message_text, style))];
        parts.extend(request.attachments.iter().filter_map(Attachment::prompt_part));

        let reply = match self.provider.generate_text(parts).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(%conversation_id, provider = self.provider.name(), error = %e, "reply generation failed");
                let bot_message = self
                    .storage
                    .create_message(NewMessage::assistant(conversation_id, APOLOGY))
                    .await?;
                return Ok(ChatExchange {
                    user_message,
                    bot_message,
                    jobs: Vec::new(),
                });
            }
        };

        let reply = if reply.trim().is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            reply
        };
        let suggestions = quick_replies(&request.content, &reply, sentiment);
        let body = decorate_reply(&reply, sentiment, &intent);

        let bot_message = self
            .storage
            .create_message(
                NewMessage::assistant(conversation_id, body)
                    .with_sentiment(Sentiment::Neutral)
                    .with_quick_replies(suggestions)
                    .with_metadata(MessageMetadata {
                        has_visuals: intent.has_visuals(),
                        is_search_response: intent.is_search,
                        user_sentiment: sentiment,
                        topic,
                    }),
            )
            .await?;

        let jobs = self.queue_visuals(conversation_id, &request.content, &intent);
        info!(
            %conversation_id,
            user_message_id = %user_message.id,
            bot_message_id = %bot_message.id,
            jobs = jobs.len(),
            "message answered"
        );

        Ok(ChatExchange {
            user_message,
            bot_message,
            jobs,
        })
    }

    fn queue_visuals(&self, conversation_id: Uuid, content: &str, intent: &VisualIntent) -> Vec<Job> {
        let mut jobs = Vec::new();
        if intent.wants_chart {
            jobs.push(self.jobs.enqueue(JobSpec {
                conversation_id,
                kind: JobKind::Chart,
                content: content.to_string(),
                explicit: true,
            }));
        }
        if intent.needs_image() {
            jobs.push(self.jobs.enqueue(JobSpec {
                conversation_id,
                kind: JobKind::Image,
                content: content.to_string(),
                explicit: intent.wants_image,
            }));
        }
        jobs
    }
}

/// Wrap a raw reply with the empathy line and pending-visual notices.
fn decorate_reply(reply: &str, sentiment: Sentiment, intent: &VisualIntent) -> String {
    let mut body = match empathy_prefix(sentiment) {
        Some(prefix) => format!("{prefix}\n\n{reply}"),
        None => reply.to_string(),
    };
    if intent.wants_chart {
        body.push_str("\n\n");
        body.push_str(CHART_NOTICE);
    }
    if intent.needs_image() {
        body.push_str("\n\n");
        body.push_str(IMAGE_NOTICE);
    }
    body
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::jobs::JobStatus;
    use crate::models::{ChartSpec, MessageType, NewConversation, Role};
    use crate::provider::local::LocalProvider;
    use crate::provider::{GeneratedImage, ProviderError};
    use crate::storage::MemStorage;

    /// Provider returning a fixed reply and recording the prompts it saw.
    struct ScriptedProvider {
        reply: Result<String, String>,
        seen: Mutex<Vec<Vec<PromptPart>>>,
    }

    impl ScriptedProvider {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("quota exceeded".to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerationProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate_text(&self, parts: Vec<PromptPart>) -> Result<String, ProviderError> {
            self.seen.lock().unwrap().push(parts);
            self.reply.clone().map_err(ProviderError::Request)
        }

        async fn generate_chart(&self, prompt: &str) -> Result<ChartSpec, ProviderError> {
            LocalProvider.generate_chart(prompt).await
        }

        async fn generate_image(
            &self,
            prompt: &str,
        ) -> Result<Option<GeneratedImage>, ProviderError> {
            LocalProvider.generate_image(prompt).await
        }
    }

    struct Harness {
        service: ChatService,
        provider: Arc<ScriptedProvider>,
        conversation_id: Uuid,
        _shutdown: CancellationToken,
    }

    async fn harness(provider: ScriptedProvider) -> Harness {
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        let provider = Arc::new(provider);
        let shutdown = CancellationToken::new();
        let jobs = JobQueue::start(storage.clone(), provider.clone(), shutdown.clone());
        let conversation = storage
            .create_conversation(NewConversation::titled("chat"))
            .await
            .unwrap();
        Harness {
            service: ChatService::new(storage, provider.clone(), jobs),
            provider,
            conversation_id: conversation.id,
            _shutdown: shutdown,
        }
    }

    #[tokio::test]
    async fn reply_references_conversation() {
        let h = harness(ScriptedProvider::ok("Hi!")).await;
        let exchange = h
            .service
            .send_message(h.conversation_id, SendMessage::text("hello"))
            .await
            .unwrap();

        assert_eq!(exchange.user_message.conversation_id, Some(h.conversation_id));
        assert_eq!(exchange.bot_message.conversation_id, Some(h.conversation_id));
        assert_eq!(exchange.user_message.role, Role::User);
        assert_eq!(exchange.bot_message.role, Role::Assistant);
        assert_eq!(exchange.bot_message.content, "Hi!");
        assert_eq!(exchange.user_message.sentiment, Some(Sentiment::Neutral));
        assert!(exchange.jobs.is_empty());
        assert_eq!(
            exchange.bot_message.quick_replies.as_deref(),
            Some(&["That's helpful!".to_string(), "Can you elaborate?".to_string(), "What's next?".to_string()][..])
        );
    }

    #[tokio::test]
    async fn provider_failure_stores_apology() {
        let h = harness(ScriptedProvider::failing()).await;
        let exchange = h
            .service
            .send_message(h.conversation_id, SendMessage::text("draw a chart of sales"))
            .await
            .unwrap();

        assert_eq!(exchange.bot_message.content, APOLOGY);
        assert!(exchange.jobs.is_empty());
        let stored = h.service.storage().list_messages(h.conversation_id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].content, APOLOGY);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let h = harness(ScriptedProvider::ok("unused")).await;
        let err = h
            .service
            .send_message(h.conversation_id, SendMessage::text("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
        assert!(h.provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let h = harness(ScriptedProvider::ok("unused")).await;
        let missing = Uuid::now_v7();
        let err = h
            .service
            .send_message(missing, SendMessage::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ConversationNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn frustrated_user_gets_empathy_and_metadata() {
        let h = harness(ScriptedProvider::ok("Let's fix it.")).await;
        let exchange = h
            .service
            .send_message(h.conversation_id, SendMessage::text("this is wrong, thank you"))
            .await
            .unwrap();

        assert_eq!(exchange.user_message.sentiment, Some(Sentiment::Frustrated));
        assert!(exchange.bot_message.content.starts_with("I understand this might be frustrating."));
        assert!(exchange.bot_message.content.ends_with("Let's fix it."));
        let meta = exchange.bot_message.metadata.unwrap();
        assert_eq!(meta.user_sentiment, Sentiment::Frustrated);
        assert!(!meta.has_visuals);
    }

    #[tokio::test]
    async fn empty_reply_is_replaced() {
        let h = harness(ScriptedProvider::ok("  ")).await;
        let exchange = h
            .service
            .send_message(h.conversation_id, SendMessage::text("hello"))
            .await
            .unwrap();
        assert_eq!(exchange.bot_message.content, EMPTY_REPLY);
    }

    #[tokio::test]
    async fn visual_requests_queue_jobs_and_append_messages() {
        let h = harness(ScriptedProvider::ok("Here is an overview.")).await;
        let exchange = h
            .service
            .send_message(h.conversation_id, SendMessage::text("Show me a chart of sales"))
            .await
            .unwrap();

        assert!(exchange.bot_message.content.contains(CHART_NOTICE));
        assert!(exchange.bot_message.content.contains(IMAGE_NOTICE));
        let kinds: Vec<JobKind> = exchange.jobs.iter().map(|j| j.kind).collect();
        assert_eq!(kinds, vec![JobKind::Chart, JobKind::Image]);

        for job in &exchange.jobs {
            let done = tokio::time::timeout(Duration::from_secs(5), h.service.jobs().wait(job.id))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(done.status, JobStatus::Completed);
        }

        let stored = h.service.storage().list_messages(h.conversation_id).await.unwrap();
        assert_eq!(stored.len(), 4);
        let types: Vec<MessageType> = stored[2..].iter().map(|m| m.message_type).collect();
        assert!(types.contains(&MessageType::Chart));
        assert!(types.contains(&MessageType::Image));
    }

    #[tokio::test]
    async fn attachments_shape_prompt_and_stored_text() {
        let h = harness(ScriptedProvider::ok("Looks like a cat.")).await;
        let request = SendMessage {
            content: String::new(),
            attachments: vec![
                Attachment {
                    file_name: "cat.png".into(),
                    mime_type: "image/png".into(),
                    data: vec![1, 2, 3],
                },
                Attachment {
                    file_name: "notes.txt".into(),
                    mime_type: "text/plain".into(),
                    data: b"whiskers".to_vec(),
                },
                Attachment {
                    file_name: "paper.pdf".into(),
                    mime_type: "application/pdf".into(),
                    data: vec![0],
                },
            ],
        };
        let exchange = h
            .service
            .send_message(h.conversation_id, request)
            .await
            .unwrap();

        assert_eq!(
            exchange.user_message.content,
            "Analyze these files:\n\n📎 cat.png (image/png)\n📎 notes.txt (text/plain)\n📎 paper.pdf (application/pdf)"
        );

        let seen = h.provider.seen.lock().unwrap();
        let parts = &seen[0];
        assert_eq!(parts.len(), 3);
        match &parts[0] {
            PromptPart::Text(text) => {
                assert!(text.starts_with("Analyze the uploaded files and answer this question:"))
            }
            other => panic!("unexpected first part: {other:?}"),
        }
        assert_eq!(
            parts[1],
            PromptPart::InlineData {
                mime_type: "image/png".into(),
                data: "AQID".into(),
            }
        );
        assert_eq!(parts[2], PromptPart::text("File content of notes.txt:\nwhiskers"));
    }

    #[tokio::test]
    async fn disallowed_attachment_type_is_rejected() {
        let h = harness(ScriptedProvider::ok("unused")).await;
        let request = SendMessage {
            content: "run this".into(),
            attachments: vec![Attachment {
                file_name: "tool.exe".into(),
                mime_type: "application/octet-stream".into(),
                data: vec![0],
            }],
        };
        let err = h
            .service
            .send_message(h.conversation_id, request)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[test]
    fn too_many_attachments_fail_validation() {
        let file = Attachment {
            file_name: "a.txt".into(),
            mime_type: "text/plain".into(),
            data: Vec::new(),
        };
        let request = SendMessage {
            content: "hi".into(),
            attachments: vec![file; MAX_ATTACHMENTS + 1],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn attachment_size_limit_is_inclusive() {
        let sized = |len: usize| SendMessage {
            content: "read this".into(),
            attachments: vec![Attachment {
                file_name: "big.txt".into(),
                mime_type: "text/plain".into(),
                data: vec![0; len],
            }],
        };
        assert!(sized(MAX_ATTACHMENT_BYTES).validate().is_ok());
        let err = sized(MAX_ATTACHMENT_BYTES + 1).validate().unwrap_err();
        assert!(matches!(err, ChatError::Validation(m) if m.contains("big.txt")));
    }

    #[tokio::test]
    async fn delete_conversation_forgets_jobs() {
        let h = harness(ScriptedProvider::ok("Here you go.")).await;
        let exchange = h
            .service
            .send_message(h.conversation_id, SendMessage::text("Plot a chart of sales"))
            .await
            .unwrap();
        assert_eq!(exchange.jobs.len(), 1);

        assert!(h.service.delete_conversation(h.conversation_id).await.unwrap());
        assert!(h.service.jobs().list_for_conversation(h.conversation_id).is_empty());
        assert!(
            h.service
                .storage()
                .list_messages(h.conversation_id)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(!h.service.delete_conversation(h.conversation_id).await.unwrap());
    }

    #[test]
    fn decorate_orders_prefix_reply_and_notices() {
        let intent = VisualIntent {
            wants_chart: true,
            wants_image: true,
            ..VisualIntent::default()
        };
        let body = decorate_reply("Body", Sentiment::Positive, &intent);
        assert_eq!(
            body,
            format!("Great question! I'm happy to help. ✨\n\nBody\n\n{CHART_NOTICE}\n\n{IMAGE_NOTICE}")
        );
    }
}
