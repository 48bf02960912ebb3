//! Follow-up generation jobs.
//!
//! Chart and image generation run after the primary reply has been returned.
//! The chat orchestrator enqueues a job over a channel; a worker task picks
//! it up, calls the provider and appends the result to the conversation.
//! Every job is tracked from `queued` to `completed` or `failed`, and each
//! state change is broadcast so callers can poll or subscribe.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::content;
use crate::models::{ChartSpec, MessageType, NewMessage};
use crate::prompt;
use crate::provider::{GenerationProvider, ProviderError};
use crate::storage::Storage;

/// Capacity of the job update broadcast channel.
const EVENT_CAPACITY: usize = 256;

/// Finished jobs kept for polling; older ones are dropped first.
pub const MAX_FINISHED_JOBS: usize = 1024;

/// What a job generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Chart,
    Image,
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Snapshot of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Message appended on completion.
    pub message_id: Option<Uuid>,
    /// Failure reason.
    pub error: Option<String>,
    /// Completed with the placeholder chart after the provider failed.
    pub fallback: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What to generate, and for which conversation.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub conversation_id: Uuid,
    pub kind: JobKind,
    /// The user message that triggered the job.
    pub content: String,
    /// For images: the user asked for a picture rather than it being implied.
    pub explicit: bool,
}

struct JobRequest {
    id: Uuid,
    spec: JobSpec,
}

/// Job table plus the update broadcast, shared by queue handles and worker.
struct JobBoard {
    jobs: DashMap<Uuid, Job>,
    events: broadcast::Sender<Job>,
    finished_limit: usize,
}

impl JobBoard {
    fn update(&self, id: Uuid, apply: impl FnOnce(&mut Job)) -> Option<Job> {
        let snapshot = {
            let mut job = self.jobs.get_mut(&id)?;
            apply(&mut *job);
            job.updated_at = Utc::now();
            job.clone()
        };
        // No subscribers is fine.
        let _ = self.events.send(snapshot.clone());
        if snapshot.status.is_terminal() {
            self.prune();
        }
        Some(snapshot)
    }

    /// Drop the oldest finished jobs beyond `finished_limit`.
    fn prune(&self) {
        let mut finished: Vec<(DateTime<Utc>, Uuid)> = self
            .jobs
            .iter()
            .filter(|j| j.status.is_terminal())
            .map(|j| (j.updated_at, j.id))
            .collect();
        if finished.len() <= self.finished_limit {
            return;
        }
        finished.sort();
        let excess = finished.len() - self.finished_limit;
        for (_, id) in finished.into_iter().take(excess) {
            self.jobs.remove(&id);
        }
        debug!(dropped = excess, "pruned finished jobs");
    }

    fn complete(&self, id: Uuid, message_id: Uuid, fallback: bool) {
        self.update(id, |job| {
            job.status = JobStatus::Completed;
            job.message_id = Some(message_id);
            job.fallback = fallback;
        });
    }

    fn fail(&self, id: Uuid, error: String) {
        warn!(job_id = %id, %error, "generation job failed");
        self.update(id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(error);
        });
    }
}

/// Handle for enqueueing and observing jobs. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<JobRequest>,
    board: Arc<JobBoard>,
}

impl JobQueue {
    /// Spawn the worker and return a handle to it.
    ///
    /// The worker stops when `shutdown` is cancelled; jobs still queued at
    /// that point stay `queued`.
    pub fn start(
        storage: Arc<dyn Storage>,
        provider: Arc<dyn GenerationProvider>,
        shutdown: CancellationToken,
    ) -> Self {
        Self::spawn(storage, provider, shutdown, MAX_FINISHED_JOBS)
    }

    fn spawn(
        storage: Arc<dyn Storage>,
        provider: Arc<dyn GenerationProvider>,
        shutdown: CancellationToken,
        finished_limit: usize,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let board = Arc::new(JobBoard {
            jobs: DashMap::new(),
            events,
            finished_limit,
        });

        let worker = Worker {
            storage,
            provider,
            board: Arc::clone(&board),
        };
        tokio::spawn(worker.run(rx, shutdown));

        Self { tx, board }
    }

    /// Record a new job and hand it to the worker.
    pub fn enqueue(&self, spec: JobSpec) -> Job {
        let now = Utc::now();
        let job = Job {
            id: Uuid::now_v7(),
            conversation_id: spec.conversation_id,
            kind: spec.kind,
            status: JobStatus::Queued,
            message_id: None,
            error: None,
            fallback: false,
            created_at: now,
            updated_at: now,
        };
        self.board.jobs.insert(job.id, job.clone());
        let _ = self.board.events.send(job.clone());
        debug!(job_id = %job.id, kind = ?job.kind, conversation_id = %job.conversation_id, "job queued");

        if self.tx.send(JobRequest { id: job.id, spec }).is_err() {
            self.board.fail(job.id, "job worker is not running".to_string());
            return self.get(job.id).unwrap_or(job);
        }
        job
    }

    pub fn get(&self, id: Uuid) -> Option<Job> {
        self.board.jobs.get(&id).map(|j| j.clone())
    }

    /// Jobs of a conversation, oldest first.
    pub fn list_for_conversation(&self, conversation_id: Uuid) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .board
            .jobs
            .iter()
            .filter(|j| j.conversation_id == conversation_id)
            .map(|j| j.clone())
            .collect();
        jobs.sort_by_key(|j| (j.created_at, j.id));
        jobs
    }

    /// Drop every job of a conversation. Returns how many were removed.
    ///
    /// A job already running keeps going, but its later updates are not
    /// recorded.
    pub fn forget_conversation(&self, conversation_id: Uuid) -> usize {
        let before = self.board.jobs.len();
        self.board
            .jobs
            .retain(|_, j| j.conversation_id != conversation_id);
        before.saturating_sub(self.board.jobs.len())
    }

    /// Receive every job update from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Job> {
        self.board.events.subscribe()
    }

    /// Wait until a job reaches a terminal state.
    ///
    /// Returns `None` for unknown ids; returns the last known state if the
    /// update stream closes first.
    pub async fn wait(&self, id: Uuid) -> Option<Job> {
        let mut updates = self.subscribe();
        let current = self.get(id)?;
        if current.status.is_terminal() {
            return Some(current);
        }
        loop {
            match updates.recv().await {
                Ok(job) if job.id == id && job.status.is_terminal() => return Some(job),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    let current = self.get(id)?;
                    if current.status.is_terminal() {
                        return Some(current);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return self.get(id),
            }
        }
    }
}

struct Worker {
    storage: Arc<dyn Storage>,
    provider: Arc<dyn GenerationProvider>,
    board: Arc<JobBoard>,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<JobRequest>, shutdown: CancellationToken) {
        let worker = Arc::new(self);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("job worker shutting down");
                    break;
                }
                request = rx.recv() => match request {
                    Some(request) => {
                        let worker = Arc::clone(&worker);
                        tokio::spawn(async move { worker.process(request).await });
                    }
                    None => break,
                },
            }
        }
    }

    async fn process(&self, request: JobRequest) {
        let JobRequest { id, spec } = request;
        self.board
            .update(id, |job| job.status = JobStatus::Running);

        match self.storage.get_conversation(spec.conversation_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                self.board.fail(id, "conversation no longer exists".to_string());
                return;
            }
            Err(e) => {
                self.board.fail(id, e.to_string());
                return;
            }
        }

        let outcome = match spec.kind {
            JobKind::Chart => self.chart(&spec).await,
            JobKind::Image => self.image(&spec).await,
        };
        match outcome {
            Ok((message_id, fallback)) => {
                debug!(job_id = %id, %message_id, fallback, "job completed");
                self.board.complete(id, message_id, fallback);
            }
            Err(error) => self.board.fail(id, error),
        }
    }

    /// Generate a chart; the placeholder chart stands in for provider failures.
    ///
    /// An empty provider answer fails the job without storing anything.
    async fn chart(&self, spec: &JobSpec) -> Result<(Uuid, bool), String> {
        let (chart, fallback) = match self
            .provider
            .generate_chart(&prompt::chart_prompt(&spec.content))
            .await
        {
            Ok(chart) => (chart, false),
            Err(ProviderError::NoContent(reason)) => return Err(reason),
            Err(e) => {
                warn!(error = %e, "chart generation failed, storing placeholder");
                (ChartSpec::fallback(&spec.content), true)
            }
        };
        let body = content::encode_chart(&chart).map_err(|e| e.to_string())?;
        let message = self
            .storage
            .create_message(
                NewMessage::assistant(spec.conversation_id, body).with_type(MessageType::Chart),
            )
            .await
            .map_err(|e| e.to_string())?;
        Ok((message.id, fallback))
    }

    async fn image(&self, spec: &JobSpec) -> Result<(Uuid, bool), String> {
        let image = self
            .provider
            .generate_image(&prompt::image_prompt(&spec.content, spec.explicit))
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "provider returned no image".to_string())?;
        let body = content::encode_image(&image.mime_type, &image.data);
        let message = self
            .storage
            .create_message(
                NewMessage::assistant(spec.conversation_id, body).with_type(MessageType::Image),
            )
            .await
            .map_err(|e| e.to_string())?;
        Ok((message.id, false))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::models::{ChartSpec, NewConversation};
    use crate::provider::local::LocalProvider;
    use crate::provider::{GeneratedImage, PromptPart};
    use crate::storage::MemStorage;

    /// Provider whose chart and image calls always fail.
    struct BrokenProvider;

    #[async_trait]
    impl GenerationProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        async fn generate_text(&self, _parts: Vec<PromptPart>) -> Result<String, ProviderError> {
            Err(ProviderError::Request("down".into()))
        }

        async fn generate_chart(&self, _prompt: &str) -> Result<ChartSpec, ProviderError> {
            Err(ProviderError::Request("down".into()))
        }

        async fn generate_image(
            &self,
            _prompt: &str,
        ) -> Result<Option<GeneratedImage>, ProviderError> {
            Err(ProviderError::Request("down".into()))
        }
    }

    /// Provider that answers image requests without an image.
    struct TextOnlyProvider;

    #[async_trait]
    impl GenerationProvider for TextOnlyProvider {
        fn name(&self) -> &str {
            "text-only"
        }

        async fn generate_text(&self, _parts: Vec<PromptPart>) -> Result<String, ProviderError> {
            Ok("ok".into())
        }

        async fn generate_chart(&self, prompt: &str) -> Result<ChartSpec, ProviderError> {
            LocalProvider.generate_chart(prompt).await
        }

        async fn generate_image(
            &self,
            _prompt: &str,
        ) -> Result<Option<GeneratedImage>, ProviderError> {
            Ok(None)
        }
    }

    /// Provider that answers chart requests with nothing.
    struct EmptyChartProvider;

    #[async_trait]
    impl GenerationProvider for EmptyChartProvider {
        fn name(&self) -> &str {
            "empty-chart"
        }

        async fn generate_text(&self, _parts: Vec<PromptPart>) -> Result<String, ProviderError> {
            Ok("ok".into())
        }

        async fn generate_chart(&self, _prompt: &str) -> Result<ChartSpec, ProviderError> {
            Err(ProviderError::NoContent("no chart data".into()))
        }

        async fn generate_image(
            &self,
            _prompt: &str,
        ) -> Result<Option<GeneratedImage>, ProviderError> {
            Ok(None)
        }
    }

    async fn setup(
        provider: Arc<dyn GenerationProvider>,
    ) -> (Arc<MemStorage>, JobQueue, Uuid, CancellationToken) {
        let storage = Arc::new(MemStorage::new());
        let conv = storage
            .create_conversation(NewConversation::titled("jobs"))
            .await
            .unwrap();
        let shutdown = CancellationToken::new();
        let queue = JobQueue::start(storage.clone(), provider, shutdown.clone());
        (storage, queue, conv.id, shutdown)
    }

    fn spec(conversation_id: Uuid, kind: JobKind) -> JobSpec {
        JobSpec {
            conversation_id,
            kind,
            content: "show me sales data".into(),
            explicit: true,
        }
    }

    async fn wait(queue: &JobQueue, id: Uuid) -> Job {
        tokio::time::timeout(Duration::from_secs(5), queue.wait(id))
            .await
            .expect("job finished in time")
            .expect("job exists")
    }

    #[tokio::test]
    async fn chart_job_appends_chart_message() {
        let (storage, queue, conv, _shutdown) = setup(Arc::new(LocalProvider)).await;
        let job = queue.enqueue(spec(conv, JobKind::Chart));
        assert_eq!(job.status, JobStatus::Queued);

        let done = wait(&queue, job.id).await;
        assert_eq!(done.status, JobStatus::Completed);
        assert!(!done.fallback);

        let messages = storage.list_messages(conv).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(Some(messages[0].id), done.message_id);
        assert_eq!(messages[0].message_type, MessageType::Chart);
        assert!(content::decode_chart(&messages[0].content).is_some());
    }

    #[tokio::test]
    async fn failed_chart_stores_placeholder() {
        let (storage, queue, conv, _shutdown) = setup(Arc::new(BrokenProvider)).await;
        let job = queue.enqueue(spec(conv, JobKind::Chart));

        let done = wait(&queue, job.id).await;
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.fallback);

        let messages = storage.list_messages(conv).await.unwrap();
        let chart = content::decode_chart(&messages[0].content).unwrap();
        assert_eq!(chart, ChartSpec::fallback("show me sales data"));
    }

    #[tokio::test]
    async fn empty_chart_answer_stores_nothing() {
        let (storage, queue, conv, _shutdown) = setup(Arc::new(EmptyChartProvider)).await;
        let job = queue.enqueue(spec(conv, JobKind::Chart));

        let done = wait(&queue, job.id).await;
        assert_eq!(done.status, JobStatus::Failed);
        assert_eq!(done.error.as_deref(), Some("no chart data"));
        assert!(!done.fallback);
        assert!(storage.list_messages(conv).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn image_job_appends_image_message() {
        let (storage, queue, conv, _shutdown) = setup(Arc::new(LocalProvider)).await;
        let job = queue.enqueue(spec(conv, JobKind::Image));

        let done = wait(&queue, job.id).await;
        assert_eq!(done.status, JobStatus::Completed);
        let messages = storage.list_messages(conv).await.unwrap();
        assert!(content::is_image(&messages[0].content));
        assert_eq!(messages[0].message_type, MessageType::Image);
    }

    #[tokio::test]
    async fn image_job_without_image_fails() {
        let (storage, queue, conv, _shutdown) = setup(Arc::new(TextOnlyProvider)).await;
        let job = queue.enqueue(spec(conv, JobKind::Image));

        let done = wait(&queue, job.id).await;
        assert_eq!(done.status, JobStatus::Failed);
        assert_eq!(done.error.as_deref(), Some("provider returned no image"));
        assert!(storage.list_messages(conv).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn image_provider_error_fails_job() {
        let (_storage, queue, conv, _shutdown) = setup(Arc::new(BrokenProvider)).await;
        let job = queue.enqueue(spec(conv, JobKind::Image));
        let done = wait(&queue, job.id).await;
        assert_eq!(done.status, JobStatus::Failed);
        assert!(done.message_id.is_none());
    }

    #[tokio::test]
    async fn job_for_deleted_conversation_fails() {
        let (storage, queue, conv, _shutdown) = setup(Arc::new(LocalProvider)).await;
        storage.delete_conversation(conv).await.unwrap();

        let job = queue.enqueue(spec(conv, JobKind::Chart));
        let done = wait(&queue, job.id).await;
        assert_eq!(done.status, JobStatus::Failed);
        assert!(storage.list_messages(conv).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_lifecycle_updates() {
        let (_storage, queue, conv, _shutdown) = setup(Arc::new(LocalProvider)).await;
        let mut updates = queue.subscribe();
        let job = queue.enqueue(spec(conv, JobKind::Chart));

        let mut seen = Vec::new();
        while seen.last() != Some(&JobStatus::Completed) {
            let update = tokio::time::timeout(Duration::from_secs(5), updates.recv())
                .await
                .expect("update in time")
                .expect("channel open");
            if update.id == job.id {
                seen.push(update.status);
            }
        }
        assert_eq!(
            seen,
            vec![JobStatus::Queued, JobStatus::Running, JobStatus::Completed]
        );
        assert_eq!(queue.list_for_conversation(conv).len(), 1);
    }

    #[tokio::test]
    async fn enqueue_after_shutdown_fails_immediately() {
        let (_storage, queue, conv, shutdown) = setup(Arc::new(LocalProvider)).await;
        shutdown.cancel();
        // Let the worker observe cancellation and drop its receiver.
        for _ in 0..50 {
            if queue.tx.is_closed() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let job = queue.enqueue(spec(conv, JobKind::Chart));
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn forget_conversation_drops_its_jobs() {
        let (storage, queue, conv, _shutdown) = setup(Arc::new(LocalProvider)).await;
        let other = storage
            .create_conversation(NewConversation::titled("other"))
            .await
            .unwrap()
            .id;
        let job = queue.enqueue(spec(conv, JobKind::Chart));
        let kept = queue.enqueue(spec(other, JobKind::Chart));
        wait(&queue, job.id).await;
        wait(&queue, kept.id).await;

        assert_eq!(queue.forget_conversation(conv), 1);
        assert!(queue.list_for_conversation(conv).is_empty());
        assert!(queue.get(job.id).is_none());
        assert_eq!(queue.list_for_conversation(other).len(), 1);
    }

    #[tokio::test]
    async fn finished_jobs_are_capped() {
        let storage = Arc::new(MemStorage::new());
        let conv = storage
            .create_conversation(NewConversation::titled("busy"))
            .await
            .unwrap()
            .id;
        let queue = JobQueue::spawn(
            storage,
            Arc::new(LocalProvider),
            CancellationToken::new(),
            2,
        );

        let mut ids = Vec::new();
        for _ in 0..4 {
            let job = queue.enqueue(spec(conv, JobKind::Chart));
            wait(&queue, job.id).await;
            ids.push(job.id);
        }

        let remaining: Vec<Uuid> = queue
            .list_for_conversation(conv)
            .into_iter()
            .map(|j| j.id)
            .collect();
        assert_eq!(remaining, ids[2..].to_vec());
    }
}
