//! # parley_api
//!
//! HTTP API library for Parley.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use parley_core::chat::ChatService;
use parley_core::jobs::JobQueue;
use parley_core::provider::{self, GenerationProvider};
use parley_core::storage::{MemStorage, Storage};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::config::{ApiConfig, ConfigError};
use crate::handlers::{conversations, feedback, health, jobs, messages, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Chat orchestrator; owns storage and the job queue.
    pub chat: Arc<ChatService>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Build state with the provider selected by `config.provider`.
    ///
    /// Must be called inside a Tokio runtime: the job worker is spawned here
    /// and runs until `shutdown` is cancelled.
    pub fn from_config(config: ApiConfig, shutdown: CancellationToken) -> Result<Self, ConfigError> {
        let provider = provider::build_provider(&config.provider)?;
        Ok(Self::with_provider(config, provider, shutdown))
    }

    /// Build state around an already constructed provider.
    pub fn with_provider(
        config: ApiConfig,
        provider: Arc<dyn GenerationProvider>,
        shutdown: CancellationToken,
    ) -> Self {
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        let jobs = JobQueue::start(Arc::clone(&storage), Arc::clone(&provider), shutdown);
        Self {
            chat: Arc::new(ChatService::new(storage, provider, jobs)),
            config,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = DefaultBodyLimit::max(state.config.max_body_bytes);

    Router::new()
        .route(routes::GET_API_HEALTH, get(health::health_handler))
        .route(routes::POST_API_USERS, post(users::create_user_handler))
        .route(
            routes::GET_API_USERS_ID_CONVERSATIONS,
            get(users::list_user_conversations_handler),
        )
        .route(
            routes::GET_API_CONVERSATIONS,
            get(conversations::list_conversations_handler),
        )
        .route(
            routes::POST_API_CONVERSATIONS,
            post(conversations::create_conversation_handler),
        )
        .route(
            routes::GET_API_CONVERSATIONS_ID,
            get(conversations::get_conversation_handler),
        )
        .route(
            routes::DELETE_API_CONVERSATIONS_ID,
            delete(conversations::delete_conversation_handler),
        )
        .route(
            routes::GET_API_CONVERSATIONS_ID_MESSAGES,
            get(messages::list_messages_handler),
        )
        .route(
            routes::POST_API_CONVERSATIONS_ID_MESSAGES,
            post(messages::send_message_handler),
        )
        .route(
            routes::GET_API_CONVERSATIONS_ID_JOBS,
            get(jobs::list_jobs_handler),
        )
        .route(
            routes::GET_API_CONVERSATIONS_ID_EVENTS,
            get(jobs::job_events_handler),
        )
        .route(routes::GET_API_JOBS_ID, get(jobs::get_job_handler))
        .route(
            routes::POST_API_MESSAGES_ID_FEEDBACK,
            post(feedback::feedback_handler),
        )
        .layer(body_limit)
        .layer(cors)
        .with_state(state)
}
