//! Follow-up job handlers: polling, long-polling and server-sent events.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream, StreamExt};
use parley_core::jobs::Job;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{JobQuery, JobResponse};

/// Upper bound on how long `?wait=true` holds a request.
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// `GET /api/conversations/{id}/jobs`: oldest first.
pub async fn list_jobs_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<JobResponse>>> {
    let jobs = state.chat.jobs().list_for_conversation(id);
    Ok(Json(jobs.into_iter().map(Into::into).collect()))
}

/// `GET /api/jobs/{id}`
///
/// With `?wait=true` the response is held until the job finishes or
/// [`LONG_POLL_TIMEOUT`] passes, whichever comes first.
pub async fn get_job_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<JobQuery>,
) -> AppResult<Json<JobResponse>> {
    let jobs = state.chat.jobs();
    let job = if query.wait {
        match tokio::time::timeout(LONG_POLL_TIMEOUT, jobs.wait(id)).await {
            Ok(job) => job,
            Err(_) => jobs.get(id),
        }
    } else {
        jobs.get(id)
    };
    job.map(|j| Json(j.into()))
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

/// `GET /api/conversations/{id}/events`
///
/// Streams a `job` event for every known job of the conversation, then one
/// per update as the worker makes progress.
pub async fn job_events_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if state.chat.storage().get_conversation(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Conversation {id} not found")));
    }

    let jobs = state.chat.jobs();
    let updates = jobs.subscribe();
    let snapshot = stream::iter(jobs.list_for_conversation(id));
    debug!(conversation_id = %id, "job event stream opened");

    let live = stream::unfold(updates, move |mut updates| async move {
        loop {
            match updates.recv().await {
                Ok(job) if job.conversation_id == id => return Some((job, updates)),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(conversation_id = %id, skipped, "job event stream lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    let events = snapshot.chain(live).filter_map(|job| async move { job_event(job) });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn job_event(job: Job) -> Option<Result<Event, Infallible>> {
    match Event::default()
        .event("job")
        .id(job.id.to_string())
        .json_data(JobResponse::from(job))
    {
        Ok(event) => Some(Ok(event)),
        Err(e) => {
            warn!(error = %e, "failed to encode job event");
            None
        }
    }
}
