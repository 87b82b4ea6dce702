//! HTTP request handlers for the log API.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use logvault::{FilterSet, LogEntry, LogError, ValidationError};
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::error::ServerResult;
use crate::state::AppState;
use crate::types::HealthResponse;

/// Handle GET /api/health - health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_secs(),
        subscribers: state.subscriber_count(),
    })
}

/// Handle POST /api/logs - validate, persist and broadcast one event.
///
/// The body is taken raw so that non-JSON input yields the same error
/// shape as any other validation failure.
pub async fn submit_log(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<LogEntry>)> {
    let text = std::str::from_utf8(&body)
        .map_err(|_| LogError::from(ValidationError::MalformedBody))?;

    let entry = state.service().ingest_json(text).await.inspect_err(|e| {
        if e.is_validation() {
            debug!(error = %e, "rejected log event");
        }
    })?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Handle GET /api/logs - filtered search, newest first.
pub async fn query_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ServerResult<Json<Vec<LogEntry>>> {
    let filters = FilterSet::from_pairs(params);
    let entries = state.service().query(&filters).await?;
    Ok(Json(entries))
}

/// Handle GET /api/logs/stream - SSE stream of newly accepted entries.
pub async fn stream_logs(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.service().subscribe();
    debug!(subscriber = %subscription.id(), "SSE client attached");

    let stream = subscription.into_stream().filter_map(|entry| {
        match Event::default().event("log").json_data(&entry) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                warn!(error = %e, "failed to encode log event");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
