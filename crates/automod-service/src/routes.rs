//! HTTP routes and handlers

use crate::lifecycle::{HealthSnapshot, ServiceState};
use automod_classifiers::ContentModerator;
use automod_core::{ContentRecord, ModerationResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// The moderation pipeline
    pub moderator: Arc<ContentModerator>,

    /// Lifecycle state: loaded flag, activity tracking
    pub lifecycle: Arc<ServiceState>,
}

pub fn create_router(state: AppState) -> Router {
    // Method-level fallbacks keep wrong-method requests at 404 instead of
    // axum's default 405.
    Router::new()
        .route("/health", get(health).fallback(fallback))
        .route("/", post(moderate).fallback(fallback))
        .fallback(fallback)
        .with_state(state)
}

/// Read-only lifecycle snapshot
async fn health(State(state): State<AppState>) -> Json<HealthSnapshot> {
    Json(state.lifecycle.snapshot())
}

/// Moderate a content record.
///
/// The caller always receives a parseable decision: a malformed body or
/// any internal failure yields a fail-open result with status 500 rather
/// than a connection failure.
async fn moderate(
    State(state): State<AppState>,
    payload: Result<Json<ContentRecord>, JsonRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4();

    let Json(record) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(%request_id, error = %rejection, "rejecting malformed moderation request");
            let body = ModerationResult::fail_open(format!("invalid request body: {rejection}"));
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };

    state.lifecycle.touch();
    let result = state.moderator.moderate(&record).await;
    info!(
        %request_id,
        allowed = result.allowed,
        fields = result.predictions.len(),
        "moderation request handled"
    );

    (StatusCode::OK, Json(result)).into_response()
}

async fn fallback() -> StatusCode {
    StatusCode::NOT_FOUND
}
