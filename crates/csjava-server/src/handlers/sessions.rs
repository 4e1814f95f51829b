//! Session handlers

use crate::extractors::{ApiError, SessionId};
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    session_id: String,
}

fn session_not_found(id: &str) -> ApiError {
    ApiError::not_found("session_not_found", format!("Session {} not found", id))
}

pub async fn create(State(state): State<AppState>) -> (StatusCode, Json<SessionResponse>) {
    let session_id = state.sessions.create();
    (StatusCode::CREATED, Json(SessionResponse { session_id }))
}

/// Drop every result of the session but keep it alive
pub async fn clear(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<StatusCode, ApiError> {
    if !state.sessions.clear(&id) {
        return Err(session_not_found(&id));
    }
    tracing::info!("Session {} cleared", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<StatusCode, ApiError> {
    if !state.sessions.remove(&id) {
        return Err(session_not_found(&id));
    }
    tracing::info!("Session {} deleted ({} active)", id, state.sessions.len());
    Ok(StatusCode::NO_CONTENT)
}
