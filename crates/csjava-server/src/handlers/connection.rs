//! Completion-service connection check

use crate::extractors::ApiError;
use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    success: bool,
    reply: String,
}

pub async fn check(State(state): State<AppState>) -> Result<Json<ConnectionResponse>, ApiError> {
    let reply = csjava_core::test_connection(state.converter.client())
        .await
        .map_err(|e| {
            tracing::warn!("Connection test failed: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(ConnectionResponse {
        success: true,
        reply,
    }))
}
