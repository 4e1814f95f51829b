//! Code-analysis handlers

use crate::extractors::{ApiError, SessionId};
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use csjava_core::history::HISTORY_CAPACITY;
use csjava_core::{AnalysisRecord, CoreError};
use serde::Deserialize;

/// Name given to pasted code when the request carries none
pub const DEFAULT_ANALYSIS_NAME: &str = "CodeAnalysis.cs";

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    code: String,
    filename: Option<String>,
}

/// Analyze pasted code and record it in the session history
pub async fn analyze(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisRecord>, ApiError> {
    if request.code.trim().is_empty() {
        return Err(CoreError::EmptyInput.into());
    }
    let filename = request
        .filename
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ANALYSIS_NAME.to_string());

    let analysis = state
        .converter
        .analyze(&request.code, &filename)
        .await
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_GATEWAY,
                "analysis_failed",
                "An error occurred during analysis",
            )
        })?;

    let record = AnalysisRecord::new(analysis, filename, &request.code);
    state.sessions.update(&id, |session| {
        session.history.push(record.clone());
    });
    Ok(Json(record))
}

/// Analysis history, newest first
pub async fn history(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<Json<Vec<AnalysisRecord>>, ApiError> {
    state
        .sessions
        .read(&id, |session| {
            session
                .history
                .recent(HISTORY_CAPACITY)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        })
        .map(Json)
        .ok_or_else(|| ApiError::not_found("session_not_found", format!("Session {} not found", id)))
}
