//! Archive download handlers

use crate::extractors::{ApiError, SessionId};
use crate::AppState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use csjava_core::archive::{package_translations_only, repackage};
use csjava_core::ConversionBatch;
use tracing::warn;

const APPLICATION_ZIP: &str = "application/zip";

/// Response carrying `body` as a named file download
pub fn attachment(file_name: &str, content_type: &'static str, body: impl IntoResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

fn last_batch(state: &AppState, id: &str) -> Result<ConversionBatch, ApiError> {
    state
        .sessions
        .read(id, |session| session.batch.clone())
        .flatten()
        .ok_or_else(|| ApiError::not_found("no_batch", "No conversion has been run yet"))
}

/// The uploaded project with translated sources swapped in
pub async fn project(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<Response, ApiError> {
    let batch = last_batch(&state, &id)?;
    let suffixes = state.converter.suffixes();

    let packaged = match &batch.layout {
        Some(layout) => repackage(&layout.entries, &batch.translations(), suffixes)?,
        None => package_translations_only(&batch.translations(), suffixes)?,
    };
    for warning in &packaged.warnings {
        warn!("Session {}: {}", id, warning);
    }

    let file_name = format!("{}_project.zip", batch.download_base_name(suffixes));
    Ok(attachment(&file_name, APPLICATION_ZIP, packaged.bytes))
}

/// Only the translated files
pub async fn java(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<Response, ApiError> {
    let batch = last_batch(&state, &id)?;
    let suffixes = state.converter.suffixes();

    let packaged = package_translations_only(&batch.translations(), suffixes)?;
    for warning in &packaged.warnings {
        warn!("Session {}: {}", id, warning);
    }

    let file_name = format!("{}_java.zip", batch.download_base_name(suffixes));
    Ok(attachment(&file_name, APPLICATION_ZIP, packaged.bytes))
}
