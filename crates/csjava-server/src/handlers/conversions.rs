//! Conversion handlers

use crate::extractors::{ApiError, ResultIndex, SessionId};
use crate::handlers::downloads::attachment;
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Response,
    Json,
};
use csjava_core::archive::extract_uploads;
use csjava_core::{
    ConversionBatch, ConversionOptions, ConversionResult, ConversionStats, CoreError, SourceUnit,
    Upload,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Name given to pasted code
pub const INSTANT_SOURCE_NAME: &str = "InstantConversion.cs";
/// Download name for the pasted-code translation
pub const INSTANT_DOWNLOAD_NAME: &str = "ConvertedCode.java";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    results: Vec<ConversionResult>,
    stats: ConversionStats,
    warnings: Vec<String>,
    /// Name of the uploaded project archive, if any
    project: Option<String>,
}

impl From<&ConversionBatch> for BatchResponse {
    fn from(batch: &ConversionBatch) -> Self {
        Self {
            results: batch.results.clone(),
            stats: batch.stats.clone(),
            warnings: batch.warnings.clone(),
            project: batch.layout.as_ref().and_then(|l| l.name.clone()),
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        other => Err(ApiError::bad_request(format!(
            "Invalid value '{}' for {}",
            other, name
        ))),
    }
}

fn upload_error(error: MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "upload_too_large",
            format!("Upload exceeds the size limit: {}", error.body_text()),
        )
    } else {
        ApiError::bad_request(error.body_text())
    }
}

/// Run a batch over the uploaded `files` and keep it in the session
pub async fn upload(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, ApiError> {
    let mut uploads = Vec::new();
    let mut options = ConversionOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(upload_error)?;
                debug!("Received {} ({} bytes)", file_name, bytes.len());
                uploads.push(Upload::new(file_name, bytes.to_vec()));
            }
            "include_comments" | "generate_getters_setters" | "use_java_conventions"
            | "use_project_context" => {
                let value = field
                    .text()
                    .await
                    .map_err(upload_error)?;
                let flag = parse_flag(&name, &value)?;
                match name.as_str() {
                    "include_comments" => options.include_comments = flag,
                    "generate_getters_setters" => options.generate_getters_setters = flag,
                    "use_java_conventions" => options.use_java_conventions = flag,
                    _ => options.use_project_context = flag,
                }
            }
            other => debug!("Ignoring form field {}", other),
        }
    }

    let extraction = extract_uploads(
        &uploads,
        state.converter.suffixes(),
        &state.config.text_extensions,
    );
    let batch = state
        .converter
        .convert_batch(
            extraction,
            &options,
            |progress| {
                debug!(
                    "Session {}: {}/{} {}",
                    id, progress.completed, progress.total, progress.current
                )
            },
            None,
        )
        .await?;

    info!(
        "Session {}: converted {}/{} file(s)",
        id, batch.stats.succeeded, batch.stats.total_files
    );
    let response = BatchResponse::from(&batch);
    if state
        .sessions
        .update(&id, |session| session.batch = Some(batch))
        .is_none()
    {
        warn!("Session {} expired while its batch was running", id);
        return Err(ApiError::not_found(
            "session_not_found",
            format!("Session {} expired during conversion", id),
        ));
    }
    Ok(Json(response))
}

/// Last batch of the session
pub async fn last(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<Json<BatchResponse>, ApiError> {
    state
        .sessions
        .read(&id, |session| session.batch.as_ref().map(BatchResponse::from))
        .flatten()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("no_batch", "No conversion has been run yet"))
}

/// One translated file of the last batch
pub async fn java_file(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    ResultIndex(index): ResultIndex,
) -> Result<Response, ApiError> {
    let result = state
        .sessions
        .read(&id, |session| {
            session
                .batch
                .as_ref()
                .and_then(|batch| batch.results.get(index).cloned())
        })
        .flatten()
        .ok_or_else(|| ApiError::not_found("no_result", format!("No result at index {}", index)))?;

    let file_name = result
        .target_name
        .rsplit('/')
        .next()
        .unwrap_or(&result.target_name)
        .to_string();
    Ok(attachment(&file_name, TEXT_PLAIN, result.translated_code))
}

#[derive(Debug, Deserialize)]
pub struct InstantRequest {
    code: String,
    #[serde(default)]
    options: ConversionOptions,
}

/// Convert pasted code
pub async fn instant(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    Json(request): Json<InstantRequest>,
) -> Result<Json<ConversionResult>, ApiError> {
    if request.code.trim().is_empty() {
        return Err(CoreError::EmptyInput.into());
    }

    let unit = SourceUnit::new(INSTANT_SOURCE_NAME, request.code);
    let result = state.converter.convert(&unit, &request.options, None).await;
    state
        .sessions
        .update(&id, |session| session.instant = Some(result.clone()))
        .ok_or_else(|| {
            warn!("Session {} expired while converting pasted code", id);
            ApiError::not_found(
                "session_not_found",
                format!("Session {} expired during conversion", id),
            )
        })?;
    Ok(Json(result))
}

/// Last pasted-code translation as a Java file
pub async fn instant_java(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<Response, ApiError> {
    let code = state
        .sessions
        .read(&id, |session| {
            session
                .instant
                .as_ref()
                .map(|result| result.translated_code.clone())
        })
        .flatten()
        .ok_or_else(|| ApiError::not_found("no_result", "No pasted code has been converted"))?;

    Ok(attachment(INSTANT_DOWNLOAD_NAME, TEXT_PLAIN, code))
}
