//! Session extractor and API error type

use crate::AppState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use csjava_core::CoreError;
use serde_json::json;
use std::collections::HashMap;

/// Error response rendered as `{"error", "code"}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::EmptyInput => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "empty_input",
                error.to_string(),
            ),
            CoreError::Cancelled { .. } => {
                Self::new(StatusCode::CONFLICT, "cancelled", error.to_string())
            }
            CoreError::Completion(_) | CoreError::Http(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "completion_failed", error.to_string())
            }
            _ => {
                tracing::error!("Request failed: {}", error);
                Self::internal(error.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "code": self.code
        }));
        (self.status, body).into_response()
    }
}

/// Id of an existing session, taken from the `:id` path segment
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

#[async_trait]
impl FromRequestParts<AppState> for SessionId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        let id = params
            .get("id")
            .cloned()
            .ok_or_else(|| ApiError::bad_request("Missing session id"))?;

        if !state.sessions.contains(&id) {
            return Err(ApiError::not_found(
                "session_not_found",
                format!("Session {} not found", id),
            ));
        }
        Ok(SessionId(id))
    }
}

/// Position of a result in the last batch, taken from the `:index` path segment
#[derive(Debug, Clone, Copy)]
pub struct ResultIndex(pub usize);

#[async_trait]
impl FromRequestParts<AppState> for ResultIndex {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        let raw = params
            .get("index")
            .ok_or_else(|| ApiError::bad_request("Missing result index"))?;
        raw.parse().map(ResultIndex).map_err(|_| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "invalid_index",
                format!("Invalid result index: {}", raw),
            )
        })
    }
}
