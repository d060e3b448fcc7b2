//! API error handling and JSON rendering.
//!
//! Every JSON body this server emits, success or error, is pretty-printed
//! with two-space indentation and ends with a single newline; [`PrettyJson`]
//! is the one place that formatting lives. Errors use the envelope
//! `{ ok:false, error, code, status }`.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::Error;

/// JSON responder: two-space indent, trailing newline.
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_string_pretty(&self.0) {
            Ok(mut body) => {
                body.push('\n');
                (
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response()
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response body");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// API error envelope body.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub ok: bool,
    /// Human-readable error message
    pub error: String,
    /// Error code for programmatic handling
    pub code: String,
    /// HTTP status, mirrored into the body
    pub status: u16,
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            ok: false,
            error: self.message,
            code: self.code,
            status: self.status.as_u16(),
        };
        (self.status, PrettyJson(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::MissingQuery => {
                ApiError::bad_request("MISSING_QUERY", "query parameter 'q' is required")
            }
            Error::EmptyQuery => ApiError::bad_request(
                "EMPTY_QUERY",
                "query is empty after bang extraction",
            ),
            Error::UnknownEngine(name) => {
                ApiError::not_found("UNKNOWN_ENGINE", format!("engine '{name}' not found"))
            }
            Error::ThumbnailInvalid(msg) => {
                ApiError::bad_request("THUMBNAIL_INVALID", msg)
            }
            Error::ThumbnailUpstream(status) => ApiError::not_found(
                "THUMBNAIL_UPSTREAM",
                format!("upstream returned {status}"),
            ),
            Error::Streaming(msg) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STREAMING_ERROR",
                msg,
            ),
            other => {
                tracing::error!(error = %other, "Unexpected error");
                ApiError::internal("an unexpected error occurred")
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
