//! Thumbnail proxy route.
//!
//! Fetches a caller-supplied upstream image server-side and streams it back,
//! so client IPs never reach third-party CDNs. No transcoding, no resizing,
//! no persistent cache.

use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use url::Url;

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::error::Error;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
const CACHE_CONTROL: &str = "public, max-age=3600";

#[derive(Debug, Deserialize)]
pub struct ThumbnailParams {
    pub url: Option<String>,
}

/// `GET /api/v1/thumbnail?url=<encoded>`.
pub async fn thumbnail(
    State(state): State<AppState>,
    Query(params): Query<ThumbnailParams>,
) -> ApiResult<Response> {
    let raw = params
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            ApiError::from(Error::ThumbnailInvalid(
                "query parameter 'url' is required".to_string(),
            ))
        })?;

    let target = Url::parse(raw)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .ok_or_else(|| {
            ApiError::from(Error::ThumbnailInvalid(format!(
                "not an absolute http(s) url: {raw}"
            )))
        })?;

    let upstream = state
        .http_client
        .get(target)
        .send()
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "Thumbnail fetch failed");
            ApiError::from(Error::ThumbnailUpstream(502))
        })?;

    let status = upstream.status();
    if !status.is_success() {
        return Err(ApiError::from(Error::ThumbnailUpstream(status.as_u16())));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    // Stream the upstream body through without buffering it whole.
    let body = Body::from_stream(upstream.bytes_stream());

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
        ],
        body,
    )
        .into_response())
}
