//! Search routes: streaming (SSE), batched JSON, and plain-text delivery.

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use engines_parser::ParsedQuery;
use futures::StreamExt;
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::api::error::{ApiError, ApiResult, PrettyJson};
use crate::api::server::AppState;
use crate::error::Error;
use crate::search::SearchResponse;
use crate::search::events::SearchEvent;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<u32>,
    /// CSV of engine short names; ignored when the query carries bangs.
    pub engines: Option<String>,
    pub nocache: Option<String>,
    /// Drop results shorter than this many seconds.
    pub min_duration: Option<u32>,
    /// Drop results longer than this many seconds.
    pub max_duration: Option<u32>,
}

/// Validated request: parsed bangs, resolved selection, paging.
struct PreparedSearch {
    parsed: ParsedQuery,
    selection: Vec<String>,
    page: u32,
    no_cache: bool,
}

fn prepare(state: &AppState, params: &SearchParams) -> Result<PreparedSearch, Error> {
    let raw = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(Error::MissingQuery)?;

    let parsed = state.registry.parse_query(raw)?;

    // Bangs win over the engines filter; with neither, the scheduler takes
    // the full enabled set.
    let selection = if parsed.had_bang {
        parsed.engines.clone()
    } else {
        params
            .engines
            .as_deref()
            .map(|csv| {
                csv.split(',')
                    .map(|name| name.trim().to_ascii_lowercase())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    };

    let no_cache = matches!(
        params.nocache.as_deref(),
        Some("1") | Some("true") | Some("yes")
    );

    Ok(PreparedSearch {
        parsed,
        selection,
        page: params.page.unwrap_or(1).max(1),
        no_cache,
    })
}

/// `GET /search` and `GET /api/v1/search`, negotiated by `Accept`:
/// `text/event-stream` streams results as SSE, `text/plain` renders a
/// listing, everything else (including the HTML layer's delegation) gets the
/// batched JSON response.
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> ApiResult<Response> {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if accept.contains("text/event-stream") {
        return stream_search(state, params).await;
    }
    if accept.contains("text/plain") {
        return plain_search(state, params).await;
    }
    batched_search(state, params).await
}

async fn stream_search(state: AppState, params: SearchParams) -> ApiResult<Response> {
    let prepared = prepare(&state, &params).map_err(ApiError::from)?;
    let token = CancellationToken::new();
    let rx = state
        .search
        .stream(&token, &prepared.parsed, &prepared.selection, prepared.page);

    let stream = ReceiverStream::new(rx).filter_map(|event| async move {
        let frame = match &event {
            SearchEvent::Result(result) => serde_json::to_string(result).ok(),
            SearchEvent::Done { .. } | SearchEvent::Complete { .. } => {
                serde_json::to_string(&event).ok()
            }
            // Failures are aggregate metadata; the stream only carries
            // results and completion sentinels.
            SearchEvent::Failure { .. } => None,
        };
        frame.map(|data| Ok::<Event, Infallible>(Event::default().data(data)))
    });

    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response())
}

async fn batched_search(state: AppState, params: SearchParams) -> ApiResult<Response> {
    let prepared = prepare(&state, &params).map_err(ApiError::from)?;
    let token = CancellationToken::new();

    let response = state
        .search
        .search(
            &token,
            &prepared.parsed,
            &prepared.selection,
            prepared.page,
            prepared.no_cache,
        )
        .await
        .map_err(ApiError::from)?;

    let response = apply_duration_filters(&response, &params);
    Ok(PrettyJson(response).into_response())
}

async fn plain_search(state: AppState, params: SearchParams) -> ApiResult<Response> {
    let prepared = prepare(&state, &params).map_err(ApiError::from)?;
    let token = CancellationToken::new();

    let response = state
        .search
        .search(
            &token,
            &prepared.parsed,
            &prepared.selection,
            prepared.page,
            prepared.no_cache,
        )
        .await
        .map_err(ApiError::from)?;
    let response = apply_duration_filters(&response, &params);

    let mut out = format!(
        "Results for \"{}\" ({} results, {} ms{})\n\n",
        response.cleaned_query,
        response.results.len(),
        response.search_time_ms,
        if response.cached { ", cached" } else { "" },
    );
    for (index, result) in response.results.iter().enumerate() {
        out.push_str(&format!("{}. {}", index + 1, result.title));
        if !result.duration.is_empty() {
            out.push_str(&format!(" [{}]", result.duration));
        }
        out.push_str(&format!(" - {}\n   {}\n", result.source, result.url));
    }
    if !response.engines_failed.is_empty() {
        out.push_str("\nFailed engines:\n");
        for (engine, reason) in &response.engines_failed {
            out.push_str(&format!("  {engine}: {reason}\n"));
        }
    }

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        out,
    )
        .into_response())
}

/// Apply the optional `min_duration`/`max_duration` filters. Results whose
/// duration is unknown (zero) are only dropped by `min_duration`.
fn apply_duration_filters(response: &SearchResponse, params: &SearchParams) -> SearchResponse {
    if params.min_duration.is_none() && params.max_duration.is_none() {
        return response.clone();
    }

    let mut filtered = response.clone();
    filtered.results.retain(|result| {
        if let Some(min) = params.min_duration
            && result.duration_seconds < min
        {
            return false;
        }
        if let Some(max) = params.max_duration
            && result.duration_seconds > max
        {
            return false;
        }
        true
    });
    filtered
}
