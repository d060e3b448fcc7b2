//! Liveness route.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};

use crate::api::error::{ApiResult, PrettyJson};
use crate::api::models::HealthResponse;
use crate::api::server::AppState;

/// `GET /healthz`: JSON by default, plain text when `Accept: text/plain`.
pub async fn healthz(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let uptime = state.start_time.elapsed().as_secs();

    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if accept.contains("text/plain") {
        return Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("ok\nuptime: {uptime}s\n"),
        )
            .into_response());
    }

    let open_circuits = state.breakers.open_circuits();
    let mut checks = BTreeMap::new();
    checks.insert(
        "engines".to_string(),
        serde_json::json!({
            "registered": state.registry.len(),
            "enabled": state.registry.enabled().len(),
        }),
    );
    checks.insert(
        "circuit_breakers".to_string(),
        serde_json::json!({
            "open": open_circuits,
        }),
    );
    checks.insert(
        "cache".to_string(),
        serde_json::json!({
            "entries": state.search.cached_entries(),
        }),
    );

    Ok(PrettyJson(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime,
        checks,
    })
    .into_response())
}
