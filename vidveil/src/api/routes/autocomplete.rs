//! Autocomplete route.

use axum::extract::{Query, State};
use serde::Deserialize;

use crate::api::error::{ApiResult, PrettyJson};
use crate::api::models::AutocompleteResponse;
use crate::api::server::AppState;

#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    pub q: Option<String>,
}

/// `GET /api/v1/autocomplete?q=<prefix>`: bang completions for `!`-prefixed
/// tokens, popular-term completions otherwise. Read-only over the registry.
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> ApiResult<PrettyJson<AutocompleteResponse>> {
    let input = params.q.unwrap_or_default();
    let (kind, suggestions) = state.registry.autocomplete(&input);
    Ok(PrettyJson(AutocompleteResponse {
        ok: true,
        kind,
        suggestions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use engines_parser::AutocompleteKind;

    #[tokio::test]
    async fn bang_prefix_suggests_bangs() {
        let state = AppState::from_config(AppConfig::default()).unwrap();
        let response = autocomplete(
            State(state),
            Query(AutocompleteParams {
                q: Some("!x".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.0.kind, AutocompleteKind::Bang);
        assert!(response.0.suggestions.contains(&"!xv".to_string()));
    }

    #[tokio::test]
    async fn empty_input_returns_none() {
        let state = AppState::from_config(AppConfig::default()).unwrap();
        let response = autocomplete(State(state), Query(AutocompleteParams { q: None }))
            .await
            .unwrap();
        assert_eq!(response.0.kind, AutocompleteKind::None);
        assert!(response.0.suggestions.is_empty());
    }
}
