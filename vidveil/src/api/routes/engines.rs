//! Engine registry routes: snapshots and the bang table.

use axum::extract::{Path, State};
use engines_parser::EngineInfo;

use crate::api::error::{ApiError, ApiResult, PrettyJson};
use crate::api::models::BangEntry;
use crate::api::server::AppState;

/// `GET /api/v1/engines`: the full registry snapshot.
pub async fn list_engines(
    State(state): State<AppState>,
) -> ApiResult<PrettyJson<Vec<EngineInfo>>> {
    Ok(PrettyJson(state.registry.snapshot()))
}

/// `GET /api/v1/engines/{name}`: one engine record or 404.
pub async fn get_engine(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<PrettyJson<EngineInfo>> {
    state
        .registry
        .info(&name.to_ascii_lowercase())
        .map(PrettyJson)
        .ok_or_else(|| {
            ApiError::not_found("UNKNOWN_ENGINE", format!("engine '{name}' not found"))
        })
}

/// `GET /api/v1/bangs`: sorted bang-to-engine listing.
pub async fn list_bangs(State(state): State<AppState>) -> ApiResult<PrettyJson<Vec<BangEntry>>> {
    let entries = state
        .registry
        .bang_table()
        .into_iter()
        .map(|(bang, engine)| BangEntry {
            bang: format!("!{bang}"),
            engine,
        })
        .collect();
    Ok(PrettyJson(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn state() -> AppState {
        AppState::from_config(AppConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn snapshot_lists_every_engine() {
        let engines = list_engines(State(state())).await.unwrap().0;
        assert_eq!(engines.len(), 10);
        assert!(engines.iter().any(|e| e.name == "pornhub"));
    }

    #[tokio::test]
    async fn single_engine_lookup() {
        let info = get_engine(State(state()), Path("PornHub".to_string()))
            .await
            .unwrap()
            .0;
        assert_eq!(info.name, "pornhub");
        assert!(info.bangs.contains(&"ph".to_string()));

        let missing = get_engine(State(state()), Path("nosuch".to_string())).await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn bang_table_is_sorted_and_prefixed() {
        let bangs = list_bangs(State(state())).await.unwrap().0;
        assert!(bangs.iter().any(|b| b.bang == "!ph" && b.engine == "pornhub"));
        let raw: Vec<&str> = bangs.iter().map(|b| b.bang.as_str()).collect();
        let mut sorted = raw.clone();
        sorted.sort();
        assert_eq!(raw, sorted);
    }
}
