//! API route modules.

pub mod autocomplete;
pub mod engines;
pub mod health;
pub mod search;
pub mod thumbnail;

use axum::{Router, routing::get};

use crate::api::server::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let api_v1: Router<AppState> = Router::new()
        .route("/search", get(search::search))
        .route("/autocomplete", get(autocomplete::autocomplete))
        .route("/engines", get(engines::list_engines))
        .route("/engines/{name}", get(engines::get_engine))
        .route("/bangs", get(engines::list_bangs))
        .route("/thumbnail", get(thumbnail::thumbnail));

    Router::new()
        .route("/search", get(search::search))
        .route("/healthz", get(health::healthz))
        .nest("/api/v1", api_v1)
        .with_state(state)
}
