//! API server setup and shared state.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use engines_parser::{CircuitBreakerManager, EngineRegistry, default_registry};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::api::routes;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::search::SearchService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server start time for uptime calculation
    pub start_time: Instant,
    pub config: Arc<AppConfig>,
    pub registry: Arc<EngineRegistry>,
    pub breakers: Arc<CircuitBreakerManager>,
    pub search: Arc<SearchService>,
    /// Client used by the thumbnail proxy; separate from engine transports.
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Build the full state tree from configuration: registry, breaker
    /// table, search service, proxy client.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let registry = Arc::new(
            default_registry(&config.search.transport()).map_err(Error::Engine)?,
        );
        let breakers = Arc::new(CircuitBreakerManager::default());
        let search = Arc::new(SearchService::new(
            registry.clone(),
            breakers.clone(),
            &config.search,
        ));

        let http_client = engines_parser::client::create_client_builder(&config.search.user_agent)
            .map_err(Error::Engine)?
            .timeout(config.search.thumbnail_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::config(format!("thumbnail client: {e}")))?;

        Ok(Self {
            start_time: Instant::now(),
            config: Arc::new(config),
            registry,
            breakers,
            search,
            http_client,
        })
    }
}

/// API server.
pub struct ApiServer {
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Build the router with all middleware and routes.
    fn build_router(&self) -> Router {
        let mut router = routes::create_router(self.state.clone());

        if self.state.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        // Request tracing, with the health endpoint muted.
        router = router.layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request| {
                if req.uri().path() == "/healthz" {
                    Span::none()
                } else {
                    let mut make_span =
                        tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO);
                    use tower_http::trace::MakeSpan;
                    make_span.make_span(req)
                }
            }),
        );

        router
    }

    /// Start the server and run until the cancel token fires.
    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!(
            "{}:{}",
            self.state.config.server.bind_address, self.state.config.server.port
        )
        .parse()
        .map_err(|e| Error::config(format!("invalid bind address: {e}")))?;

        let router = self.build_router();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("API server listening on http://{}", addr);

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("API server shutting down...");
            })
            .await
            .map_err(|e| Error::Other(format!("server error: {e}")))?;

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
