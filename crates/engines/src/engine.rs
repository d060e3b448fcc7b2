//! Engine base type and the `SearchEngine` trait.
//!
//! Each upstream site is a value composing an [`Engine`]: the shared
//! transport/header plumbing, identity, tier and capability record. Site
//! modules supply only what actually differs per site: the search URL
//! builder and the response parser.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{ClientPair, TransportConfig, browser_headers, create_clients};
use crate::error::EngineError;
use crate::model::{Capabilities, VideoResult};
use crate::retry::{RetryPolicy, retry_with_backoff};

/// Base engine state composed into every site implementation.
///
/// Holds both transport flavors (plain TLS and browser-spoofed) sharing
/// one cookie jar; `transport.profile` decides which one requests go
/// through.
pub struct Engine {
    /// Unique lowercase short name, e.g. "pornhub".
    pub name: &'static str,
    pub display_name: &'static str,
    pub base_url: &'static str,
    /// 1 = fastest upstreams, 6 = slowest.
    pub tier: u8,
    pub capabilities: Capabilities,
    enabled: AtomicBool,
    clients: ClientPair,
    use_spoofed: bool,
    headers: HeaderMap,
    retry: RetryPolicy,
}

impl Engine {
    pub fn new(
        name: &'static str,
        display_name: &'static str,
        base_url: &'static str,
        tier: u8,
        capabilities: Capabilities,
        transport: &TransportConfig,
    ) -> Result<Self, EngineError> {
        let clients = create_clients(transport)?;
        Ok(Self {
            name,
            display_name,
            base_url,
            tier,
            capabilities,
            enabled: AtomicBool::new(true),
            clients,
            use_spoofed: transport.profile.is_some(),
            headers: browser_headers(&transport.user_agent),
            retry: RetryPolicy::default(),
        })
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn client(&self) -> &Client {
        if self.use_spoofed {
            &self.clients.spoofed
        } else {
            &self.clients.standard
        }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client()
            .request(method, url)
            .headers(self.headers.clone())
    }

    /// GET `url` and return the body as text, retrying transient failures.
    ///
    /// Cancellation is honoured before the request, while it is in flight,
    /// and during backoff sleeps.
    pub async fn fetch_text(
        &self,
        token: &CancellationToken,
        url: &str,
    ) -> Result<String, EngineError> {
        retry_with_backoff(&self.retry, token, |attempt| async move {
            debug!(engine = self.name, url, attempt, "Fetching search page");

            let response = tokio::select! {
                _ = token.cancelled() => return Err(EngineError::Cancelled),
                result = self.get(url).send() => result.map_err(EngineError::from_reqwest)?,
            };

            if let Some(err) = EngineError::from_status(response.status()) {
                return Err(err);
            }

            tokio::select! {
                _ = token.cancelled() => Err(EngineError::Cancelled),
                body = response.text() => body.map_err(EngineError::from_reqwest),
            }
        })
        .await
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// One upstream site: URL construction, response parsing, and the search
/// operation that ties them to the shared transport.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    fn engine(&self) -> &Engine;

    /// Bang tokens selecting this engine, without the leading `!`.
    fn bangs(&self) -> &'static [&'static str];

    /// Build the absolute search URL for `(query, page)`. Implementations
    /// escape the query exactly once.
    fn search_url(&self, query: &str, page: u32) -> String;

    /// Parse a response body into results. Zero items is a valid outcome;
    /// a body this engine cannot make sense of at all is a `Parse` error.
    fn parse_page(&self, body: &str) -> Result<Vec<VideoResult>, EngineError>;

    async fn search(
        &self,
        token: &CancellationToken,
        query: &str,
        page: u32,
    ) -> Result<Vec<VideoResult>, EngineError> {
        let url = self.search_url(query, page.max(1));
        let body = self.engine().fetch_text(token, &url).await?;
        let results = self.parse_page(&body)?;
        debug!(
            engine = self.engine().name,
            count = results.len(),
            "Parsed search results"
        );
        Ok(results)
    }
}
