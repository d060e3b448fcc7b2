//! The search pipeline: fan-out scheduling, normalization, caching.

pub mod cache;
pub mod dedup;
pub mod events;
pub mod scheduler;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use engines_parser::{CircuitBreakerManager, EngineRegistry, ParsedQuery, VideoResult};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::Result;
use self::cache::{SearchCache, fingerprint};
use self::events::SearchEvent;
use self::scheduler::SearchScheduler;

/// A completed batched search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub cleaned_query: String,
    pub results: Vec<VideoResult>,
    /// Engines that completed, in completion order.
    pub engines_used: Vec<String>,
    /// Engine short name → machine-readable failure reason.
    pub engines_failed: BTreeMap<String, String>,
    pub search_time_ms: u64,
    pub cached: bool,
    pub has_bang: bool,
    pub bang_engines: Vec<String>,
}

/// Drain a scheduler output channel into its aggregate form.
pub async fn collect(mut rx: mpsc::Receiver<SearchEvent>) -> CollectedEvents {
    let mut collected = CollectedEvents::default();
    while let Some(event) = rx.recv().await {
        match event {
            SearchEvent::Result(result) => collected.results.push(*result),
            SearchEvent::Done { engine, .. } => collected.engines_used.push(engine),
            SearchEvent::Failure { engine, reason } => {
                collected.engines_failed.insert(engine, reason);
            }
            SearchEvent::Complete { .. } => break,
        }
    }
    collected
}

#[derive(Debug, Default)]
pub struct CollectedEvents {
    pub results: Vec<VideoResult>,
    pub engines_used: Vec<String>,
    pub engines_failed: BTreeMap<String, String>,
}

/// Front door for both delivery modes: streaming fan-outs and cached batched
/// responses.
pub struct SearchService {
    scheduler: SearchScheduler,
    cache: SearchCache,
}

impl SearchService {
    pub fn new(
        registry: Arc<EngineRegistry>,
        breakers: Arc<CircuitBreakerManager>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            scheduler: SearchScheduler::new(registry, breakers),
            cache: SearchCache::new(config.cache_ttl, config.cache_capacity),
        }
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        self.scheduler.registry()
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerManager> {
        self.scheduler.breakers()
    }

    /// Approximate number of live cache entries, for the health check.
    pub fn cached_entries(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Streaming search. Never cached: an SSE response is consumed as it is
    /// produced and cannot be shared between callers.
    pub fn stream(
        &self,
        token: &CancellationToken,
        parsed: &ParsedQuery,
        selection: &[String],
        page: u32,
    ) -> mpsc::Receiver<SearchEvent> {
        self.scheduler
            .dispatch(token, &parsed.cleaned, page, selection)
    }

    /// Batched search with cache and single-flight. `no_cache` forces a
    /// recompute but still populates the cache for later callers.
    pub async fn search(
        &self,
        token: &CancellationToken,
        parsed: &ParsedQuery,
        selection: &[String],
        page: u32,
        no_cache: bool,
    ) -> Result<Arc<SearchResponse>> {
        let key = fingerprint(&parsed.cleaned, page, selection);

        if no_cache {
            let response = Arc::new(self.run(token, parsed, selection, page).await);
            self.cache.insert(key, response.clone()).await;
            return Ok(response);
        }

        if let Some(hit) = self.cache.get(&key).await {
            debug!(fingerprint = %&key[..16], "Search cache hit");
            let mut response = (*hit).clone();
            response.cached = true;
            return Ok(Arc::new(response));
        }

        self.cache
            .get_or_compute(key, async {
                Ok(Arc::new(self.run(token, parsed, selection, page).await))
            })
            .await
    }

    async fn run(
        &self,
        token: &CancellationToken,
        parsed: &ParsedQuery,
        selection: &[String],
        page: u32,
    ) -> SearchResponse {
        let started = Instant::now();
        let rx = self
            .scheduler
            .dispatch(token, &parsed.cleaned, page, selection);
        let collected = collect(rx).await;

        SearchResponse {
            query: parsed.original.clone(),
            cleaned_query: parsed.cleaned.clone(),
            results: collected.results,
            engines_used: collected.engines_used,
            engines_failed: collected.engines_failed,
            search_time_ms: started.elapsed().as_millis() as u64,
            cached: false,
            has_bang: parsed.had_bang,
            bang_engines: parsed.engines.clone(),
        }
    }
}
