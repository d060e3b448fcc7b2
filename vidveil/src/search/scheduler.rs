//! Fan-out scheduler.
//!
//! One task per selected engine, all producing onto a single bounded
//! channel; a consumer task normalizes, dedups and forwards events to the
//! output channel the delivery layer reads. An engine failing, timing out or
//! being skipped never fails the query.

use std::sync::Arc;

use engines_parser::{CircuitBreakerManager, EngineError, EngineRegistry, SearchEngine};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::dedup::{Deduper, proxy_thumbnail};
use super::events::SearchEvent;

/// Bound on both the producer and output channels. Producers block when the
/// consumer lags; the consumer always drains, so this cannot deadlock.
pub const CHANNEL_CAPACITY: usize = 128;

pub struct SearchScheduler {
    registry: Arc<EngineRegistry>,
    breakers: Arc<CircuitBreakerManager>,
}

impl SearchScheduler {
    pub fn new(registry: Arc<EngineRegistry>, breakers: Arc<CircuitBreakerManager>) -> Self {
        Self { registry, breakers }
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerManager> {
        &self.breakers
    }

    /// Start a fan-out for `(query, page)` across `selection` (engine short
    /// names; empty means every enabled engine) and return the output
    /// channel.
    ///
    /// The stream ends with exactly one `Complete` event. Cancelling `parent`
    /// aborts all in-flight engine tasks; so does dropping the receiver.
    pub fn dispatch(
        &self,
        parent: &CancellationToken,
        query: &str,
        page: u32,
        selection: &[String],
    ) -> mpsc::Receiver<SearchEvent> {
        let token = parent.child_token();
        let (raw_tx, mut raw_rx) = mpsc::channel::<SearchEvent>(CHANNEL_CAPACITY);
        let (out_tx, out_rx) = mpsc::channel::<SearchEvent>(CHANNEL_CAPACITY);

        let mut skipped: Vec<SearchEvent> = Vec::new();
        let mut targets: Vec<Arc<dyn SearchEngine>> = Vec::new();

        if selection.is_empty() {
            targets.extend(self.registry.enabled());
        } else {
            for name in selection {
                match self.registry.get(name) {
                    None => skipped.push(SearchEvent::failure(name.clone(), "unknown")),
                    Some(engine) if !engine.engine().is_enabled() => {
                        skipped.push(SearchEvent::failure(name.clone(), "skipped:disabled"));
                    }
                    Some(engine) => targets.push(engine.clone()),
                }
            }
        }

        let mut running = Vec::with_capacity(targets.len());
        for engine in targets {
            let name = engine.engine().name;
            if self.breakers.is_allowed(name) {
                running.push(engine);
            } else {
                skipped.push(SearchEvent::failure(name, "skipped:circuit_open"));
            }
        }

        debug!(
            engines = running.len(),
            skipped = skipped.len(),
            page,
            "Dispatching search fan-out"
        );

        for engine in running {
            let tx = raw_tx.clone();
            let token = token.clone();
            let breakers = self.breakers.clone();
            let query = query.to_string();
            tokio::spawn(async move {
                let name = engine.engine().name;
                match engine.search(&token, &query, page).await {
                    Ok(results) => {
                        breakers.record_success(name);
                        for result in results {
                            if tx.send(SearchEvent::result(result)).await.is_err() {
                                return;
                            }
                        }
                        let _ = tx.send(SearchEvent::done(name)).await;
                    }
                    // Cancellation is not an upstream failure; it must not
                    // touch the breaker.
                    Err(EngineError::Cancelled) => {}
                    Err(err) => {
                        breakers.record_failure(name);
                        warn!(engine = name, error = %err, "Engine search failed");
                        let _ = tx.send(SearchEvent::failure(name, err.reason())).await;
                    }
                }
            });
        }
        drop(raw_tx);

        tokio::spawn(async move {
            let mut dedup = Deduper::new();

            for event in skipped {
                if out_tx.send(event).await.is_err() {
                    token.cancel();
                    return;
                }
            }

            while let Some(event) = raw_rx.recv().await {
                let forward = match event {
                    SearchEvent::Result(mut result) => {
                        // First emitting engine wins a canonical URL.
                        if !dedup.first_seen(&result.url) {
                            continue;
                        }
                        if !result.thumbnail.is_empty() {
                            result.thumbnail = proxy_thumbnail(&result.thumbnail);
                        }
                        SearchEvent::Result(result)
                    }
                    other => other,
                };
                if out_tx.send(forward).await.is_err() {
                    // Caller went away: tear the fan-out down.
                    token.cancel();
                    return;
                }
            }

            let _ = out_tx.send(SearchEvent::complete()).await;
        });

        out_rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use engines_parser::model::Capabilities;
    use engines_parser::{BreakerConfig, Engine, TransportConfig, VideoResult};
    use std::time::Duration;

    struct StubEngine {
        engine: Engine,
        results: Vec<VideoResult>,
        error: Option<&'static str>,
        delay: Duration,
    }

    impl StubEngine {
        fn new(name: &'static str, results: Vec<VideoResult>) -> Self {
            Self {
                engine: Engine::new(
                    name,
                    name,
                    "https://stub.example",
                    1,
                    Capabilities::default(),
                    &TransportConfig::default(),
                )
                .expect("stub engine"),
                results,
                error: None,
                delay: Duration::ZERO,
            }
        }

        fn failing(name: &'static str) -> Self {
            let mut stub = Self::new(name, Vec::new());
            stub.error = Some("boom");
            stub
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl SearchEngine for StubEngine {
        fn engine(&self) -> &Engine {
            &self.engine
        }

        fn bangs(&self) -> &'static [&'static str] {
            &[]
        }

        fn search_url(&self, _query: &str, _page: u32) -> String {
            "https://stub.example/search".to_string()
        }

        fn parse_page(&self, _body: &str) -> Result<Vec<VideoResult>, EngineError> {
            Ok(Vec::new())
        }

        async fn search(
            &self,
            token: &CancellationToken,
            _query: &str,
            _page: u32,
        ) -> Result<Vec<VideoResult>, EngineError> {
            if !self.delay.is_zero() {
                tokio::select! {
                    _ = token.cancelled() => return Err(EngineError::Cancelled),
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
            match self.error {
                Some(_) => Err(EngineError::ServerError(500)),
                None => Ok(self.results.clone()),
            }
        }
    }

    fn result(engine: &str, url: &str) -> VideoResult {
        let mut r = VideoResult::new(engine, engine, url, format!("clip {url}"));
        r.thumbnail = format!("https://cdn.example/{engine}.jpg");
        r
    }

    fn scheduler_with(engines: Vec<StubEngine>) -> SearchScheduler {
        let mut registry = EngineRegistry::new();
        for engine in engines {
            registry.register(Arc::new(engine)).expect("register stub");
        }
        SearchScheduler::new(
            Arc::new(registry),
            Arc::new(CircuitBreakerManager::default()),
        )
    }

    async fn drain(mut rx: mpsc::Receiver<SearchEvent>) -> Vec<SearchEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn forwards_results_and_sentinels() {
        let scheduler = scheduler_with(vec![
            StubEngine::new("alpha", vec![result("alpha", "https://a.com/1")]),
            StubEngine::new("beta", vec![result("beta", "https://b.com/1")]),
        ]);
        let token = CancellationToken::new();
        let events = drain(scheduler.dispatch(&token, "q", 1, &[])).await;

        let results = events
            .iter()
            .filter(|e| matches!(e, SearchEvent::Result(_)))
            .count();
        let dones = events
            .iter()
            .filter(|e| matches!(e, SearchEvent::Done { .. }))
            .count();
        assert_eq!(results, 2);
        assert_eq!(dones, 2);
        assert!(matches!(events.last(), Some(SearchEvent::Complete { .. })));
    }

    #[tokio::test]
    async fn duplicate_urls_are_suppressed() {
        let shared = "https://shared.example/v?utm_source=x";
        let scheduler = scheduler_with(vec![
            StubEngine::new("alpha", vec![result("alpha", shared)]),
            StubEngine::new(
                "beta",
                vec![
                    result("beta", "https://shared.example/v"),
                    result("beta", "https://b.com/unique"),
                ],
            )
            .slow(Duration::from_millis(20)),
        ]);
        let token = CancellationToken::new();
        let events = drain(scheduler.dispatch(&token, "q", 1, &[])).await;

        let urls: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::Result(r) => Some(r.url.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&shared));
        assert!(urls.contains(&"https://b.com/unique"));
    }

    #[tokio::test]
    async fn thumbnails_are_rewritten_to_proxy() {
        let scheduler = scheduler_with(vec![StubEngine::new(
            "alpha",
            vec![result("alpha", "https://a.com/1")],
        )]);
        let token = CancellationToken::new();
        let events = drain(scheduler.dispatch(&token, "q", 1, &[])).await;

        for event in &events {
            if let SearchEvent::Result(r) = event {
                assert!(r.thumbnail.starts_with("/api/v1/thumbnail?url="), "{}", r.thumbnail);
            }
        }
    }

    #[tokio::test]
    async fn failure_is_not_fatal() {
        let scheduler = scheduler_with(vec![
            StubEngine::new("alpha", vec![result("alpha", "https://a.com/1")]),
            StubEngine::failing("broken"),
        ]);
        let token = CancellationToken::new();
        let events = drain(scheduler.dispatch(&token, "q", 1, &[])).await;

        assert!(events.iter().any(|e| matches!(e, SearchEvent::Result(_))));
        assert!(events.iter().any(|e| matches!(
            e,
            SearchEvent::Failure { engine, reason } if engine == "broken" && reason == "other"
        )));
    }

    #[tokio::test]
    async fn open_circuit_skips_without_calling() {
        let mut registry = EngineRegistry::new();
        registry
            .register(Arc::new(StubEngine::failing("flaky")))
            .unwrap();
        let breakers = Arc::new(CircuitBreakerManager::new(BreakerConfig {
            failure_threshold: 1,
            success_threshold: 2,
            cooldown: Duration::from_secs(600),
        }));
        breakers.record_failure("flaky");

        let scheduler = SearchScheduler::new(Arc::new(registry), breakers);
        let token = CancellationToken::new();
        let selection = vec!["flaky".to_string()];
        let events = drain(scheduler.dispatch(&token, "q", 1, &selection)).await;

        assert!(events.iter().any(|e| matches!(
            e,
            SearchEvent::Failure { reason, .. } if reason == "skipped:circuit_open"
        )));
    }

    #[tokio::test]
    async fn disabled_engine_in_selection_is_reported() {
        let stub = StubEngine::new("off", vec![]);
        stub.engine.set_enabled(false);
        let scheduler = scheduler_with(vec![stub]);
        let token = CancellationToken::new();
        let selection = vec!["off".to_string()];
        let events = drain(scheduler.dispatch(&token, "q", 1, &selection)).await;

        assert!(events.iter().any(|e| matches!(
            e,
            SearchEvent::Failure { reason, .. } if reason == "skipped:disabled"
        )));
    }

    #[tokio::test]
    async fn unknown_engine_in_selection_is_reported() {
        let scheduler = scheduler_with(vec![]);
        let token = CancellationToken::new();
        let selection = vec!["nosuch".to_string()];
        let events = drain(scheduler.dispatch(&token, "q", 1, &selection)).await;

        assert!(events.iter().any(|e| matches!(
            e,
            SearchEvent::Failure { engine, reason } if engine == "nosuch" && reason == "unknown"
        )));
    }

    #[tokio::test]
    async fn cancellation_ends_stream_promptly() {
        let scheduler = scheduler_with(vec![
            StubEngine::new("slowpoke", vec![result("slowpoke", "https://s.com/1")])
                .slow(Duration::from_secs(30)),
        ]);
        let token = CancellationToken::new();
        let rx = scheduler.dispatch(&token, "q", 1, &[]);
        token.cancel();

        let events = tokio::time::timeout(Duration::from_secs(1), drain(rx))
            .await
            .expect("stream should end promptly after cancellation");
        // No results; the terminating Complete is still delivered.
        assert!(!events.iter().any(|e| matches!(e, SearchEvent::Result(_))));
    }

    #[tokio::test]
    async fn cancelled_engines_do_not_trip_breaker() {
        let scheduler = scheduler_with(vec![
            StubEngine::new("slowpoke", vec![]).slow(Duration::from_secs(30)),
        ]);
        let token = CancellationToken::new();
        let rx = scheduler.dispatch(&token, "q", 1, &[]);
        token.cancel();
        drain(rx).await;

        assert!(scheduler.breakers().is_allowed("slowpoke"));
        assert_eq!(
            scheduler.breakers().get("slowpoke").state(),
            engines_parser::CircuitState::Closed
        );
    }
}
