//! Per-engine circuit breaker.
//!
//! Protects query latency against consistently failing upstreams: after
//! `failure_threshold` consecutive failures the breaker opens and the engine
//! is skipped outright until the cooldown elapses, after which a probe
//! request decides whether to close it again.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation.
    Closed,
    /// Rejecting requests after repeated failures.
    Open,
    /// Cooldown elapsed; allowing probe requests.
    HalfOpen,
}

/// Breaker tuning knobs.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// Consecutive half-open successes before the circuit closes.
    pub success_threshold: u32,
    /// Cooldown before an open circuit allows a probe.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            cooldown: Duration::from_secs(30),
        }
    }
}

/// A single engine's breaker. Lives for the process lifetime.
pub struct CircuitBreaker {
    state: RwLock<CircuitState>,
    failure_count: AtomicU32,
    half_open_successes: AtomicU32,
    opened_at: RwLock<Option<Instant>>,
    config: BreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicU32::new(0),
            half_open_successes: AtomicU32::new(0),
            opened_at: RwLock::new(None),
            config,
        }
    }

    /// Current state, applying the open → half-open transition when the
    /// cooldown has elapsed.
    pub fn state(&self) -> CircuitState {
        self.check_cooldown();
        *self.state.read()
    }

    /// Whether a request may be issued right now.
    pub fn is_allowed(&self) -> bool {
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        }
    }

    pub fn record_success(&self) {
        let state = *self.state.read();
        match state {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::SeqCst);
            }
            CircuitState::HalfOpen => {
                let successes = self.half_open_successes.fetch_add(1, Ordering::SeqCst) + 1;
                if successes >= self.config.success_threshold {
                    *self.state.write() = CircuitState::Closed;
                    self.failure_count.store(0, Ordering::SeqCst);
                    self.half_open_successes.store(0, Ordering::SeqCst);
                    *self.opened_at.write() = None;
                    info!("Circuit breaker closed after successful recovery");
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let state = *self.state.read();
        match state {
            CircuitState::Closed => {
                let failures = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
                if failures >= self.config.failure_threshold {
                    *self.state.write() = CircuitState::Open;
                    *self.opened_at.write() = Some(Instant::now());
                    warn!(failures, "Circuit breaker opened");
                }
            }
            CircuitState::HalfOpen => {
                // A failed probe reopens the circuit immediately.
                *self.state.write() = CircuitState::Open;
                *self.opened_at.write() = Some(Instant::now());
                self.half_open_successes.store(0, Ordering::SeqCst);
                warn!("Circuit breaker reopened after failed probe");
            }
            CircuitState::Open => {}
        }
    }

    fn check_cooldown(&self) {
        let state = *self.state.read();
        if state == CircuitState::Open
            && let Some(opened_at) = *self.opened_at.read()
            && opened_at.elapsed() >= self.config.cooldown
        {
            *self.state.write() = CircuitState::HalfOpen;
            self.half_open_successes.store(0, Ordering::SeqCst);
            debug!("Circuit breaker transitioned to half-open");
        }
    }
}

/// Breaker table, one entry per engine short name. Engines are registered at
/// process start; entries are created lazily on first use and never removed.
pub struct CircuitBreakerManager {
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
    config: BreakerConfig,
}

impl CircuitBreakerManager {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            breakers: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get or create the breaker for an engine.
    pub fn get(&self, engine: &str) -> Arc<CircuitBreaker> {
        {
            let breakers = self.breakers.read();
            if let Some(breaker) = breakers.get(engine) {
                return breaker.clone();
            }
        }

        let mut breakers = self.breakers.write();
        breakers
            .entry(engine.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.config.clone())))
            .clone()
    }

    pub fn is_allowed(&self, engine: &str) -> bool {
        self.get(engine).is_allowed()
    }

    pub fn record_success(&self, engine: &str) {
        self.get(engine).record_success();
    }

    pub fn record_failure(&self, engine: &str) {
        self.get(engine).record_failure();
    }

    /// Engines whose circuit is currently open. Reported by the health check.
    pub fn open_circuits(&self) -> Vec<String> {
        let snapshot: Vec<(String, Arc<CircuitBreaker>)> = {
            let breakers = self.breakers.read();
            breakers
                .iter()
                .map(|(name, breaker)| (name.clone(), breaker.clone()))
                .collect()
        };
        snapshot
            .into_iter()
            .filter(|(_, breaker)| breaker.state() == CircuitState::Open)
            .map(|(name, _)| name)
            .collect()
    }
}

impl Default for CircuitBreakerManager {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failures: u32, cooldown_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(BreakerConfig {
            failure_threshold: failures,
            success_threshold: 2,
            cooldown: Duration::from_millis(cooldown_ms),
        })
    }

    #[test]
    fn starts_closed() {
        let b = breaker(3, 1000);
        assert_eq!(b.state(), CircuitState::Closed);
        assert!(b.is_allowed());
    }

    #[test]
    fn opens_after_threshold_failures() {
        let b = breaker(3, 1000);
        b.record_failure();
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Closed);
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);
        assert!(!b.is_allowed());
    }

    #[test]
    fn success_resets_failure_count() {
        let b = breaker(3, 1000);
        b.record_failure();
        b.record_failure();
        b.record_success();
        b.record_failure();
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_after_cooldown_then_closes_on_successes() {
        let b = breaker(1, 0);
        b.record_failure();
        // Zero cooldown: next observation flips straight to half-open.
        assert_eq!(b.state(), CircuitState::HalfOpen);
        b.record_success();
        assert_eq!(b.state(), CircuitState::HalfOpen);
        b.record_success();
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let b = breaker(1, 0);
        b.record_failure();
        assert_eq!(b.state(), CircuitState::HalfOpen);
        b.record_failure();
        // Re-opened; the zero cooldown flips it back to half-open on read,
        // so inspect the raw state first.
        assert_eq!(*b.state.read(), CircuitState::Open);
    }

    #[test]
    fn manager_isolates_engines() {
        let manager = CircuitBreakerManager::new(BreakerConfig {
            failure_threshold: 2,
            success_threshold: 2,
            cooldown: Duration::from_secs(60),
        });
        manager.record_failure("pornhub");
        manager.record_failure("pornhub");
        assert!(!manager.is_allowed("pornhub"));
        assert!(manager.is_allowed("xvideos"));
        assert_eq!(manager.open_circuits(), vec!["pornhub".to_string()]);
    }
}
