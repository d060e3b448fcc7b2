//! Short-lived search cache with single-flight semantics.
//!
//! Keys are request fingerprints; values are completed batched responses.
//! Expiry and capacity eviction are delegated to moka (TTL first, then LRU);
//! `get_or_compute` collapses concurrent identical misses into one fan-out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use sha2::{Digest, Sha256};

use super::SearchResponse;
use crate::error::Error;

/// Fingerprint of `(cleaned_query, page, engine_selection)`. The selection
/// is sorted so bang order does not fragment the cache.
pub fn fingerprint(cleaned_query: &str, page: u32, selection: &[String]) -> String {
    let mut sorted: Vec<&str> = selection.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(cleaned_query.as_bytes());
    hasher.update([0]);
    hasher.update(page.to_le_bytes());
    hasher.update([0]);
    hasher.update(sorted.join(",").as_bytes());
    hex::encode(hasher.finalize())
}

pub struct SearchCache {
    inner: Cache<String, Arc<SearchResponse>>,
}

impl SearchCache {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(capacity)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<SearchResponse>> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, response: Arc<SearchResponse>) {
        self.inner.insert(key, response).await;
    }

    /// Return the cached value or run `compute`, guaranteeing at most one
    /// concurrent compute per key; other callers wait on the in-flight
    /// result.
    pub async fn get_or_compute<F>(
        &self,
        key: String,
        compute: F,
    ) -> Result<Arc<SearchResponse>, Error>
    where
        F: Future<Output = Result<Arc<SearchResponse>, Error>>,
    {
        self.inner
            .try_get_with(key, compute)
            .await
            .map_err(|e: Arc<Error>| Error::Other(e.to_string()))
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
