//! vidveil: privacy-preserving meta-search aggregator for adult video
//! sites.
//!
//! A query fans out to every selected upstream engine in parallel; results
//! stream back to the caller as they arrive, normalized, deduplicated, and
//! with thumbnails rewritten through the local proxy. Nothing is persisted:
//! the only state is a short-lived in-memory response cache and the
//! per-engine circuit breakers.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod search;

pub use config::AppConfig;
pub use error::{Error, Result};
