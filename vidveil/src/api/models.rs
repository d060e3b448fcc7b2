//! API response models not owned by the search domain.

use std::collections::BTreeMap;

use engines_parser::AutocompleteKind;
use serde::Serialize;

/// `GET /api/v1/autocomplete` response.
#[derive(Debug, Serialize)]
pub struct AutocompleteResponse {
    pub ok: bool,
    #[serde(rename = "type")]
    pub kind: AutocompleteKind,
    pub suggestions: Vec<String>,
}

/// `GET /api/v1/bangs` response entry.
#[derive(Debug, Serialize)]
pub struct BangEntry {
    pub bang: String,
    pub engine: String,
}

/// `GET /healthz` response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Seconds since process start.
    pub uptime: u64,
    pub checks: BTreeMap<String, serde_json::Value>,
}
