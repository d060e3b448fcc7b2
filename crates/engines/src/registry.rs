//! The engine registry and bang index.
//!
//! Built once at process start from the static site set; read-only
//! afterwards apart from each engine's `enabled` flag. The registry owns
//! every engine; queries borrow them for the duration of a fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::client::TransportConfig;
use crate::engine::SearchEngine;
use crate::error::EngineError;
use crate::model::Capabilities;
use crate::query::{
    AUTOCOMPLETE_LIMIT, AutocompleteKind, ParsedQuery, QueryError, parse_bangs,
    popular_completions,
};
use crate::sites::{
    Eporner, Motherless, Pornhub, Redtube, SpankBang, Tube8, XHamster, XVideos, Xnxx, YouPorn,
};

/// Serializable view of one registered engine.
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: String,
    pub display_name: String,
    pub base_url: String,
    pub tier: u8,
    pub enabled: bool,
    pub capabilities: Capabilities,
    pub bangs: Vec<String>,
}

pub struct EngineRegistry {
    engines: Vec<Arc<dyn SearchEngine>>,
    by_name: HashMap<&'static str, usize>,
    /// bang token (lowercase, no `!`) → engine short name.
    bangs: HashMap<&'static str, &'static str>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            engines: Vec::new(),
            by_name: HashMap::new(),
            bangs: HashMap::new(),
        }
    }

    /// Register an engine and its bang tokens. Duplicate engine names and
    /// bang conflicts are construction errors.
    pub fn register(&mut self, engine: Arc<dyn SearchEngine>) -> Result<(), EngineError> {
        let name = engine.engine().name;
        if self.by_name.contains_key(name) {
            return Err(EngineError::Other(format!(
                "duplicate engine name: {name}"
            )));
        }
        for bang in engine.bangs() {
            if let Some(existing) = self.bangs.get(bang) {
                return Err(EngineError::Other(format!(
                    "bang !{bang} already maps to {existing}"
                )));
            }
        }

        let index = self.engines.len();
        for bang in engine.bangs() {
            self.bangs.insert(bang, name);
        }
        self.by_name.insert(name, index);
        self.engines.push(engine);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SearchEngine>> {
        self.by_name.get(name).map(|&i| &self.engines[i])
    }

    pub fn engines(&self) -> &[Arc<dyn SearchEngine>] {
        &self.engines
    }

    /// All engines currently enabled, registration order.
    pub fn enabled(&self) -> Vec<Arc<dyn SearchEngine>> {
        self.engines
            .iter()
            .filter(|e| e.engine().is_enabled())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn resolve_bang(&self, token: &str) -> Option<String> {
        self.bangs.get(token).map(|name| name.to_string())
    }

    /// Sorted `(bang, engine)` pairs.
    pub fn bang_table(&self) -> Vec<(String, String)> {
        let mut table: Vec<(String, String)> = self
            .bangs
            .iter()
            .map(|(bang, engine)| (bang.to_string(), engine.to_string()))
            .collect();
        table.sort();
        table
    }

    /// Parse the bang prefix of a raw query against this registry.
    pub fn parse_query(&self, raw: &str) -> Result<ParsedQuery, QueryError> {
        parse_bangs(raw, |token| self.resolve_bang(token))
    }

    /// Suggestions for an in-progress query.
    ///
    /// The current token is the last whitespace-separated word; a `!` prefix
    /// switches to bang completion, anything else completes against the
    /// popular-terms list over the whole typed text.
    pub fn autocomplete(&self, input: &str) -> (AutocompleteKind, Vec<String>) {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return (AutocompleteKind::None, Vec::new());
        }

        let current = trimmed.split_whitespace().last().unwrap_or(trimmed);
        if let Some(prefix) = current.strip_prefix('!') {
            let prefix = prefix.to_ascii_lowercase();
            let mut matches: Vec<String> = self
                .bangs
                .keys()
                .filter(|bang| bang.starts_with(&prefix))
                .map(|bang| format!("!{bang}"))
                .collect();
            matches.sort();
            matches.truncate(AUTOCOMPLETE_LIMIT);
            let kind = if prefix.is_empty() {
                AutocompleteKind::BangStart
            } else {
                AutocompleteKind::Bang
            };
            return (kind, matches);
        }

        let suggestions = popular_completions(trimmed);
        if suggestions.is_empty() {
            (AutocompleteKind::None, Vec::new())
        } else {
            (AutocompleteKind::Popular, suggestions)
        }
    }

    pub fn info(&self, name: &str) -> Option<EngineInfo> {
        self.get(name).map(|engine| Self::engine_info(engine))
    }

    pub fn snapshot(&self) -> Vec<EngineInfo> {
        self.engines.iter().map(Self::engine_info).collect()
    }

    fn engine_info(engine: &Arc<dyn SearchEngine>) -> EngineInfo {
        let base = engine.engine();
        EngineInfo {
            name: base.name.to_string(),
            display_name: base.display_name.to_string(),
            base_url: base.base_url.to_string(),
            tier: base.tier,
            enabled: base.is_enabled(),
            capabilities: base.capabilities,
            bangs: engine.bangs().iter().map(|b| b.to_string()).collect(),
        }
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the full registry with every supported site.
pub fn default_registry(transport: &TransportConfig) -> Result<EngineRegistry, EngineError> {
    let mut registry = EngineRegistry::new();

    registry.register(Arc::new(Pornhub::new(transport)?))?;
    registry.register(Arc::new(XVideos::new(transport)?))?;
    registry.register(Arc::new(Xnxx::new(transport)?))?;
    registry.register(Arc::new(Redtube::new(transport)?))?;
    registry.register(Arc::new(XHamster::new(transport)?))?;
    registry.register(Arc::new(YouPorn::new(transport)?))?;
    registry.register(Arc::new(SpankBang::new(transport)?))?;
    registry.register(Arc::new(Tube8::new(transport)?))?;
    registry.register(Arc::new(Eporner::new(transport)?))?;
    registry.register(Arc::new(Motherless::new(transport)?))?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::AutocompleteKind;

    fn registry() -> EngineRegistry {
        default_registry(&TransportConfig::default()).expect("registry")
    }

    #[test]
    fn builds_with_unique_names_and_bangs() {
        let registry = registry();
        assert_eq!(registry.len(), 10);
        assert!(registry.get("pornhub").is_some());
        assert!(registry.get("nosuch").is_none());
    }

    #[test]
    fn bangs_resolve() {
        let registry = registry();
        assert_eq!(registry.resolve_bang("ph").as_deref(), Some("pornhub"));
        assert_eq!(registry.resolve_bang("xv").as_deref(), Some("xvideos"));
        assert_eq!(registry.resolve_bang("zz"), None);
    }

    #[test]
    fn parse_query_maps_bangs() {
        let registry = registry();
        let parsed = registry.parse_query("!ph !rt amateur").unwrap();
        assert_eq!(parsed.engines, vec!["pornhub", "redtube"]);
        assert_eq!(parsed.cleaned, "amateur");
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = registry();
        let result = registry.register(Arc::new(
            Pornhub::new(&TransportConfig::default()).unwrap(),
        ));
        assert!(result.is_err());
    }

    #[test]
    fn autocomplete_classes() {
        let registry = registry();

        let (kind, suggestions) = registry.autocomplete("!");
        assert_eq!(kind, AutocompleteKind::BangStart);
        assert!(suggestions.len() <= AUTOCOMPLETE_LIMIT);
        assert!(!suggestions.is_empty());

        let (kind, suggestions) = registry.autocomplete("!p");
        assert_eq!(kind, AutocompleteKind::Bang);
        assert!(suggestions.contains(&"!ph".to_string()));

        let (kind, suggestions) = registry.autocomplete("te");
        assert_eq!(kind, AutocompleteKind::Popular);
        assert!(suggestions.contains(&"teen".to_string()));

        let (kind, _) = registry.autocomplete("");
        assert_eq!(kind, AutocompleteKind::None);
    }

    #[test]
    fn snapshot_reflects_enabled_flag() {
        let registry = registry();
        registry.get("tube8").unwrap().engine().set_enabled(false);
        let info = registry.info("tube8").unwrap();
        assert!(!info.enabled);
        assert_eq!(registry.enabled().len(), 9);
    }

    #[test]
    fn tiers_are_in_range() {
        for info in registry().snapshot() {
            assert!((1..=6).contains(&info.tier), "{}: {}", info.name, info.tier);
        }
    }
}
