//! Bang-prefix query parsing.
//!
//! A query may start with any number of `!xx` tokens selecting specific
//! engines ("!ph !xv amateur"). Parsing consumes the leading bang run, maps
//! each known token through the registry, and rejoins the remainder as the
//! cleaned query.

use serde::Serialize;
use thiserror::Error;

/// Result of bang extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub original: String,
    /// Query text with the bang prefix removed, single-space joined.
    pub cleaned: String,
    /// Selected engine short names, input order preserved, deduped.
    pub engines: Vec<String>,
    pub had_bang: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Bang tokens consumed the entire query.
    #[error("query is empty after bang extraction")]
    EmptyQuery,
}

/// Autocomplete response class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutocompleteKind {
    /// Completions for a partial bang token.
    Bang,
    /// The user typed a lone `!`; all bangs are offered.
    BangStart,
    /// Plain-text completions from the popular-terms list.
    Popular,
    /// Nothing to offer.
    None,
}

/// Maximum suggestions returned for any autocomplete class.
pub const AUTOCOMPLETE_LIMIT: usize = 10;

/// Static suggestion pool for non-bang prefixes.
pub const POPULAR_TERMS: &[&str] = &[
    "amateur", "anal", "asian", "bbw", "big ass", "big tits", "blonde", "blowjob", "brunette",
    "casting", "compilation", "cosplay", "creampie", "cuckold", "ebony", "feet", "gangbang",
    "hardcore", "hentai", "interracial", "japanese", "latina", "lesbian", "massage", "mature",
    "milf", "orgasm", "pawg", "pov", "public", "redhead", "rough", "squirt", "stepmom",
    "swingers", "teen", "threesome", "vintage", "webcam", "yoga",
];

/// Extract leading bang tokens from `raw`.
///
/// `resolve` maps a lowercase bang token (without `!`) to an engine short
/// name; unknown tokens end the bang prefix and stay part of the cleaned
/// query, as do bang-shaped tokens appearing after the first non-bang word.
pub fn parse_bangs<F>(raw: &str, resolve: F) -> Result<ParsedQuery, QueryError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut engines: Vec<String> = Vec::new();
    let mut rest: Vec<&str> = Vec::new();
    let mut in_prefix = true;

    for token in raw.split_whitespace() {
        if in_prefix
            && let Some(bang) = token.strip_prefix('!')
            && !bang.is_empty()
            && let Some(engine) = resolve(&bang.to_ascii_lowercase())
        {
            if !engines.contains(&engine) {
                engines.push(engine);
            }
            continue;
        }
        in_prefix = false;
        rest.push(token);
    }

    let had_bang = !engines.is_empty();
    let cleaned = rest.join(" ");
    if cleaned.is_empty() && had_bang {
        return Err(QueryError::EmptyQuery);
    }

    Ok(ParsedQuery {
        original: raw.to_string(),
        cleaned,
        engines,
        had_bang,
    })
}

/// Complete a plain-text prefix from the popular-terms pool.
pub fn popular_completions(prefix: &str) -> Vec<String> {
    let needle = prefix.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    POPULAR_TERMS
        .iter()
        .filter(|term| term.starts_with(&needle))
        .take(AUTOCOMPLETE_LIMIT)
        .map(|term| term.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(token: &str) -> Option<String> {
        match token {
            "ph" => Some("pornhub".to_string()),
            "xv" => Some("xvideos".to_string()),
            "rt" => Some("redtube".to_string()),
            _ => None,
        }
    }

    #[test]
    fn no_bangs() {
        let parsed = parse_bangs("example query", resolve).unwrap();
        assert_eq!(parsed.cleaned, "example query");
        assert!(parsed.engines.is_empty());
        assert!(!parsed.had_bang);
    }

    #[test]
    fn single_bang() {
        let parsed = parse_bangs("!ph test", resolve).unwrap();
        assert_eq!(parsed.cleaned, "test");
        assert_eq!(parsed.engines, vec!["pornhub"]);
        assert!(parsed.had_bang);
    }

    #[test]
    fn multiple_bangs_preserve_order() {
        let parsed = parse_bangs("!ph !rt amateur", resolve).unwrap();
        assert_eq!(parsed.engines, vec!["pornhub", "redtube"]);
        assert_eq!(parsed.cleaned, "amateur");

        let swapped = parse_bangs("!rt !ph amateur", resolve).unwrap();
        assert_eq!(swapped.engines, vec!["redtube", "pornhub"]);
        assert_eq!(swapped.cleaned, parsed.cleaned);
    }

    #[test]
    fn duplicate_bangs_dedupe() {
        let parsed = parse_bangs("!ph !PH test", resolve).unwrap();
        assert_eq!(parsed.engines, vec!["pornhub"]);
    }

    #[test]
    fn bang_case_insensitive() {
        let parsed = parse_bangs("!XV clip", resolve).unwrap();
        assert_eq!(parsed.engines, vec!["xvideos"]);
    }

    #[test]
    fn unknown_bang_ends_prefix() {
        let parsed = parse_bangs("!zz query", resolve).unwrap();
        assert!(!parsed.had_bang);
        assert_eq!(parsed.cleaned, "!zz query");
    }

    #[test]
    fn bang_after_text_is_literal() {
        let parsed = parse_bangs("query !ph", resolve).unwrap();
        assert!(!parsed.had_bang);
        assert_eq!(parsed.cleaned, "query !ph");
    }

    #[test]
    fn bangs_only_is_an_error() {
        assert_eq!(parse_bangs("!ph", resolve), Err(QueryError::EmptyQuery));
        assert_eq!(parse_bangs("!ph !xv", resolve), Err(QueryError::EmptyQuery));
    }

    #[test]
    fn whitespace_is_normalized() {
        let parsed = parse_bangs("  !ph   big   tits  ", resolve).unwrap();
        assert_eq!(parsed.cleaned, "big tits");
    }

    #[test]
    fn popular_prefix() {
        let suggestions = popular_completions("te");
        assert!(suggestions.contains(&"teen".to_string()));
        assert!(suggestions.len() <= AUTOCOMPLETE_LIMIT);
        assert!(popular_completions("").is_empty());
        assert!(popular_completions("zzz").is_empty());
    }
}
