//! URL canonicalization, cross-engine deduplication, and the thumbnail
//! rewrite applied to every outgoing result.

use std::collections::HashSet;

use url::Url;

/// Query parameters stripped during canonicalization. `utm_` is matched as a
/// prefix; the rest are exact names.
const TRACKING_PARAMS: &[&str] = &["ref", "source", "fbclid", "gclid"];

/// Path of the local proxy endpoint results are rewritten to.
pub const THUMBNAIL_PROXY_PATH: &str = "/api/v1/thumbnail?url=";

/// Canonical form of a result URL, used as the dedup key.
///
/// Scheme and host are lowercased (the `url` crate normalizes both on
/// parse), tracking parameters are stripped, the fragment is dropped, and
/// the path is kept verbatim.
pub fn canonical_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| {
            !name.starts_with("utm_") && !TRACKING_PARAMS.contains(&name.as_ref())
        })
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(name, value)| {
                if value.is_empty() {
                    urlencoding::encode(name).into_owned()
                } else {
                    format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }
    url.set_fragment(None);

    Some(url.to_string())
}

/// Rewrite an upstream thumbnail URL to the local proxy so clients never
/// contact third-party hosts directly.
pub fn proxy_thumbnail(original: &str) -> String {
    format!("{}{}", THUMBNAIL_PROXY_PATH, urlencoding::encode(original))
}

/// Tracks canonical URLs seen within one query; first emitting engine wins.
#[derive(Default)]
pub struct Deduper {
    seen: HashSet<String>,
}

impl Deduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a canonical URL is seen. URLs that fail
    /// to canonicalize are keyed on their raw form rather than dropped.
    pub fn first_seen(&mut self, url: &str) -> bool {
        let key = canonical_url(url).unwrap_or_else(|| url.to_string());
        self.seen.insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
