use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single normalized search result from an upstream site.
///
/// Every field beyond `id`, `url`, `title` and `source` is best-effort: sites
/// differ wildly in what their result tiles expose, and parsers leave absent
/// fields at their zero value rather than failing the item.
///
/// # Invariants
///
/// * `id` is deterministic for a given `(source, url)` pair.
/// * `url` is an absolute `http(s)` URL on the source site.
/// * `duration_seconds` and `views_count` are never negative (unsigned).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VideoResult {
    /// Stable identifier: `sha256(url || source)` truncated to 16 hex chars.
    pub id: String,
    pub url: String,
    pub title: String,
    /// Rewritten to the local thumbnail proxy before delivery.
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Display form, e.g. "12:34".
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub duration_seconds: u32,
    /// Display form, e.g. "1.2M views".
    #[serde(default)]
    pub views: String,
    #[serde(default)]
    pub views_count: u64,
    /// Percentage 0-100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Free text like "HD" or "4K".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    /// Engine short name.
    pub source: String,
    /// Engine human-readable name.
    pub source_display: String,
}

impl VideoResult {
    /// Create a result with the mandatory fields; everything else defaults.
    pub fn new(
        source: impl Into<String>,
        source_display: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let url = url.into();
        Self {
            id: result_id(&source, &url),
            url,
            title: title.into(),
            thumbnail: String::new(),
            preview_url: None,
            download_url: None,
            duration: String::new(),
            duration_seconds: 0,
            views: String::new(),
            views_count: 0,
            rating: None,
            quality: None,
            published: None,
            description: None,
            tags: Vec::new(),
            performer: None,
            source,
            source_display: source_display.into(),
        }
    }
}

/// Derive the stable result id for `(source, url)`.
pub fn result_id(source: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(source.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// Where an engine's hover previews come from, when it has them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreviewSource {
    #[default]
    None,
    DataAttribute,
    Api,
}

/// What a site's result tiles can carry. Used by the registry snapshot and by
/// callers deciding which engines can satisfy a filtered query.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct Capabilities {
    pub has_preview: bool,
    pub has_download: bool,
    pub has_duration: bool,
    pub has_views: bool,
    pub has_rating: bool,
    pub has_quality: bool,
    pub has_upload_date: bool,
    pub preview_source: PreviewSource,
    /// "html" for selector-scraped sites, "json" for real APIs.
    pub api_type: ApiType,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApiType {
    #[default]
    Html,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_id_is_deterministic() {
        let a = result_id("pornhub", "https://www.pornhub.com/view_video.php?viewkey=abc");
        let b = result_id("pornhub", "https://www.pornhub.com/view_video.php?viewkey=abc");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn result_id_differs_per_source() {
        let url = "https://example.com/v/1";
        assert_ne!(result_id("pornhub", url), result_id("redtube", url));
    }

    #[test]
    fn new_result_fills_id() {
        let r = VideoResult::new("xvideos", "XVideos", "https://www.xvideos.com/video1", "t");
        assert_eq!(r.id, result_id("xvideos", "https://www.xvideos.com/video1"));
        assert_eq!(r.duration_seconds, 0);
        assert!(r.tags.is_empty());
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let r = VideoResult::new("xvideos", "XVideos", "https://x/v", "t");
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("preview_url"));
        assert!(!json.contains("rating"));
        assert!(!json.contains("tags"));
    }
}
