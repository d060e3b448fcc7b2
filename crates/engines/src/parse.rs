//! Shared field extraction for CSS-selector-driven site parsers.
//!
//! Every HTML engine declares an item selector plus per-field selectors and
//! calls into these helpers for the fiddly parts: making URLs absolute,
//! decoding duration and view-count display strings, and finding hover
//! previews across the zoo of `data-*` attribute names sites use.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

/// Attribute names known to carry a hover-preview clip URL, in probe order.
pub const PREVIEW_ATTRS: &[&str] = &[
    "data-mediabook",
    "data-preview",
    "data-video-preview",
    "data-rollover",
    "data-preview-url",
    "data-gif",
    "data-webm",
    "data-mp4",
    "data-thumb-url",
    "data-trailer",
    "data-teaser",
];

/// Attribute names probed for a thumbnail image URL, in order. Sites that
/// lazy-load put the real URL in a `data-*` attribute and a placeholder in
/// `src`.
pub const THUMB_ATTRS: &[&str] = &["data-src", "data-original", "data-thumb", "src"];

static DURATION_COLON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:(\d+):)?(\d{1,2}):(\d{2})").expect("duration regex"));
static DURATION_MIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*min").expect("minutes regex"));
static VIEWS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.,]+)\s*([KMBkmb])?").expect("views regex"));
static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})\s*%").expect("rating regex"));

/// Parse a CSS selector that is a compile-time constant.
///
/// Only ever called with literal selector strings; an invalid one is a
/// programming error, so this panics the same way the `LazyLock<Regex>`
/// statics do.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid CSS selector constant")
}

/// Collapse an element's text to single-space-separated form.
pub fn text_of(element: ElementRef<'_>) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non-empty value among `attrs` on `element`.
pub fn attr_first<'a>(element: ElementRef<'a>, attrs: &[&str]) -> Option<&'a str> {
    attrs
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|v| !v.is_empty())
}

/// Probe an item container and its descendants for a hover-preview URL.
pub fn find_preview(item: ElementRef<'_>) -> Option<String> {
    if let Some(v) = attr_first(item, PREVIEW_ATTRS) {
        return Some(v.to_string());
    }
    item.descendants()
        .filter_map(ElementRef::wrap)
        .find_map(|el| attr_first(el, PREVIEW_ATTRS).map(str::to_string))
}

/// Resolve `href` against `base`, returning an absolute `http(s)` URL.
/// Protocol-relative (`//cdn...`) and path-relative forms are both handled.
pub fn absolutize(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let joined = base.join(href).ok()?;
    match joined.scheme() {
        "http" | "https" => Some(joined.to_string()),
        _ => None,
    }
}

/// Decode a duration display string to seconds.
///
/// Accepts `MM:SS`, `H:MM:SS` and `N min` forms; anything else yields `None`.
pub fn parse_duration_seconds(text: &str) -> Option<u32> {
    if let Some(caps) = DURATION_COLON_RE.captures(text) {
        let hours: u32 = caps
            .get(1)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(0);
        let minutes: u32 = caps.get(2)?.as_str().parse().ok()?;
        let seconds: u32 = caps.get(3)?.as_str().parse().ok()?;
        return Some(hours * 3600 + minutes * 60 + seconds);
    }
    if let Some(caps) = DURATION_MIN_RE.captures(text) {
        let minutes: u32 = caps.get(1)?.as_str().parse().ok()?;
        return Some(minutes * 60);
    }
    None
}

/// Decode a view-count display string, with K/M/B suffix support.
/// `"1.2M"` → 1_200_000, `"345K"` → 345_000, `"12,345"` → 12_345.
pub fn parse_views_count(text: &str) -> Option<u64> {
    let caps = VIEWS_RE.captures(text)?;
    let number: f64 = caps
        .get(1)?
        .as_str()
        .replace(',', "")
        .parse()
        .ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(ref s) if s == "K" => 1_000.0,
        Some(ref s) if s == "M" => 1_000_000.0,
        Some(ref s) if s == "B" => 1_000_000_000.0,
        _ => 1.0,
    };
    // Round: "4.1M" must come out as exactly 4_100_000.
    Some((number * multiplier).round() as u64)
}

/// Extract a percentage rating, clamped to 0-100.
pub fn parse_rating_percent(text: &str) -> Option<u8> {
    let caps = RATING_RE.captures(text)?;
    let value: u32 = caps.get(1)?.as_str().parse().ok()?;
    Some(value.min(100) as u8)
}

/// Spot a quality badge ("HD", "4K", "1080p"...) in tile text.
pub fn parse_quality(text: &str) -> Option<String> {
    let upper = text.to_ascii_uppercase();
    for badge in ["4K", "2160P", "1440P", "1080P", "720P", "HD"] {
        if upper.split_whitespace().any(|w| w == badge) {
            return Some(badge.to_string());
        }
    }
    None
}
