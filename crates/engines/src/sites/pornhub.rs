use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::client::TransportConfig;
use crate::engine::{Engine, SearchEngine};
use crate::error::EngineError;
use crate::model::{ApiType, Capabilities, PreviewSource, VideoResult};
use crate::parse::{
    THUMB_ATTRS, attr_first, find_preview, parse_duration_seconds, parse_rating_percent,
    parse_views_count, selector, text_of,
};

struct Selectors {
    container: Selector,
    item: Selector,
    link: Selector,
    img: Selector,
    duration: Selector,
    views: Selector,
    rating: Selector,
    uploader: Selector,
    premium: Selector,
    hd_badge: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    container: selector("ul#videoSearchResult"),
    item: selector("li.pcVideoListItem"),
    link: selector("span.title > a"),
    img: selector("img"),
    duration: selector("var.duration"),
    views: selector("span.views var"),
    rating: selector("div.rating-container div.value"),
    uploader: selector("div.usernameWrap a"),
    premium: selector("span.premiumIconTitleOnVideo"),
    hd_badge: selector("span.hd-thumbnail"),
});

static BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse(Pornhub::BASE_URL).expect("base url"));

pub struct Pornhub {
    engine: Engine,
}

impl Pornhub {
    pub const BASE_URL: &str = "https://www.pornhub.com";

    pub fn new(transport: &TransportConfig) -> Result<Self, EngineError> {
        let capabilities = Capabilities {
            has_preview: true,
            has_duration: true,
            has_views: true,
            has_rating: true,
            has_quality: true,
            preview_source: PreviewSource::DataAttribute,
            api_type: ApiType::Html,
            ..Default::default()
        };
        Ok(Self {
            engine: Engine::new("pornhub", "Pornhub", Self::BASE_URL, 1, capabilities, transport)?,
        })
    }
}

impl SearchEngine for Pornhub {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn bangs(&self) -> &'static [&'static str] {
        &["ph", "pornhub"]
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        let mut url = format!(
            "{}/video/search?search={}",
            Self::BASE_URL,
            urlencoding::encode(query)
        );
        if page > 1 {
            url.push_str(&format!("&page={page}"));
        }
        url
    }

    fn parse_page(&self, body: &str) -> Result<Vec<VideoResult>, EngineError> {
        let document = Html::parse_document(body);
        let s = &*SELECTORS;

        if document.select(&s.container).next().is_none() {
            return Err(EngineError::Parse(
                "search result listing not found".to_string(),
            ));
        }

        let mut results = Vec::new();
        for item in document.select(&s.item) {
            // Paywalled tiles carry the premium crown; skip them outright.
            if item.select(&s.premium).next().is_some() {
                continue;
            }

            let Some(link) = item.select(&s.link).next() else {
                continue;
            };
            let Some(url) = link
                .value()
                .attr("href")
                .and_then(|href| crate::parse::absolutize(&BASE, href))
            else {
                continue;
            };
            let title = text_of(link);
            if title.is_empty() {
                continue;
            }

            let mut result =
                VideoResult::new(self.engine.name, self.engine.display_name, url, title);

            if let Some(img) = item.select(&s.img).next()
                && let Some(thumb) = attr_first(img, THUMB_ATTRS)
                && let Some(abs) = crate::parse::absolutize(&BASE, thumb)
            {
                result.thumbnail = abs;
            }
            result.preview_url = find_preview(item);

            if let Some(el) = item.select(&s.duration).next() {
                result.duration = text_of(el);
                result.duration_seconds =
                    parse_duration_seconds(&result.duration).unwrap_or(0);
            }
            if let Some(el) = item.select(&s.views).next() {
                result.views = text_of(el);
                result.views_count = parse_views_count(&result.views).unwrap_or(0);
            }
            if let Some(el) = item.select(&s.rating).next() {
                result.rating = parse_rating_percent(&text_of(el));
            }
            if item.select(&s.hd_badge).next().is_some() {
                result.quality = Some("HD".to_string());
            }
            if let Some(el) = item.select(&s.uploader).next() {
                let name = text_of(el);
                if !name.is_empty() {
                    result.performer = Some(name);
                }
            }

            results.push(result);
        }

        Ok(results)
    }
}
