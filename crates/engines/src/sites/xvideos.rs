use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::client::TransportConfig;
use crate::engine::{Engine, SearchEngine};
use crate::error::EngineError;
use crate::model::{ApiType, Capabilities, PreviewSource, VideoResult};
use crate::parse::{
    THUMB_ATTRS, absolutize, attr_first, find_preview, parse_duration_seconds, parse_views_count,
    selector, text_of,
};

struct Selectors {
    container: Selector,
    item: Selector,
    title_link: Selector,
    img: Selector,
    duration: Selector,
    metadata: Selector,
    quality: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    container: selector("div.mozaique"),
    item: selector("div.thumb-block"),
    title_link: selector("p.title a"),
    img: selector("div.thumb img"),
    duration: selector("span.duration"),
    metadata: selector("p.metadata"),
    quality: selector("span.video-hd-mark"),
});

static BASE: LazyLock<Url> = LazyLock::new(|| Url::parse(XVideos::BASE_URL).expect("base url"));

pub struct XVideos {
    engine: Engine,
}

impl XVideos {
    pub const BASE_URL: &str = "https://www.xvideos.com";

    pub fn new(transport: &TransportConfig) -> Result<Self, EngineError> {
        let capabilities = Capabilities {
            has_preview: true,
            has_duration: true,
            has_views: true,
            has_quality: true,
            preview_source: PreviewSource::DataAttribute,
            api_type: ApiType::Html,
            ..Default::default()
        };
        Ok(Self {
            engine: Engine::new("xvideos", "XVideos", Self::BASE_URL, 1, capabilities, transport)?,
        })
    }
}

impl SearchEngine for XVideos {
    fn engine(&self) -> &Engine {
        &self.engine
    }

    fn bangs(&self) -> &'static [&'static str] {
        &["xv", "xvideos"]
    }

    // xvideos pages are zero-based.
    fn search_url(&self, query: &str, page: u32) -> String {
        let mut url = format!("{}/?k={}", Self::BASE_URL, urlencoding::encode(query));
        if page > 1 {
            url.push_str(&format!("&p={}", page - 1));
        }
        url
    }

    fn parse_page(&self, body: &str) -> Result<Vec<VideoResult>, EngineError> {
        let document = Html::parse_document(body);
        let s = &*SELECTORS;

        if document.select(&s.container).next().is_none() {
            return Err(EngineError::Parse("result mosaic not found".to_string()));
        }

        let mut results = Vec::new();
        for item in document.select(&s.item) {
            let Some(link) = item.select(&s.title_link).next() else {
                continue;
            };
            let Some(url) = link
                .value()
                .attr("href")
                .and_then(|href| absolutize(&BASE, href))
            else {
                continue;
            };
            let title = link
                .value()
                .attr("title")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| text_of(link));
            if title.is_empty() {
                continue;
            }

            let mut result =
                VideoResult::new(self.engine.name, self.engine.display_name, url, title);

            if let Some(img) = item.select(&s.img).next()
                && let Some(thumb) = attr_first(img, THUMB_ATTRS)
                && let Some(abs) = absolutize(&BASE, thumb)
            {
                result.thumbnail = abs;
            }
            result.preview_url = find_preview(item);

            if let Some(el) = item.select(&s.duration).next() {
                result.duration = text_of(el);
                result.duration_seconds = parse_duration_seconds(&result.duration).unwrap_or(0);
            }
            // Metadata line reads like "1.4M Views - 720p".
            if let Some(el) = item.select(&s.metadata).next() {
                let meta = text_of(el);
                if let Some(views_part) = meta.split('-').next() {
                    let views_part = views_part.trim();
                    if views_part.to_ascii_lowercase().contains("view") {
                        result.views = views_part.to_string();
                        result.views_count = parse_views_count(views_part).unwrap_or(0);
                    }
                }
                if result.quality.is_none() {
                    result.quality = crate::parse::parse_quality(&meta);
                }
            }
            if item.select(&s.quality).next().is_some() {
                result.quality = Some("HD".to_string());
            }

            results.push(result);
        }

        Ok(results)
    }
}
